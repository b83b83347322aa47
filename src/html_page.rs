use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::path::Path;
use std::sync::LazyLock;

use crate::element_finder::{ElementSet, PageHandle};
use crate::{AppError, Result};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A saved page, queried with the same selectors as the live browser.
///
/// `scraper::Html` is not `Send`, so the document is parsed per query and
/// only the extracted text leaves the parser.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    source: String,
}

/// Snapshot of the texts one selector matched in an `HtmlPage`.
#[derive(Debug, Clone)]
pub struct HtmlElements {
    selector: String,
    texts: Vec<String>,
}

impl HtmlPage {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    fn select_texts(&self, selector: &str) -> Result<Vec<String>> {
        let css_selector = Selector::parse(selector).map_err(|e| AppError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })?;

        let document = Html::parse_document(&self.source);
        Ok(document
            .select(&css_selector)
            .map(|element| visible_text(&element.text().collect::<String>()))
            .collect())
    }
}

/// Collapses whitespace runs the way rendered text does.
fn visible_text(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}

#[async_trait]
impl PageHandle for HtmlPage {
    type Elements = HtmlElements;

    async fn query(&self, selector: &str) -> Result<HtmlElements> {
        let texts = self.select_texts(selector)?;
        Ok(HtmlElements {
            selector: selector.to_string(),
            texts,
        })
    }
}

#[async_trait]
impl ElementSet for HtmlElements {
    fn selector(&self) -> &str {
        &self.selector
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.texts.len())
    }

    async fn text_at(&self, index: usize) -> Result<String> {
        self.texts.get(index).cloned().ok_or_else(|| AppError::Read {
            selector: self.selector.clone(),
            index,
            message: format!("only {} elements matched", self.texts.len()),
        })
    }
}
