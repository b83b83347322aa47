// Shared fakes for the integration tests. Nothing here needs a browser.

pub mod journey_tests;
pub mod resolver_tests;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use meli_journey::browser::Locator;
use meli_journey::html_page::HtmlPage;
use meli_journey::journey::Driver;
use meli_journey::{AppError, ElementSet, PageHandle, Result};

/// One element as the fake page renders it.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(&'static str),
    /// Text that arrives after a delay, to shuffle completion order.
    Slow(&'static str, u64),
    /// Reading this element fails.
    Broken,
}

/// In-memory page mapping selectors to elements, recording every query.
#[derive(Default, Clone)]
pub struct FakePage {
    elements: HashMap<String, Vec<Cell>>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, cells: Vec<Cell>) -> Self {
        self.elements.insert(selector.to_string(), cells);
        self
    }

    pub fn with_texts(self, selector: &str, texts: &[&'static str]) -> Self {
        self.with(selector, texts.iter().map(|t| Cell::Text(*t)).collect())
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

pub struct FakeElements {
    selector: String,
    cells: Vec<Cell>,
}

#[async_trait]
impl PageHandle for FakePage {
    type Elements = FakeElements;

    async fn query(&self, selector: &str) -> Result<FakeElements> {
        self.queried.lock().unwrap().push(selector.to_string());
        Ok(FakeElements {
            selector: selector.to_string(),
            cells: self.elements.get(selector).cloned().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ElementSet for FakeElements {
    fn selector(&self) -> &str {
        &self.selector
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.cells.len())
    }

    async fn text_at(&self, index: usize) -> Result<String> {
        let read_error = || AppError::Read {
            selector: self.selector.clone(),
            index,
            message: "element detached".to_string(),
        };
        match self.cells.get(index) {
            Some(Cell::Text(text)) => Ok(text.to_string()),
            Some(Cell::Slow(text, millis)) => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
                Ok(text.to_string())
            }
            Some(Cell::Broken) | None => Err(read_error()),
        }
    }
}

/// Driver that records every action and serves a fixed HTML page.
#[derive(Clone)]
pub struct RecordingDriver {
    page: HtmlPage,
    actions: Arc<Mutex<Vec<String>>>,
    missing: HashSet<String>,
}

impl RecordingDriver {
    pub fn new(html: &str) -> Self {
        Self {
            page: HtmlPage::new(html),
            actions: Arc::new(Mutex::new(Vec::new())),
            missing: HashSet::new(),
        }
    }

    /// Any action on `locator` fails as if the element never appeared.
    pub fn without(mut self, locator: &Locator) -> Self {
        self.missing.insert(locator.to_string());
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    fn act(&self, action: &str, locator: &Locator) -> Result<()> {
        if self.missing.contains(&locator.to_string()) {
            return Err(AppError::ElementNotFound {
                selector: locator.to_string(),
            });
        }
        self.actions.lock().unwrap().push(format!("{} {}", action, locator));
        Ok(())
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    type Page = HtmlPage;

    fn page(&self) -> HtmlPage {
        self.page.clone()
    }

    fn element_timeout(&self) -> Duration {
        Duration::from_millis(50)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.actions.lock().unwrap().push(format!("navigate {}", url));
        Ok(())
    }

    async fn wait_for_load(&self) -> Result<()> {
        Ok(())
    }

    async fn click_within(&self, locator: &Locator, _timeout: Duration) -> Result<()> {
        self.act("click", locator)
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        self.act(&format!("fill({})", text), locator)
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        self.act("scroll", locator)
    }

    async fn wait_visible(&self, locator: &Locator) -> Result<()> {
        self.act("visible", locator)
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let kind = if full_page { "full" } else { "viewport" };
        self.actions.lock().unwrap().push(format!("screenshot {} {}", kind, name));
        Ok(())
    }
}

/// A results page in the current "poly" markup with five priced items out
/// of eight.
pub const RESULTS_PAGE: &str = r#"
<html>
  <body>
    <ol class="ui-search-layout">
      <li><h3 class="poly-component__title">  Consola PlayStation 5 Slim  </h3>
          <span class="andes-money-amount__fraction">8,999</span></li>
      <li><h3 class="poly-component__title">PlayStation 5 Digital</h3>
          <span class="andes-money-amount__fraction">9,299</span></li>
      <li><h3 class="poly-component__title">PlayStation 5 Pro</h3>
          <span class="andes-money-amount__fraction">13,999</span></li>
      <li><h3 class="poly-component__title">Control DualSense</h3>
          <span class="andes-money-amount__fraction">1,299</span></li>
      <li><h3 class="poly-component__title">PlayStation VR2</h3>
          <span class="andes-money-amount__fraction">10,499</span></li>
      <li><h3 class="poly-component__title">Base de carga</h3></li>
      <li><h3 class="poly-component__title">Audífonos Pulse 3D</h3></li>
      <li><h3 class="poly-component__title">Disco Spider-Man 2</h3></li>
    </ol>
  </body>
</html>
"#;
