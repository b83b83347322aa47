use async_trait::async_trait;
use headless_chrome::browser::tab::element::Element;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshot, CaptureScreenshotFormatOption, Viewport};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::BrowserConfig;
use crate::element_finder::{ElementSet, PageHandle};
use crate::journey::Driver;
use crate::{AppError, Result};

/// How an interactive element is located on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// A link whose visible text or accessible label contains `name`,
    /// ignoring case.
    pub fn link_named(name: &str) -> Self {
        Locator::XPath(format!(
            "//a[{} or {}]",
            contains_folded("normalize-space(.)", name),
            contains_folded("@aria-label", name)
        ))
    }

    /// A button whose visible text or accessible label contains `name`,
    /// ignoring case.
    pub fn button_named(name: &str) -> Self {
        Locator::XPath(format!(
            "//*[(self::button or @role='button') and ({} or {})]",
            contains_folded("normalize-space(.)", name),
            contains_folded("@aria-label", name)
        ))
    }

    /// A text input or combobox whose label or placeholder contains `label`,
    /// ignoring case.
    pub fn input_labelled(label: &str) -> Self {
        Locator::XPath(format!(
            "//*[(self::input or @role='combobox') and ({} or {})]",
            contains_folded("@aria-label", label),
            contains_folded("@placeholder", label)
        ))
    }

    /// The innermost element whose own text is `text`.
    pub fn text(text: &str) -> Self {
        Locator::XPath(format!("//*[normalize-space(text())={}]", xpath_literal(text)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::XPath(s) => s,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

// XPath 1.0 has no lower-case(); translate() folds ASCII and Spanish capitals.
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZÁÉÍÓÚÑÜ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyzáéíóúñü";

/// `expr` contains `needle`, compared case-insensitively.
fn contains_folded(expr: &str, needle: &str) -> String {
    format!(
        "contains(translate({expr}, '{UPPER}', '{LOWER}'), {})",
        xpath_literal(&needle.to_lowercase())
    )
}

/// Quotes `value` as an XPath string literal.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{}'", part)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[derive(Debug, Deserialize)]
struct ScriptReply<T> {
    ok: Option<T>,
    error: Option<String>,
}

/// Runs `body` in the page and decodes its `{ ok } | { error }` reply.
///
/// Replies travel as JSON strings because primitive values are the only
/// ones `evaluate` hands back by value.
fn evaluate_json<T: DeserializeOwned>(tab: &Tab, body: &str) -> anyhow::Result<T> {
    let script = format!(
        "(() => {{ try {{ return JSON.stringify({{ ok: (() => {{ {body} }})() }}); }} \
         catch (e) {{ return JSON.stringify({{ error: String(e && e.message || e) }}); }} }})()"
    );
    let remote = tab.evaluate(&script, false)?;
    let raw = match remote.value {
        Some(serde_json::Value::String(raw)) => raw,
        other => anyhow::bail!("unexpected script result: {:?}", other),
    };

    let reply: ScriptReply<T> = serde_json::from_str(&raw)?;
    match (reply.ok, reply.error) {
        (_, Some(error)) => anyhow::bail!(error),
        (Some(value), None) => Ok(value),
        (None, None) => anyhow::bail!("script returned nothing"),
    }
}

fn wait_for<'t>(tab: &'t Tab, locator: &Locator, timeout: Duration) -> anyhow::Result<Element<'t>> {
    let element = match locator {
        Locator::Css(selector) => tab.wait_for_element_with_custom_timeout(selector, timeout)?,
        Locator::XPath(xpath) => tab.wait_for_xpath_with_custom_timeout(xpath, timeout)?,
    };
    Ok(element)
}

/// PNG capture request. A clip larger than the viewport is only rendered
/// when Chrome is told to capture beyond it.
fn screenshot_request(clip: Option<Viewport>) -> CaptureScreenshot {
    CaptureScreenshot {
        format: Some(CaptureScreenshotFormatOption::Png),
        quality: None,
        capture_beyond_viewport: Some(clip.is_some()),
        clip,
        from_surface: Some(true),
        optimize_for_speed: None,
    }
}

const IS_VISIBLE: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    const style = window.getComputedStyle(this); \
    return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none'; }";

/// One browser with one tab, driven step by step.
///
/// `headless_chrome` is synchronous; every call runs on the blocking pool so
/// independent reads can overlap.
pub struct BrowserSession {
    _browser: Browser,
    tab: Arc<Tab>,
    config: BrowserConfig,
}

impl BrowserSession {
    pub fn launch(config: BrowserConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(Duration::from_millis(config.navigation_timeout_ms.saturating_mul(4)))
            .args(vec![
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--lang=es-MX"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_millis(config.element_timeout_ms));
        tab.set_user_agent(&config.user_agent, Some("es-MX,es;q=0.9"), None)
            .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;

        info!(headless = config.headless, "Browser launched");
        Ok(Self {
            _browser: browser,
            tab,
            config,
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || f(&tab))
            .await?
            .map_err(|e| AppError::Browser(e.to_string()))
    }
}

#[async_trait]
impl Driver for BrowserSession {
    type Page = ChromePage;

    fn page(&self) -> ChromePage {
        ChromePage { tab: self.tab.clone() }
    }

    fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.config.element_timeout_ms)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        let navigation_timeout = Duration::from_millis(self.config.navigation_timeout_ms);
        let element_timeout = self.element_timeout();
        debug!(%url, "Navigating");
        self.blocking(move |tab| {
            tab.set_default_timeout(navigation_timeout);
            let navigated = tab.navigate_to(&url).and_then(|tab| tab.wait_until_navigated());
            tab.set_default_timeout(element_timeout);
            navigated?;
            Ok(())
        })
        .await
    }

    async fn wait_for_load(&self) -> Result<()> {
        self.blocking(|tab| {
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await
    }

    async fn click_within(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let locator = locator.clone();
        debug!(%locator, "Clicking");
        self.blocking(move |tab| {
            let element = wait_for(tab, &locator, timeout)?;
            element.scroll_into_view()?;
            element.click()?;
            Ok(())
        })
        .await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        let locator = locator.clone();
        let text = text.to_string();
        let timeout = self.element_timeout();
        self.blocking(move |tab| {
            let element = wait_for(tab, &locator, timeout)?;
            element.call_js_fn("function() { this.value = ''; }", vec![], false)?;
            element.type_into(&text)?;
            Ok(())
        })
        .await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        let locator = locator.clone();
        let timeout = self.element_timeout();
        self.blocking(move |tab| {
            wait_for(tab, &locator, timeout)?.scroll_into_view()?;
            Ok(())
        })
        .await
    }

    async fn wait_visible(&self, locator: &Locator) -> Result<()> {
        let locator = locator.clone();
        let timeout = self.element_timeout();
        self.blocking(move |tab| {
            let started = Instant::now();
            let element = wait_for(tab, &locator, timeout)?;
            loop {
                let visible = element.call_js_fn(IS_VISIBLE, vec![], false)?.value;
                if visible == Some(serde_json::Value::Bool(true)) {
                    return Ok(());
                }
                if started.elapsed() >= timeout {
                    anyhow::bail!("{} is present but not visible after {:?}", locator, timeout);
                }
                std::thread::sleep(Duration::from_millis(100));
            }
        })
        .await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        let data = self
            .blocking(move |tab| {
                let clip = if full_page {
                    let (width, height): (f64, f64) = evaluate_json(
                        tab,
                        "const el = document.documentElement; \
                         return [el.scrollWidth, el.scrollHeight];",
                    )?;
                    Some(Viewport {
                        x: 0.0,
                        y: 0.0,
                        width,
                        height,
                        scale: 1.0,
                    })
                } else {
                    None
                };
                let encoded = tab.call_method(screenshot_request(clip))?.data;
                Ok(BASE64_STANDARD.decode(encoded)?)
            })
            .await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, data).await?;
        debug!(path = %path.display(), full_page, "Screenshot written");
        Ok(())
    }
}

/// `PageHandle` over the live tab.
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
}

/// Elements matching a selector in the live tab, re-queried on every read.
#[derive(Clone)]
pub struct ChromeElements {
    tab: Arc<Tab>,
    selector: String,
}

#[async_trait]
impl PageHandle for ChromePage {
    type Elements = ChromeElements;

    async fn query(&self, selector: &str) -> Result<ChromeElements> {
        Ok(ChromeElements {
            tab: self.tab.clone(),
            selector: selector.to_string(),
        })
    }
}

impl ChromeElements {
    async fn run<T>(&self, body: String, index: Option<usize>) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let tab = self.tab.clone();
        let result = tokio::task::spawn_blocking(move || evaluate_json::<T>(&tab, &body)).await?;
        result.map_err(|e| AppError::Read {
            selector: self.selector.clone(),
            index: index.unwrap_or(0),
            message: e.to_string(),
        })
    }

    fn selector_literal(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.selector)?)
    }
}

#[async_trait]
impl ElementSet for ChromeElements {
    fn selector(&self) -> &str {
        &self.selector
    }

    async fn count(&self) -> Result<usize> {
        let body = format!(
            "return document.querySelectorAll({}).length;",
            self.selector_literal()?
        );
        self.run(body, None).await
    }

    async fn text_at(&self, index: usize) -> Result<String> {
        let body = format!(
            "const el = document.querySelectorAll({})[{}]; \
             if (!el) throw new Error('no element at index {}'); \
             return el.innerText;",
            self.selector_literal()?,
            index,
            index
        );
        self.run(body, Some(index)).await
    }
}
