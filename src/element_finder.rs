use async_trait::async_trait;
use tracing::debug;

use crate::Result;

/// Live view of the elements one selector matches on a page.
///
/// Reads go back to the page on every call, so a set is only meaningful
/// while the page it came from keeps the same content. Re-resolve after
/// navigation or a re-render.
#[async_trait]
pub trait ElementSet: Send + Sync {
    /// Selector this set is bound to.
    fn selector(&self) -> &str;

    /// Number of elements currently matching.
    async fn count(&self) -> Result<usize>;

    /// Visible text of the element at `index`.
    async fn text_at(&self, index: usize) -> Result<String>;
}

/// A rendered page that can be queried with CSS selectors.
#[async_trait]
pub trait PageHandle: Send + Sync {
    type Elements: ElementSet;

    /// Binds `selector` to the page. A selector matching nothing yields an
    /// empty set, not an error.
    async fn query(&self, selector: &str) -> Result<Self::Elements>;
}

/// Picks the first selector of an ordered candidate list that currently
/// matches something on the page.
pub struct ElementFinder<'a, P: PageHandle> {
    page: &'a P,
}

impl<'a, P: PageHandle> ElementFinder<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self { page }
    }

    /// Returns the element set of the earliest candidate with at least one
    /// match, or `None` once the list is exhausted.
    ///
    /// Single pass over current page state: no waiting and no retries.
    pub async fn resolve<S: AsRef<str>>(&self, candidates: &[S]) -> Result<Option<P::Elements>> {
        for candidate in candidates {
            let selector = candidate.as_ref();
            let elements = self.page.query(selector).await?;
            let count = elements.count().await?;
            debug!(selector, count, "Evaluated candidate selector");

            if count > 0 {
                return Ok(Some(elements));
            }
        }

        Ok(None)
    }
}
