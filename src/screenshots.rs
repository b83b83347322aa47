use std::path::{Path, PathBuf};

/// Checkpoints of the journey that get a screenshot, in capture order.
///
/// File names are stable across runs so successive captures can be diffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Landing,
    CountryLanding,
    SearchTyped,
    ResultsUnfiltered,
    ResultsFiltered,
    SortOptions,
    ResultsSorted,
}

impl Checkpoint {
    pub const ALL: [Checkpoint; 7] = [
        Checkpoint::Landing,
        Checkpoint::CountryLanding,
        Checkpoint::SearchTyped,
        Checkpoint::ResultsUnfiltered,
        Checkpoint::ResultsFiltered,
        Checkpoint::SortOptions,
        Checkpoint::ResultsSorted,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Checkpoint::Landing => "1-landing-page.png",
            Checkpoint::CountryLanding => "2-mexico-landing-page.png",
            Checkpoint::SearchTyped => "3-playstation-search.png",
            Checkpoint::ResultsUnfiltered => "4-results-without-filter.png",
            Checkpoint::ResultsFiltered => "5-results-with-new-filter.png",
            Checkpoint::SortOptions => "6-sort-options.png",
            Checkpoint::ResultsSorted => "7-results-sorted-by-price.png",
        }
    }

    /// Only the filtered results are captured beyond the viewport.
    pub fn full_page(self) -> bool {
        matches!(self, Checkpoint::ResultsFiltered)
    }
}

/// Where screenshots go, or nowhere when disabled.
#[derive(Debug, Clone)]
pub struct ScreenshotPlan {
    directory: Option<PathBuf>,
}

impl ScreenshotPlan {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: Some(directory.as_ref().to_path_buf()),
        }
    }

    pub fn disabled() -> Self {
        Self { directory: None }
    }

    pub fn path_for(&self, checkpoint: Checkpoint) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(checkpoint.file_name()))
    }
}
