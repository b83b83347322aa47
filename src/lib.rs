pub mod browser;
pub mod catalog;
pub mod config;
pub mod element_finder;
pub mod extractor;
pub mod html_page;
pub mod journey;
pub mod report;
pub mod screenshots;
pub mod utils;

// Re-export commonly used types
pub use catalog::SelectorCatalog;
pub use config::AppConfig;
pub use element_finder::{ElementFinder, ElementSet, PageHandle};
pub use extractor::{extract_products, Extractor, Product};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
