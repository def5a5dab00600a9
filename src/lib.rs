pub mod catalog;
pub mod comparator;
pub mod config;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod price;
pub mod render;
pub mod strategy;
pub mod text;
pub mod utils;

// Re-export commonly used types
pub use comparator::{PageComparison, PriceComparator};
pub use config::AppConfig;
pub use models::{CompareRequest, CompareResponse, ScrapeOutcome};
pub use render::{ChromeRenderService, RenderService};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
