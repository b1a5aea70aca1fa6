pub mod config;
pub mod error;
pub mod types;

pub use config::{CookieInput, CrawlerConfig};
pub use error::CrawlError;
