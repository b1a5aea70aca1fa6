pub mod core;
pub mod extract;
pub mod links;
pub mod substrate;
pub mod traverse;
pub mod urlnorm;
pub mod validate;

// --- Primary exports ---
pub use self::core::config::{CookieInput, CrawlerConfig, SITE_HOST};
pub use self::core::error::CrawlError;
pub use self::core::types;
pub use self::core::types::*;
pub use extract::JobExtractor;
pub use substrate::{
    classify_failure, CollectingSink, FailureKind, HttpSubstrate, RequestQueue, ResultSink,
    RunSummary,
};
pub use traverse::{CommitOutcome, RequestDelay, TraversalController, TraversalState};
