use thiserror::Error;

/// Failure taxonomy for the crawling core. Nothing here is fatal to a run:
/// malformed URLs and bad structured-data blocks are recovered close to where
/// they occur, a validation failure drops a single record, and a fetch
/// failure means only that the request produced no document.
///
/// An incomplete extraction is not an error at all; it surfaces as None
/// fields plus validator warnings on the emitted record.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A URL failed to parse. Recovered locally: the normalizer returns its
    /// input unchanged, the resolver returns None.
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    /// One embedded structured-data block failed to parse. The block is
    /// skipped; extraction continues with remaining blocks or falls through
    /// to the HTML fallback cascades.
    #[error("structured data block failed to parse: {0}")]
    StructuredDataParse(#[from] serde_json::Error),

    /// A record is missing a hard-required field and will not be emitted.
    #[error("record failed validation: {reason}")]
    Validation { reason: String },

    /// Substrate-origin fetch failure: no document was produced for the
    /// request, so no extraction is attempted.
    #[error("fetch failed: {0}")]
    Fetch(String),
}
