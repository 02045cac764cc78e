//! Error type for a pipeline run

use crate::extractor::ExtractError;

/// Why a pipeline run stopped before finalizing.
///
/// Every variant means the trailing batch was not flushed and any
/// in-progress record was dropped.
#[derive(Debug)]
pub enum PipelineError {
    /// The XML reader failed (I/O or malformed document)
    Source(quick_xml::Error),
    /// Malformed item structure under strict recovery
    Extract(ExtractError),
    /// The sink rejected a batch
    Sink(std::io::Error),
    /// Shutdown was requested while reading
    Cancelled,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(e) => write!(f, "feed: {e}"),
            Self::Extract(e) => write!(f, "extract: {e}"),
            Self::Sink(e) => write!(f, "sink: {e}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            Self::Extract(e) => Some(e),
            Self::Sink(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

impl From<quick_xml::Error> for PipelineError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Source(e)
    }
}

impl From<ExtractError> for PipelineError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        Self::Sink(e)
    }
}

impl PipelineError {
    /// Whether the run was stopped by a shutdown request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
