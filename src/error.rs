use thiserror::Error;

/// Boxed error produced by an upstream row source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage a failure is attributed to when it reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    RowSource,
    Draw,
    Finalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::RowSource => "row source",
            Stage::Draw => "draw",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum WideTableError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("configuration could not be read: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row source failed before row {row}: {source}")]
    RowSource {
        row: usize,
        #[source]
        source: SourceError,
    },
    #[error("no page state for column group {group} in page set {page_set}")]
    MissingPageState { group: usize, page_set: u64 },
    #[error("no active page set")]
    NoActivePageSet,
    #[error("page index {index} out of range ({count} pages buffered)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("canvas {operation} failed: {message}")]
    Canvas {
        operation: &'static str,
        message: String,
    },
    #[error("pagination already finished")]
    AlreadyFinished,
    #[error("PDF generation error: {0}")]
    Pdf(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WideTableError {
    /// A drawing call on the canvas collaborator failed.
    pub fn canvas(operation: &'static str, message: impl Into<String>) -> Self {
        WideTableError::Canvas {
            operation,
            message: message.into(),
        }
    }

    pub fn row_source(row: usize, source: impl Into<SourceError>) -> Self {
        WideTableError::RowSource {
            row,
            source: source.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            WideTableError::InvalidConfiguration(_) | WideTableError::Json(_) => {
                Stage::Configuration
            }
            WideTableError::RowSource { .. } => Stage::RowSource,
            WideTableError::MissingPageState { .. }
            | WideTableError::NoActivePageSet
            | WideTableError::PageOutOfRange { .. }
            | WideTableError::Canvas { .. }
            | WideTableError::AlreadyFinished => Stage::Draw,
            WideTableError::Pdf(_) | WideTableError::Io(_) => Stage::Finalize,
        }
    }

    /// Bookkeeping desynchronisation between column groups and page sets.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            WideTableError::MissingPageState { .. } | WideTableError::NoActivePageSet
        )
    }
}

impl From<lopdf::Error> for WideTableError {
    fn from(err: lopdf::Error) -> Self {
        WideTableError::Pdf(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_follow_failure_kind() {
        let err = WideTableError::row_source(3, "socket closed");
        assert_eq!(err.stage(), Stage::RowSource);
        assert!(err.to_string().contains("row 3"));
        assert!(err.to_string().contains("socket closed"));

        let err = WideTableError::MissingPageState {
            group: 2,
            page_set: 7,
        };
        assert_eq!(err.stage(), Stage::Draw);
        assert!(err.is_invariant_violation());

        let err = WideTableError::canvas("fill", "sink closed");
        assert_eq!(err.stage(), Stage::Draw);
        assert_eq!(err.to_string(), "canvas fill failed: sink closed");

        let err: WideTableError = std::io::Error::other("disk full").into();
        assert_eq!(err.stage(), Stage::Finalize);
        assert!(!err.is_invariant_violation());
    }
}
