//! Error types for stream parsing.

/// Errors produced while demultiplexing and decoding the tailed stream.
///
/// None of these are fatal for the stream as a whole; the demultiplexer
/// reports them and carries on unless the caller asked it to abort a section.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A region's first line does not match the address range grammar.
    #[error("Malformed memory region header: {0:?}")]
    MalformedHeader(String),

    /// A known counter line carries a value that cannot be decoded.
    #[error("Invalid value for {field}: {line:?}")]
    InvalidCounter { field: String, line: String },

    /// A boundary-like line failed the full grammar, or content arrived
    /// while no section was active.
    #[error("Protocol desynchronization at line: {0:?}")]
    ProtocolDesync(String),

    /// Wrapper for [`std::io::Error`] from the line reader.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// True for errors that only affect a single memory region.
    pub fn is_region_scoped(&self) -> bool {
        matches!(
            self,
            ParseError::MalformedHeader(_) | ParseError::InvalidCounter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_scoped() {
        assert!(ParseError::MalformedHeader("x".into()).is_region_scoped());
        assert!(ParseError::InvalidCounter {
            field: "Rss".into(),
            line: "Rss: x kB".into()
        }
        .is_region_scoped());
        assert!(!ParseError::ProtocolDesync("==> junk".into()).is_region_scoped());
    }

    #[test]
    fn test_display_names_offending_text() {
        let e = ParseError::MalformedHeader("not a header".into());
        assert!(e.to_string().contains("not a header"));
    }
}
