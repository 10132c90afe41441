use crate::protocol::DecodeError;

/// Failure to translate a single packet. The connection carries on.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("chunk section {section} is malformed")]
    MalformedChunk {
        section: usize,
        /// Whether a custom block was already seen in the payload.
        custom_seen: bool,
        #[source]
        source: DecodeError,
    },
    #[error("surrogate state {state} does not fit a {bits}-bit container")]
    SurrogateTooWide { state: i32, bits: u8 },
}

impl TranslateError {
    /// Whether forwarding the untranslated packet would reveal a
    /// custom block to the client.
    pub fn leaks_custom_identity(&self) -> bool {
        match self {
            TranslateError::MalformedChunk { custom_seen, .. } => *custom_seen,
            TranslateError::SurrogateTooWide { .. } => true,
        }
    }
}
