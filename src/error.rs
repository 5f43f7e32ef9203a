/// Contract violations raised by the conversion engine.
///
/// Malformed conversation data is normalized rather than rejected; these
/// errors only cover callers handing a stage a shape it cannot work on.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Message {index} has no content blocks to mark for caching")]
    EmptyContent { index: usize },

    #[error("Message {index} has unexpected content: {found}")]
    UnexpectedContent { index: usize, found: String },

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
