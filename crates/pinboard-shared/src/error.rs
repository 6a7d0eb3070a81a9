use thiserror::Error;

/// Reasons a note draft is rejected. Always correctable by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Note is empty: provide content or an image")]
    EmptyNote,

    #[error("Content too long: {len} characters (max {max})")]
    ContentTooLong { len: usize, max: usize },

    #[error("Image too large: {len} characters (max {max})")]
    ImageTooLarge { len: usize, max: usize },

    #[error("Image must be a base64 data URL (data:image/...)")]
    InvalidImage,
}
