//! Structured error types for reelscroll.
//!
//! Only the configuration surface (config files, replay scripts, anchor and
//! ease strings) returns errors. The per-frame layer swallows its failures at
//! the point of detection and never surfaces them to the page.

/// All errors that can occur while configuring reelscroll.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    /// JSON parsing error from serde_json.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A trigger anchor string such as `"top 80%"` could not be parsed.
    #[error("Invalid trigger anchor: {0}")]
    InvalidAnchor(String),

    /// An ease name such as `"power3.out"` is not recognised.
    #[error("Unknown ease: {0}")]
    UnknownEase(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A browser API call failed.
    #[error("Browser API: {0}")]
    Js(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReelError>;

#[cfg(target_arch = "wasm32")]
impl From<ReelError> for wasm_bindgen::JsValue {
    fn from(e: ReelError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
