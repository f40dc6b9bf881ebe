use std::path::PathBuf;

/// Result alias that carries the custom [`TrailError`] type.
pub type Result<T> = std::result::Result<T, TrailError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum TrailError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// A configuration value is outside the range the trail can work with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// An image asset could not be read or decoded.
    #[error("failed to load asset `{}`: {reason}", path.display())]
    AssetLoad { path: PathBuf, reason: String },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Image(#[from] image::ImageError),
}

impl TrailError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for TrailError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for TrailError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_errors_name_the_path() {
        let err = TrailError::AssetLoad {
            path: PathBuf::from("img/3.jpeg"),
            reason: "truncated".to_string(),
        };
        let text = format!("{err}");
        assert!(text.contains("img/3.jpeg"));
        assert!(text.contains("truncated"));
    }
}
