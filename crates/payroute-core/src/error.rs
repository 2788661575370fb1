/// Core errors: configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("zero address configured for {0}")]
    ZeroAddress(&'static str),

    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration encode error: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),
}
