use thiserror::Error;

#[derive(Debug, Error)]
pub enum VitError {
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] vitrine_fjall::FjallError),

    #[error("Invalid category filter: {0}")]
    Filter(#[from] vitrine_catalog::UnknownCategory),
}
