use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
