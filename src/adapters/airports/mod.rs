use thiserror::Error;

pub mod amadeus;

pub use amadeus::AmadeusClient;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Token exchange failed with status {0}")]
    Token(reqwest::StatusCode),
    #[error("Location search failed with status {0}")]
    Search(reqwest::StatusCode),
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
}
