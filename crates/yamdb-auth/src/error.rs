use jsonwebtoken::errors::Error as JwtError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
    #[error("Invalid HMAC key length")]
    InvalidKeyLength,
    #[error("Malformed confirmation code")]
    MalformedCode,
    #[error("Confirmation code expired")]
    ExpiredCode,
    #[error("Confirmation code does not match account state")]
    StaleCode,
}

impl Error {
    /// Errors caused by what the client sent, rather than by server side problems
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Error::InvalidKeyLength)
    }
}
