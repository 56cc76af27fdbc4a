use thiserror::Error;

pub type GatewayResult<T> = Result<T, Error>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The service could not be contacted: connection, timeout or an unavailable upstream
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),
    /// The service was reached but declined the request
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),
}

impl Error {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// The message without the kind prefix, shown to the user
    pub fn reason(&self) -> &str {
        match self {
            Self::Unreachable(reason) | Self::Rejected(reason) => reason,
        }
    }
}
