use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkErrorCode {
    /// The request never produced a response (offline, DNS failure, reset connection).
    Unreachable,
    InvalidRequest,
    BodyReadFailed,
    Internal,
}

impl NetworkErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorCode::Unreachable => "fetch/network-unreachable",
            NetworkErrorCode::InvalidRequest => "fetch/invalid-request",
            NetworkErrorCode::BodyReadFailed => "fetch/body-read-failed",
            NetworkErrorCode::Internal => "fetch/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct NetworkError {
    pub code: NetworkErrorCode,
    message: String,
}

impl NetworkError {
    pub fn new(code: NetworkErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for NetworkError {}

pub type NetworkResult<T> = Result<T, NetworkError>;

pub fn unreachable(message: impl Into<String>) -> NetworkError {
    NetworkError::new(NetworkErrorCode::Unreachable, message)
}

pub fn invalid_request(message: impl Into<String>) -> NetworkError {
    NetworkError::new(NetworkErrorCode::InvalidRequest, message)
}

pub fn body_read_failed(message: impl Into<String>) -> NetworkError {
    NetworkError::new(NetworkErrorCode::BodyReadFailed, message)
}

pub fn internal_error(message: impl Into<String>) -> NetworkError {
    NetworkError::new(NetworkErrorCode::Internal, message)
}
