use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientsErrorCode {
    MatchFailed,
    FocusFailed,
    OpenWindowFailed,
    ClaimFailed,
    Unsupported,
}

impl ClientsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientsErrorCode::MatchFailed => "clients/match-failed",
            ClientsErrorCode::FocusFailed => "clients/focus-failed",
            ClientsErrorCode::OpenWindowFailed => "clients/open-window-failed",
            ClientsErrorCode::ClaimFailed => "clients/claim-failed",
            ClientsErrorCode::Unsupported => "clients/unsupported",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientsError {
    pub code: ClientsErrorCode,
    message: String,
}

impl ClientsError {
    pub fn new(code: ClientsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for ClientsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for ClientsError {}

pub type ClientsResult<T> = Result<T, ClientsError>;

pub fn match_failed(message: impl Into<String>) -> ClientsError {
    ClientsError::new(ClientsErrorCode::MatchFailed, message)
}

pub fn focus_failed(message: impl Into<String>) -> ClientsError {
    ClientsError::new(ClientsErrorCode::FocusFailed, message)
}

pub fn open_window_failed(message: impl Into<String>) -> ClientsError {
    ClientsError::new(ClientsErrorCode::OpenWindowFailed, message)
}

pub fn claim_failed(message: impl Into<String>) -> ClientsError {
    ClientsError::new(ClientsErrorCode::ClaimFailed, message)
}

pub fn unsupported(message: impl Into<String>) -> ClientsError {
    ClientsError::new(ClientsErrorCode::Unsupported, message)
}
