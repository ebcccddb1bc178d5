use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushErrorCode {
    MalformedPayload,
    DisplayFailed,
    PermissionDenied,
}

impl PushErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushErrorCode::MalformedPayload => "push/malformed-payload",
            PushErrorCode::DisplayFailed => "push/display-failed",
            PushErrorCode::PermissionDenied => "push/permission-denied",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PushError {
    pub code: PushErrorCode,
    message: String,
}

impl PushError {
    pub fn new(code: PushErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for PushError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for PushError {}

pub type PushResult<T> = Result<T, PushError>;

pub fn malformed_payload(message: impl Into<String>) -> PushError {
    PushError::new(PushErrorCode::MalformedPayload, message)
}

pub fn display_failed(message: impl Into<String>) -> PushError {
    PushError::new(PushErrorCode::DisplayFailed, message)
}

pub fn permission_denied(message: impl Into<String>) -> PushError {
    PushError::new(PushErrorCode::PermissionDenied, message)
}
