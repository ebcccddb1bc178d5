use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerErrorCode {
    InvalidState,
    InstallFailed,
    InvalidMessage,
    InvalidConfig,
    RegistrationFailed,
    Unsupported,
    Internal,
}

impl WorkerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerErrorCode::InvalidState => "worker/invalid-state",
            WorkerErrorCode::InstallFailed => "worker/install-failed",
            WorkerErrorCode::InvalidMessage => "worker/invalid-message",
            WorkerErrorCode::InvalidConfig => "worker/invalid-config",
            WorkerErrorCode::RegistrationFailed => "worker/registration-failed",
            WorkerErrorCode::Unsupported => "worker/unsupported",
            WorkerErrorCode::Internal => "worker/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkerError {
    pub code: WorkerErrorCode,
    message: String,
}

impl WorkerError {
    pub fn new(code: WorkerErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for WorkerError {}

pub type WorkerResult<T> = Result<T, WorkerError>;

pub fn invalid_state(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InvalidState, message)
}

pub fn install_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InstallFailed, message)
}

pub fn invalid_message(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InvalidMessage, message)
}

pub fn invalid_config(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InvalidConfig, message)
}

pub fn registration_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::RegistrationFailed, message)
}

pub fn unsupported(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::Unsupported, message)
}

pub fn internal_error(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::Internal, message)
}
