use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessagingErrorCode {
    InvalidArgument,
    Internal,
    MissingAppConfigValues,
    DuplicateApp,
    AvailableInServiceWorker,
    ConfigFetchFailed,
    MalformedPayload,
}

impl MessagingErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagingErrorCode::InvalidArgument => "messaging/invalid-argument",
            MessagingErrorCode::Internal => "messaging/internal",
            MessagingErrorCode::MissingAppConfigValues => "messaging/missing-app-config-values",
            MessagingErrorCode::DuplicateApp => "messaging/duplicate-app",
            MessagingErrorCode::AvailableInServiceWorker => "messaging/only-available-in-sw",
            MessagingErrorCode::ConfigFetchFailed => "messaging/config-fetch-failed",
            MessagingErrorCode::MalformedPayload => "messaging/malformed-payload",
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessagingError {
    pub code: MessagingErrorCode,
    message: String,
}

impl MessagingError {
    pub fn new(code: MessagingErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for MessagingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for MessagingError {}

pub type MessagingResult<T> = Result<T, MessagingError>;

pub fn invalid_argument(message: impl Into<String>) -> MessagingError {
    MessagingError::new(MessagingErrorCode::InvalidArgument, message)
}

pub fn internal_error(message: impl Into<String>) -> MessagingError {
    MessagingError::new(MessagingErrorCode::Internal, message)
}

pub fn missing_app_config_values(field: &str) -> MessagingError {
    MessagingError::new(
        MessagingErrorCode::MissingAppConfigValues,
        format!("Missing App configuration value: \"{field}\""),
    )
}

pub fn duplicate_app(app_name: &str) -> MessagingError {
    MessagingError::new(
        MessagingErrorCode::DuplicateApp,
        format!("Firebase App named '{app_name}' already exists with different options"),
    )
}

pub fn available_in_service_worker(message: impl Into<String>) -> MessagingError {
    MessagingError::new(MessagingErrorCode::AvailableInServiceWorker, message)
}

pub fn config_fetch_failed(message: impl Into<String>) -> MessagingError {
    MessagingError::new(MessagingErrorCode::ConfigFetchFailed, message)
}

pub fn malformed_payload(message: impl Into<String>) -> MessagingError {
    MessagingError::new(MessagingErrorCode::MalformedPayload, message)
}
