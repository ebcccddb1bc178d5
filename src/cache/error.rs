use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheErrorCode {
    OpenFailed,
    ReadFailed,
    WriteFailed,
    DeleteFailed,
    InstallFailed,
    Internal,
}

impl CacheErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheErrorCode::OpenFailed => "cache/open-failed",
            CacheErrorCode::ReadFailed => "cache/read-failed",
            CacheErrorCode::WriteFailed => "cache/write-failed",
            CacheErrorCode::DeleteFailed => "cache/delete-failed",
            CacheErrorCode::InstallFailed => "cache/install-failed",
            CacheErrorCode::Internal => "cache/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CacheError {
    pub code: CacheErrorCode,
    message: String,
}

impl CacheError {
    pub fn new(code: CacheErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for CacheError {}

pub type CacheResult<T> = Result<T, CacheError>;

pub fn open_failed(message: impl Into<String>) -> CacheError {
    CacheError::new(CacheErrorCode::OpenFailed, message)
}

pub fn read_failed(message: impl Into<String>) -> CacheError {
    CacheError::new(CacheErrorCode::ReadFailed, message)
}

pub fn write_failed(message: impl Into<String>) -> CacheError {
    CacheError::new(CacheErrorCode::WriteFailed, message)
}

pub fn delete_failed(message: impl Into<String>) -> CacheError {
    CacheError::new(CacheErrorCode::DeleteFailed, message)
}

pub fn install_failed(message: impl Into<String>) -> CacheError {
    CacheError::new(CacheErrorCode::InstallFailed, message)
}

pub fn internal_error(message: impl Into<String>) -> CacheError {
    CacheError::new(CacheErrorCode::Internal, message)
}
