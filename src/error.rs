//! Process-level error type.
//!
//! Exit code conventions:
//!
//! - 2: invalid input or configuration (bad flags, missing columns)
//! - 3: no usable data (empty input, nothing fit anywhere)
//! - 4: internal or I/O failure (export, chart rendering)
//!
//! Group-scoped failures (ineligible groups, fit failures) never become an
//! `AppError`; they are logged and counted so sibling groups keep running.

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
