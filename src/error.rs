use oneroof_shared::ErrorBody;
use thiserror::Error;

// =========================================================
// 错误分类
// =========================================================

/// Which UI surface is responsible for showing an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Inline on the form that triggered it (bad credentials, provider failure).
    Form,
    /// Already handled globally by the secured client (401/403).
    Redirect,
    /// Caught before anything was submitted.
    Validation,
    /// A read failed; the screen shows a retry panel.
    RetryPanel,
    /// A mutation or payment step failed; shown as a toast, the user stays put.
    Toast,
}

// =========================================================
// 核心错误类型
// =========================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// Sign-in/sign-up rejected by the auth provider.
    #[error("{0}")]
    Auth(String),
    /// 401: credential missing, invalid or expired.
    #[error("session expired: {0}")]
    Unauthorized(String),
    /// 403: authenticated but not allowed.
    #[error("access denied: {0}")]
    Forbidden(String),
    /// Client-side validation failure; nothing was sent.
    #[error("{0}")]
    Validation(String),
    /// 404
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other non-2xx backend response.
    #[error("request failed with status {status}: {message}")]
    Backend { status: u16, message: String },
    /// Transport failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// Response body did not match the expected shape.
    #[error("invalid response: {0}")]
    Serialization(String),
    /// Card tokenization or confirmation failed at the payment gateway.
    #[error("{0}")]
    Payment(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    // --- Convenience constructors ---

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn payment(message: impl Into<String>) -> Self {
        Self::Payment(message.into())
    }

    /// Build an error from a non-2xx response, preferring the backend's `message` field.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.message)
            .ok()
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && !trimmed.starts_with('<')).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::Backend { status, message },
        }
    }

    // --- Accessors ---

    /// HTTP status this error corresponds to, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable code, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AUTH_FAILED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "INVALID_INPUT",
            Self::NotFound(_) => "RESOURCE_NOT_FOUND",
            Self::Backend { .. } => "BACKEND_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Serialization(_) => "JSON_PARSE_ERROR",
            Self::Payment(_) => "PAYMENT_FAILED",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) => ErrorCategory::Form,
            Self::Unauthorized(_) | Self::Forbidden(_) => ErrorCategory::Redirect,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::NotFound(_) | Self::Network(_) | Self::Serialization(_) => {
                ErrorCategory::RetryPanel
            }
            Self::Backend { .. } | Self::Payment(_) => ErrorCategory::Toast,
        }
    }

    /// The text shown to the user, without the diagnostic prefix.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Auth(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::Validation(m)
            | Self::NotFound(m)
            | Self::Network(m)
            | Self::Serialization(m)
            | Self::Payment(m) => m,
            Self::Backend { message, .. } => message,
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        401 => "Please sign in again",
        403 => "You do not have permission to do that",
        404 => "The requested resource was not found",
        409 => "The request conflicts with the current state",
        s if s >= 500 => "The server encountered an error",
        _ => "The request could not be completed",
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
