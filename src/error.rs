use crate::response::{Response, ResponseDefaults};
use serde_json::json;
use thiserror::Error;

/// Coarse classification of a [`RouteError`], used by recovery handlers that
/// match on kind rather than on the full variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Custom,
}

/// Errors carried through a dispatch as a pending error.
///
/// Every variant carries enough information to render a default response by
/// itself, so an error that reaches the end of the top-level process list
/// unrecovered still produces a well-formed reply. `Custom` is the extension
/// point for application-specific kinds; it carries its own status code.
#[derive(Error, Debug)]
pub enum RouteError {
    /// The request failed validation. Renders as a client error.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// The request lacks valid credentials. Renders as authentication-required.
    #[error("authorization required: {message}")]
    Unauthorized { message: String },

    /// A referenced resource does not exist. Renders as not-found.
    #[error("'{resource}' was not found")]
    NotFound { resource: String },

    /// An application-specific error kind with its own status code.
    #[error("{message}")]
    Custom {
        kind: String,
        status: u16,
        message: String,
    },
}

impl RouteError {
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[inline]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[inline]
    pub fn custom(kind: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Custom {
            kind: kind.into(),
            status,
            message: message.into(),
        }
    }

    /// An unclassified internal failure. Renders as a generic server error
    /// without exposing the message to the client.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Custom {
            kind: String::from("internal"),
            status: 500,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RouteError::Validation { .. } => ErrorKind::Validation,
            RouteError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RouteError::NotFound { .. } => ErrorKind::NotFound,
            RouteError::Custom { .. } => ErrorKind::Custom,
        }
    }

    /// The kind tag of a `Custom` error, if this is one.
    pub fn custom_kind(&self) -> Option<&str> {
        match self {
            RouteError::Custom { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            RouteError::Validation { .. } => 400,
            RouteError::Unauthorized { .. } => 401,
            RouteError::NotFound { .. } => 404,
            RouteError::Custom { status, .. } => *status,
        }
    }

    /// Renders this error as its default response.
    ///
    /// Client errors carry their message in a structured JSON body. Anything
    /// rendering with a server-error status replaces the message with a fixed
    /// phrase; the original detail stays in the logs only.
    pub fn into_response(&self, defaults: &ResponseDefaults) -> Response {
        let status = self.status();
        let kind = match self {
            RouteError::Validation { .. } => "validation",
            RouteError::Unauthorized { .. } => "unauthorized",
            RouteError::NotFound { .. } => "not_found",
            RouteError::Custom { kind, .. } => kind.as_str(),
        };
        let message = if status >= 500 {
            String::from("internal server error")
        } else {
            self.to_string()
        };
        let payload = json!({
            "error": kind,
            "message": message,
        });
        defaults.apply(Response::json_value(status, &payload))
    }
}
