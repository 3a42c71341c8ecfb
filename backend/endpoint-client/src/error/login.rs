//! Error types for the credential exchange.
//!
//! - HTTP status codes stored directly (not parsed from strings)
//! - `Authentication` displays exactly `status {code}`
//! - All errors include ErrorLocation for debugging

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LoginError {
    /// The login endpoint answered with anything but 200.
    #[error("status {status_code}")]
    Authentication {
        status_code: HttpStatusCode,
        location: ErrorLocation,
    },

    /// The response was 200 but lacked what a login response must carry.
    #[error("Login Protocol Error: {message} {location}")]
    Protocol {
        message: String,
        location: ErrorLocation,
    },

    #[error("Login HTTP Error: {message} {location}")]
    Http {
        message: String,
        is_timeout: bool,
        is_connection: bool,
        location: ErrorLocation,
    },

    #[error("Login TLS Error: {message} {location}")]
    Tls {
        message: String,
        location: ErrorLocation,
    },

    #[error("Login URL Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },
}

impl LoginError {
    #[track_caller]
    pub fn authentication(status_code: impl Into<HttpStatusCode>) -> Self {
        LoginError::Authentication {
            status_code: status_code.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn protocol(message: impl Into<String>) -> Self {
        LoginError::Protocol {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Status code of a rejected login, if that is what this error is.
    pub fn status_code(&self) -> Option<HttpStatusCode> {
        match self {
            LoginError::Authentication { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LoginError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        LoginError::Http {
            message: error.to_string(),
            is_timeout: error.is_timeout(),
            is_connection: error.is_connect(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<rustls::Error> for LoginError {
    #[track_caller]
    fn from(error: rustls::Error) -> Self {
        LoginError::Tls {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for LoginError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        LoginError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
