//! Failures reported by the RPC collaborators (engine, attachment, managers).

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RpcError {
    /// The remote side answered the call with an error.
    #[error("Remote Error: {message} {location}")]
    Remote {
        message: String,
        location: ErrorLocation,
    },

    /// The requested component, parameter or method does not exist.
    #[error("Unavailable Error: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Engine Error: {message} {location}")]
    Engine {
        message: String,
        location: ErrorLocation,
    },
}

impl RpcError {
    #[track_caller]
    pub fn remote(message: impl Into<String>) -> Self {
        RpcError::Remote {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        RpcError::Unavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn engine(message: impl Into<String>) -> Self {
        RpcError::Engine {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
