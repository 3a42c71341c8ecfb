use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;
use tokio_tungstenite::tungstenite::Error as WsError;

#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("Transport URL Error: {message} {location}")]
    Url {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport TLS Error: {message} {location}")]
    Tls {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    /// The websocket opened but the Engine.IO open packet never came or made no sense.
    #[error("Transport Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    /// A frame after the handshake that is not a valid Engine.IO packet.
    #[error("Transport Framing Error: {message} {location}")]
    Framing {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Closed: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },
}

impl TransportError {
    #[track_caller]
    pub fn url(message: impl Into<String>) -> Self {
        TransportError::Url {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn handshake(message: impl Into<String>) -> Self {
        TransportError::Handshake {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn framing(message: impl Into<String>) -> Self {
        TransportError::Framing {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn closed(message: impl Into<String>) -> Self {
        TransportError::Closed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<WsError> for TransportError {
    #[track_caller]
    fn from(error: WsError) -> Self {
        TransportError::Connect {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for TransportError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        TransportError::Url {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<rustls::Error> for TransportError {
    #[track_caller]
    fn from(error: rustls::Error) -> Self {
        TransportError::Tls {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
