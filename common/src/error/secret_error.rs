use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Misuse of a [`RedactedSecret`](crate::RedactedSecret).
#[derive(Debug, ThisError)]
pub enum SecretError {
    /// Secrets leave the process through `expose()`, never through serde.
    #[error("Secret Not Serializable Error: {message} {location}")]
    NotSerializable {
        message: String,
        location: ErrorLocation,
    },
}
