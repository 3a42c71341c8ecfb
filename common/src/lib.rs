//! Shared building blocks for the endpoint client.
//!
//! Small types used by every layer of the client: error location tracking,
//! HTTP status codes and a secret wrapper that never shows up in logs.

pub mod error;
pub mod http_status;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::secret_error::SecretError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

#[cfg(test)]
mod tests;
