//! Status codes as the login endpoint reports them.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// An HTTP status code kept as the raw number.
///
/// Displays as the bare number so `status {code}` messages stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub const OK: HttpStatusCode = HttpStatusCode(200);

    /// Exactly 200. Other 2xx codes are not a successful login.
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl Display for HttpStatusCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}
