use std::fmt;

/// A signed-in user: their email and the identity-provider token sent as the
/// bearer credential. Passed explicitly to every call that needs a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    token: String,
}

impl Session {
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}
