use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Jenkins username and API token.
#[derive(Clone)]
pub struct Credentials {
    user: String,
    token: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Value for the `Authorization` header.
    pub fn basic_header(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.user, self.token));
        format!("Basic {encoded}")
    }
}

// Keep the token out of debug output and logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("token", &"***")
            .finish()
    }
}
