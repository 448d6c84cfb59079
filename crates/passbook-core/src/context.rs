use chrono::{DateTime, Utc};

/// Signed-in user state, passed explicitly to whatever needs it.
///
/// Created after the final login step and dropped (or [`logout`]ed) when
/// the user signs out. Nothing holds it globally.
///
/// [`logout`]: SessionContext::logout
#[derive(Debug, Clone)]
pub struct SessionContext {
    subject: String,
    token: Option<String>,
    logged_in_at: DateTime<Utc>,
}

impl SessionContext {
    /// Start a session for `subject` with the bearer token issued at login.
    pub fn login(subject: impl Into<String>, token: impl Into<String>) -> Self {
        let subject = subject.into();
        tracing::info!(subject = %subject, "session started");
        Self {
            subject,
            token: Some(token.into()),
            logged_in_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }

    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    /// `Authorization` header value, while the session is active.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    /// Forget the token. Idempotent.
    pub fn logout(&mut self) {
        if self.token.take().is_some() {
            tracing::info!(subject = %self.subject, "session ended");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_sets_bearer_header() {
        let session = SessionContext::login("kim@example.com", "abc.def.ghi");
        assert!(session.is_active());
        assert_eq!(session.authorization().as_deref(), Some("Bearer abc.def.ghi"));
        assert!(session.logged_in_at() <= Utc::now());
    }

    #[test]
    fn test_logout_clears_token_and_is_idempotent() {
        let mut session = SessionContext::login("kim@example.com", "t");
        session.logout();
        session.logout();
        assert!(!session.is_active());
        assert_eq!(session.authorization(), None);
        assert_eq!(session.subject(), "kim@example.com");
    }
}
