use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Session of the signed-in account
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountSession {
    pub session_id: String,     // UUID as string
    pub user_id: String,
    pub username: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl AccountSession {
    pub fn new(user_id: String, username: String, access_token: String) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            username,
            access_token,
            created_at: Utc::now(),
            expires_at: None,
            is_active: true,
        }
    }

    pub fn expiring_in(mut self, lifetime: Duration) -> Self {
        self.expires_at = Some(self.created_at + lifetime);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| Utc::now() >= expires_at)
            .unwrap_or(false)
    }

    pub fn is_usable(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    pub fn invalidate(&mut self) {
        self.is_active = false;
    }
}

// Tokens never reach the logs
impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("access_token", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("is_active", &self.is_active)
            .finish()
    }
}
