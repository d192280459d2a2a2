use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::session::AccountSession;

/// Collaborator owning state that must not outlive the signed-in account
/// (cached drafts, notification tokens, per-account preferences, ...).
#[async_trait]
pub trait SessionScoped: Send + Sync {
    fn name(&self) -> &str;

    async fn clear_session_data(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutOutcome {
    AlreadySignedOut,
    SignedOut {
        user_id: String,
        cleared: usize,
        failed: Vec<String>,
    },
}

impl SignOutOutcome {
    pub fn changed_state(&self) -> bool {
        matches!(self, SignOutOutcome::SignedOut { .. })
    }
}

#[derive(Default)]
pub struct SessionStore {
    current: RwLock<Option<AccountSession>>,
    scoped: RwLock<Vec<Arc<dyn SessionScoped>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing session.
    pub async fn sign_in(&self, session: AccountSession) {
        info!("🔐 Signed in as {} ({})", session.username, session.session_id);
        *self.current.write().await = Some(session);
    }

    pub async fn current(&self) -> Option<AccountSession> {
        self.current.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(AccountSession::is_usable)
    }

    /// Token of a usable session only.
    pub async fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|session| session.is_usable())
            .map(|session| session.access_token.clone())
    }

    pub async fn register_scoped(&self, collaborator: Arc<dyn SessionScoped>) {
        self.scoped.write().await.push(collaborator);
    }

    pub async fn scoped_count(&self) -> usize {
        self.scoped.read().await.len()
    }

    /// Drops the current session and clears every session-scoped collaborator.
    /// Collaborator failures are logged and reported, never propagated.
    pub async fn sign_out(&self) -> SignOutOutcome {
        let Some(mut session) = self.current.write().await.take() else {
            return SignOutOutcome::AlreadySignedOut;
        };
        session.invalidate();

        let scoped: Vec<Arc<dyn SessionScoped>> = self.scoped.read().await.clone();
        let results = join_all(scoped.iter().map(|collaborator| async move {
            (collaborator.name().to_string(), collaborator.clear_session_data().await)
        }))
        .await;

        let mut failed = Vec::new();
        for (name, result) in results {
            if let Err(e) = result {
                warn!("⚠️  Failed to clear session data for {}: {:#}", name, e);
                failed.push(name);
            }
        }

        info!("🔒 Signed out {} ({})", session.username, session.session_id);

        SignOutOutcome::SignedOut {
            user_id: session.user_id,
            cleared: scoped.len() - failed.len(),
            failed,
        }
    }
}
