pub mod session;
pub mod session_store;

// Re-export for easier access
pub use session::AccountSession;
pub use session_store::{SessionScoped, SessionStore, SignOutOutcome};
