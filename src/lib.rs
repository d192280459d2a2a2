//! Process-wide context for the blogging client: the facilities every other
//! component expects to exist before it runs (request queue, image loader,
//! localized context, versioned REST clients, user agent, session).

pub mod domains;
pub mod media;
pub mod network;
pub mod shared;
pub mod system;

#[cfg(test)]
mod test_utils;

pub use shared::global::{ProcessCell, GlobalStateError};
pub use shared::lifecycle::LifecycleEvent;
pub use shared::state::ProcessState;
pub use system::config::AppConfig;
