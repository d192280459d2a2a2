pub mod global;
pub mod lifecycle;
pub mod state;
pub mod user_agent;
