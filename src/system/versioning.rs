// Re-export versioning modules
pub mod versioning_system;

pub use versioning_system::*;
