// Re-export locale modules
pub mod locale_system;
pub mod extractor;
pub mod loader;
pub mod context;

pub use locale_system::*;
pub use extractor::*;
pub use loader::*;
pub use context::*;
