//! HTTP request handlers organized by domain
//!
//! - `system` - health and configuration
//! - `engine` - snapshot in, derived results out

pub mod engine;
pub mod system;

// Re-export all handlers for use in router
pub use engine::*;
pub use system::*;
