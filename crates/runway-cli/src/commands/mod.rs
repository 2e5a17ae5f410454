//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `input` - Shared utilities (load_config, load_snapshot, JSON output)
//! - `project` - Day-by-day balance projection
//! - `forecast` - Month-end and multi-month forecast
//! - `risk` - Risk score and stress level
//! - `recommend` - Budget and spending recommendations
//! - `whatif` - Hypothetical purchase simulation
//! - `config` - Engine configuration
//! - `serve` - Web server command

pub mod config;
pub mod forecast;
pub mod input;
pub mod project;
pub mod recommend;
pub mod risk;
pub mod serve;
pub mod whatif;

// Re-export command functions for main.rs
pub use config::*;
pub use forecast::*;
pub use input::*;
pub use project::*;
pub use recommend::*;
pub use risk::*;
pub use serve::*;
pub use whatif::*;

/// Thin section rule used under report headers
pub const RULE: &str = "   ─────────────────────────────────────────────────────────────";
