//! nutriadmin core - shared errors, configuration and logging
//!
//! Everything the session, client and form crates agree on lives here.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
