//! Atlas Common Library
//!
//! Shared logging setup for the Atlas workspace members.
//!
//! # Example
//!
//! ```no_run
//! use atlas_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod logging;
