//! Run Configuration Module
//!
//! Provides the evaluation run configuration loaded from TOML files, so file
//! locations, Paris-law constants and plot bounds are operator-tunable.
//!
//! ## Loading Order
//!
//! 1. `CRACK_RNN_CONFIG` environment variable (path to TOML file)
//! 2. `crack_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! A source that is named or present but fails to load aborts the run.
//!
//! ## Usage
//!
//! ```ignore
//! let config = RunConfig::load()?;
//! let a0 = config.model.initial_crack_length;
//! ```

mod run_config;
pub mod defaults;
pub mod validation;

pub use run_config::*;
