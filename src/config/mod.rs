//! Configuration module
//!
//! Handles loading settings from YAML files and environment variables.
//! Settings are built once in `main` and handed to each component that needs them.

mod settings;

pub use settings::*;
