/// Database configuration and connection management
pub mod database;

/// Tracing subscriber setup
pub mod logging;

/// Application settings loaded from keydist.toml and the environment
pub mod settings;
