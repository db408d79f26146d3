// src/utils/env.rs - Environment loading helpers
use anyhow::{Context, Result};
use log::{debug, info};
use std::env;

/// Load variables from a .env file if one is present. Missing files are fine;
/// real environments often configure through the process environment only.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(_) => debug!("No .env file found, using process environment"),
    }
}

/// Fetch a required environment variable with a readable error.
pub fn required_var(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{} environment variable not set", name))
}

/// Fetch an optional environment variable with a default.
pub fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
