#![warn(missing_docs)]
//! # palm-lens-app binary
//!
//! Shell entry point for palm-lens.

use palm_lens_app::run_log::RunLogger;
use palm_lens_app::{app_version, offline_cache_enabled_from_env};

/// CLI entry point.
fn main() {
    println!("palm-lens-app {}", app_version());
    println!(
        "offline_cache_enabled={} (PALM_LENS_OFFLINE_CACHE)",
        offline_cache_enabled_from_env()
    );

    match RunLogger::new() {
        Ok(logger) => {
            logger.write_line("INFO", "startup", "launch", app_version());
            println!("run log: {}", logger.path().display());
        }
        Err(error) => eprintln!("run logging disabled: {error}"),
    }
}
