//! Init and config commands.

use std::path::PathBuf;

use crate::io::ExitCode;
use crate::Settings;

pub fn run_init(force: bool) -> ExitCode {
    let config_path = PathBuf::from(".roam/settings.toml");

    if config_path.exists() && !force {
        eprintln!("Configuration file already exists at: {}", config_path.display());
        eprintln!("Use --force to overwrite");
        return ExitCode::Error;
    }

    match Settings::default().save(&config_path) {
        Ok(()) => {
            println!("Created configuration file at: {}", config_path.display());
            println!("Edit this file to customize your settings.");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::Error
        }
    }
}

pub fn run_config(config: &Settings) -> ExitCode {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    match toml::to_string_pretty(config) {
        Ok(toml_str) => {
            println!("{toml_str}");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error displaying config: {e}");
            ExitCode::Error
        }
    }
}
