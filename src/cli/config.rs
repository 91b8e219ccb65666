use std::path::PathBuf;

use crate::cli::ConfigCommands;
use crate::error::{Result, SalescopeError};
use crate::logging::log_file_path;
use crate::settings::{load_settings, save_settings, shellexpand_path, Settings};

pub fn run(command: ConfigCommands) -> Result<()> {
    let mut settings = load_settings();
    match command {
        ConfigCommands::Show => {
            println!("{}", format_settings(&settings)?);
            println!("Log file: {}", log_file_path().display());
            return Ok(());
        }
        ConfigCommands::SetDataset { path } => {
            let resolved = PathBuf::from(shellexpand_path(&path));
            if !resolved.exists() {
                return Err(SalescopeError::Settings(format!(
                    "No file found at {}",
                    resolved.display()
                )));
            }
            settings.dataset_path = Some(resolved.to_string_lossy().to_string());
            println!("Dataset set to {}", resolved.display());
        }
        ConfigCommands::SetSheet { name } => {
            println!("Worksheet set to {name}");
            settings.sheet = Some(name);
        }
        ConfigCommands::SetTop { count } => {
            if count == 0 {
                return Err(SalescopeError::Settings(
                    "Top customer count must be at least 1".to_string(),
                ));
            }
            settings.top_customers = count;
            println!("Top customers set to {count}");
        }
    }
    save_settings(&settings)?;
    tracing::info!("settings saved");
    Ok(())
}

pub fn format_settings(settings: &Settings) -> Result<String> {
    serde_json::to_string_pretty(settings).map_err(|e| SalescopeError::Settings(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_settings_includes_columns() {
        let s = format_settings(&Settings::default()).unwrap();
        assert!(s.contains("\"top_customers\": 5"));
        assert!(s.contains("\"order_date\": \"Order Date\""));
    }
}
