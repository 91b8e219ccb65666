use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregates::DEFAULT_TOP_CUSTOMERS;
use crate::error::{Result, SalescopeError};

/// Header names the loader looks for in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub order_date: String,
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub segment: String,
    pub customer_id: String,
    pub customer_name: String,
    pub order_id: String,
    pub sales: String,
    pub profit: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            order_date: "Order Date".to_string(),
            region: "Region".to_string(),
            state: "State".to_string(),
            city: "City".to_string(),
            category: "Category".to_string(),
            segment: "Segment".to_string(),
            customer_id: "Customer ID".to_string(),
            customer_name: "Customer Name".to_string(),
            order_id: "Order ID".to_string(),
            sales: "Sales".to_string(),
            profit: "Profit".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dataset_path: Option<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_top_customers")]
    pub top_customers: usize,
    #[serde(default)]
    pub columns: ColumnMap,
}

fn default_top_customers() -> usize {
    DEFAULT_TOP_CUSTOMERS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_path: None,
            sheet: None,
            top_customers: default_top_customers(),
            columns: ColumnMap::default(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("salescope")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("ignoring unreadable settings at {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SalescopeError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
