use crate::error::{CallCenterError, Result};
use crate::model::fields;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 2000;
const DEFAULT_RETRY_COUNT: u32 = 1;

/// Configuration for the call center, stored in `<data-dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallCenterConfig {
    /// Records per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before an interactive search runs
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Extra attempts for reads that fail with a store error
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    #[serde(default = "default_search_fields")]
    pub ticket_search_fields: Vec<String>,

    #[serde(default = "default_search_fields")]
    pub invoice_search_fields: Vec<String>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_search_debounce_ms() -> u64 {
    DEFAULT_SEARCH_DEBOUNCE_MS
}

fn default_retry_count() -> u32 {
    DEFAULT_RETRY_COUNT
}

fn default_search_fields() -> Vec<String> {
    vec![fields::TICKET_NUMBER.to_string(), fields::ADDRESS.to_string()]
}

impl Default for CallCenterConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            retry_count: DEFAULT_RETRY_COUNT,
            ticket_search_fields: default_search_fields(),
            invoice_search_fields: default_search_fields(),
        }
    }
}

fn parse_fields(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl CallCenterConfig {
    pub const KEYS: [&'static str; 5] = [
        "page-size",
        "search-debounce-ms",
        "retry-count",
        "ticket-search-fields",
        "invoice-search-fields",
    ];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(CallCenterError::Io)?;
        let config: CallCenterConfig =
            serde_json::from_str(&content).map_err(CallCenterError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(CallCenterError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(CallCenterError::Serialization)?;
        fs::write(config_path, content).map_err(CallCenterError::Io)?;
        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Display value of a config key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "page-size" => Some(self.page_size.to_string()),
            "search-debounce-ms" => Some(self.search_debounce_ms.to_string()),
            "retry-count" => Some(self.retry_count.to_string()),
            "ticket-search-fields" => Some(self.ticket_search_fields.join(",")),
            "invoice-search-fields" => Some(self.invoice_search_fields.join(",")),
            _ => None,
        }
    }

    /// Set a config key from its display form.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let value = value.trim();
        match key {
            "page-size" => match value.parse::<usize>() {
                Ok(n) if n > 0 => self.page_size = n,
                _ => return Err(format!("Invalid page size: {}", value)),
            },
            "search-debounce-ms" => {
                self.search_debounce_ms = value
                    .parse()
                    .map_err(|_| format!("Invalid debounce: {}", value))?
            }
            "retry-count" => {
                self.retry_count = value
                    .parse()
                    .map_err(|_| format!("Invalid retry count: {}", value))?
            }
            "ticket-search-fields" | "invoice-search-fields" => {
                let parsed = parse_fields(value);
                if parsed.is_empty() {
                    return Err("At least one search field is required".to_string());
                }
                if key == "ticket-search-fields" {
                    self.ticket_search_fields = parsed;
                } else {
                    self.invoice_search_fields = parsed;
                }
            }
            other => return Err(format!("Unknown config key: {}", other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = CallCenterConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.search_debounce(), Duration::from_millis(2000));
        assert_eq!(config.retry_count, 1);
        assert_eq!(config.ticket_search_fields, vec!["TicketNumber", "Address"]);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempdir().unwrap();
        let config = CallCenterConfig::load(dir.path().join("absent")).unwrap();
        assert_eq!(config, CallCenterConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"page_size": 25}"#).unwrap();
        let config = CallCenterConfig::load(dir.path()).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.retry_count, 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut config = CallCenterConfig::default();
        config.set("invoice-search-fields", "TicketNumber, CustomerName").unwrap();
        config.save(dir.path()).unwrap();

        let loaded = CallCenterConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.invoice_search_fields, vec!["TicketNumber", "CustomerName"]);
        assert_eq!(
            loaded.get("invoice-search-fields").as_deref(),
            Some("TicketNumber,CustomerName")
        );
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = CallCenterConfig::default();
        assert!(config.set("page-size", "0").is_err());
        assert!(config.set("retry-count", "many").is_err());
        assert!(config.set("ticket-search-fields", " , ").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert_eq!(config, CallCenterConfig::default());
    }
}
