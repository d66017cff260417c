//! Dashboard configuration as TOML.
//!
//! Every section implements `Default` with the built-in constants, so a
//! missing file behaves exactly like an empty one.

use crate::errors::ConfigError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "FARMDASH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "farmdash.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub reports: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Crop name -> source file.
    pub sources: BTreeMap<String, PathBuf>,
    /// Field delimiter of the source files. Use "\t" for tab-separated sheet exports.
    pub delimiter: char,
    /// Region the source files describe.
    pub base_region: String,
    /// Region synthesized from the base region. Not backed by real data.
    pub synthetic_region: String,
    pub synthetic_discount_pct: f64,
    pub cache_ttl_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert("Corn".to_string(), PathBuf::from("data/corn.csv"));
        sources.insert("Soybeans".to_string(), PathBuf::from("data/soybeans.csv"));
        sources.insert("Wheat".to_string(), PathBuf::from("data/wheat.csv"));
        DataConfig {
            sources,
            delimiter: ',',
            base_region: "Midwest".to_string(),
            synthetic_region: "Great Plains".to_string(),
            synthetic_discount_pct: 5.0,
            cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub default_acres: f64,
    pub sensitivity_ladder: Vec<f64>,
    /// Crop name -> direct-cost items worth running the sensitivity ladder on.
    pub key_items: BTreeMap<String, Vec<String>>,
    /// Profit per acre below which margins are reported as thin.
    pub thin_margin_threshold: f64,
    pub baseline_scenario: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let items = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut key_items = BTreeMap::new();
        key_items.insert("Corn".to_string(), items(&["Seed", "Fertilizer", "Chemical"]));
        key_items.insert("Soybeans".to_string(), items(&["Seed", "Chemical"]));
        key_items.insert("Wheat".to_string(), items(&["Seed", "Fertilizer"]));
        AnalysisConfig {
            default_acres: 100.0,
            sensitivity_ladder: vec![1.0, 5.0, 10.0, 15.0, 20.0],
            key_items,
            thin_margin_threshold: 50.0,
            baseline_scenario: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn key_items_for(&self, crop: &str) -> Option<&[String]> {
        self.key_items
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(crop))
            .map(|(_, items)| items.as_slice())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    /// Optional template for the rendered report; the built-in one is used when unset.
    pub template: Option<PathBuf>,
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            output_dir: PathBuf::from("reports"),
            template: None,
            preview_rows: 15,
        }
    }
}

impl DashboardConfig {
    /// Load configuration, searching:
    /// 1. `$FARMDASH_CONFIG`
    /// 2. `./farmdash.toml`
    /// 3. built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!("loaded config from {}", p.display());
                        return config;
                    }
                    Err(e) => warn!("{}; falling back", e),
                }
            } else {
                warn!("{} points to missing file {}, falling back", CONFIG_ENV_VAR, path);
            }
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!("loaded config from ./{}", DEFAULT_CONFIG_FILE);
                    return config;
                }
                Err(e) => warn!("{}; using defaults", e),
            }
        }

        info!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn source_for(&self, crop: &str) -> Option<&Path> {
        self.data
            .sources
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(crop))
            .map(|(_, p)| p.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_matches_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();
        assert_eq!(config.data.base_region, "Midwest");
        assert_eq!(config.data.synthetic_region, "Great Plains");
        assert_eq!(config.data.synthetic_discount_pct, 5.0);
        assert_eq!(config.analysis.sensitivity_ladder, vec![1.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(config.analysis.thin_margin_threshold, 50.0);
        assert!(config.reports.template.is_none());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [data]
            base_region = "Corn Belt"
            delimiter = "\t"

            [analysis.key_items]
            Barley = ["Seed"]
            "#,
        )
        .unwrap();
        assert_eq!(config.data.base_region, "Corn Belt");
        assert_eq!(config.data.delimiter, '\t');
        assert_eq!(config.data.cache_ttl_secs, 300);
        assert_eq!(config.analysis.key_items_for("barley"), Some(&["Seed".to_string()][..]));
        assert!(config.analysis.key_items_for("Corn").is_none());
        assert_eq!(config.analysis.default_acres, 100.0);
    }

    #[test]
    fn test_source_lookup_is_case_insensitive() {
        let config = DashboardConfig::default();
        assert_eq!(config.source_for("wheat"), Some(Path::new("data/wheat.csv")));
        assert!(config.source_for("Barley").is_none());
    }

    #[test]
    fn test_load_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("farmdash.toml");
        assert!(matches!(
            DashboardConfig::load_from_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        std::fs::write(&missing, "[analysis]\ndefault_acres = \"lots\"\n").unwrap();
        assert!(matches!(
            DashboardConfig::load_from_file(&missing),
            Err(ConfigError::Parse { .. })
        ));

        std::fs::write(&missing, "[reports]\npreview_rows = 5\n").unwrap();
        let config = DashboardConfig::load_from_file(&missing).unwrap();
        assert_eq!(config.reports.preview_rows, 5);
    }
}
