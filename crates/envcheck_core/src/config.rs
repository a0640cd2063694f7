use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "envcheck.toml";
pub const REMOTE_URL_ENV: &str = "ENVCHECK_REMOTE_URL";

const DEFAULT_REMOTE_URL: &str = "https://storage.sbg.cloud.ovh.net/v1/AUTH_8471d76cdd494d98a078f28b195dace4/sentinel-1-public/demo_product/grd/S01SIWGRH_20240201T164915_0025_A146_S000_5464A_VH.zarr";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ValidatorConfig {
    pub title: String,
    pub checks: CheckToggles,
    pub engine: EngineConfig,
    pub tools: ToolsConfig,
    pub driver: DriverConfig,
    pub packages: PackagesConfig,
    pub remote: RemoteConfig,
    pub report: Option<ReportConfig>,
    pub telemetry: Option<TelemetryConfig>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            title: "EOPF-Zarr Container Validation".into(),
            checks: CheckToggles::default(),
            engine: EngineConfig::default(),
            tools: ToolsConfig::default(),
            driver: DriverConfig::default(),
            packages: PackagesConfig::default(),
            remote: RemoteConfig::default(),
            report: None,
            telemetry: None,
        }
    }
}

impl ValidatorConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: ValidatorConfig = toml::from_str(&data)
            .with_context(|| format!("invalid config {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.packages.min_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            anyhow::bail!("packages.min_ratio must be within 0.0..=1.0, got {ratio}");
        }
        Ok(())
    }

    /// Explicit path first, then `./envcheck.toml`, then built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let mut cfg = match explicit {
            Some(path) => Self::from_path(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::from_path(local)?
                } else {
                    Self::default()
                }
            }
        };
        if let Ok(url) = std::env::var(REMOTE_URL_ENV) {
            cfg.apply_remote_url(url);
        }
        Ok(cfg)
    }

    pub fn apply_remote_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if !trimmed.is_empty() {
            self.remote.url = trimmed.to_string();
        }
    }

    pub fn trace_filter(&self) -> Option<&str> {
        self.telemetry.as_ref()?.trace_filter.as_deref()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CheckToggles {
    pub engine: bool,
    pub driver: bool,
    pub bindings: bool,
    pub packages: bool,
    pub remote: bool,
}

impl Default for CheckToggles {
    fn default() -> Self {
        Self {
            engine: true,
            driver: true,
            bindings: true,
            packages: true,
            remote: true,
        }
    }
}

impl CheckToggles {
    pub fn enabled(&self, id: &str) -> bool {
        match id {
            "engine" => self.engine,
            "driver" => self.driver,
            "bindings" => self.bindings,
            "packages" => self.packages,
            "remote" => self.remote,
            _ => true,
        }
    }
}

/// How engine facts are gathered: through the Python bindings or the
/// `gdalinfo` utility.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    #[default]
    Python,
    Gdalinfo,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: EngineBackend,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub python: PathBuf,
    pub gdalinfo: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            gdalinfo: PathBuf::from("gdalinfo"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DriverConfig {
    pub name: String,
    pub required: bool,
    pub family_keyword: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: "EOPFZARR".into(),
            required: false,
            family_keyword: "zarr".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PackagesConfig {
    pub names: Vec<String>,
    pub min_ratio: f64,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        let names = [
            "numpy",
            "scipy",
            "pandas",
            "matplotlib",
            "xarray",
            "zarr",
            "dask",
            "geopandas",
            "rasterio",
            "fiona",
            "jupyter",
            "jupyterlab",
        ];
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            min_ratio: 0.8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub metadata_key: String,
    pub fetch_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REMOTE_URL.into(),
            metadata_key: ".zarray".into(),
            fetch_timeout_secs: 5,
        }
    }
}

impl RemoteConfig {
    /// Dataset name handed to the driver, e.g. `EOPFZARR:"/vsicurl/https://..."`.
    pub fn dataset_path(&self, driver: &str) -> String {
        format!("{driver}:\"/vsicurl/{}\"", self.url)
    }

    pub fn metadata_url(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.metadata_key.trim_start_matches('/')
        )
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub trace_filter: Option<String>,
}
