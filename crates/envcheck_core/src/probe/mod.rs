//! Capability probing.
//!
//! Every question a check asks about the container goes through the
//! [`Environment`] trait. [`SystemEnvironment`] answers by launching the
//! Python interpreter or `gdalinfo` and by issuing HTTP requests.

mod gdalinfo;
mod python;
mod system;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProbeError;

pub use system::SystemEnvironment;

/// A format driver as listed by the engine's registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverInfo {
    pub short_name: String,
    pub long_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineInfo {
    pub version: String,
    pub drivers: Vec<DriverInfo>,
}

impl EngineInfo {
    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// Registry lookup by short name, case-insensitive like GDAL's.
    pub fn driver(&self, name: &str) -> Option<&DriverInfo> {
        self.drivers
            .iter()
            .find(|d| d.short_name.eq_ignore_ascii_case(name))
    }
}

/// What the high-level wrapper reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WrapperInfo {
    pub version: String,
    /// GDAL release the wrapper was built against.
    pub gdal_version: String,
    /// File extension to driver short name.
    pub extensions: BTreeMap<String, String>,
}

impl WrapperInfo {
    /// Entries whose extension or driver name contains `keyword`.
    pub fn extensions_matching(&self, keyword: &str) -> BTreeMap<&str, &str> {
        let keyword = keyword.to_lowercase();
        self.extensions
            .iter()
            .filter(|(ext, driver)| {
                ext.to_lowercase().contains(&keyword) || driver.to_lowercase().contains(&keyword)
            })
            .map(|(ext, driver)| (ext.as_str(), driver.as_str()))
            .collect()
    }
}

/// Shape and layout of an opened dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DatasetSummary {
    pub width: u64,
    pub height: u64,
    pub band_count: u64,
    #[serde(default)]
    pub crs: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
}

pub trait Environment {
    /// Load the engine and enumerate its registered drivers.
    fn engine_info(&self) -> Result<EngineInfo, ProbeError>;

    fn wrapper_info(&self) -> Result<WrapperInfo, ProbeError>;

    /// Try to import a Python package by module name.
    fn import_package(&self, name: &str) -> Result<(), ProbeError>;

    fn open_with_wrapper(&self, dataset: &str) -> Result<DatasetSummary, ProbeError>;

    fn open_with_engine(&self, dataset: &str) -> Result<DatasetSummary, ProbeError>;

    /// Plain HTTP GET; returns the response status code.
    fn fetch_status(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError>;
}
