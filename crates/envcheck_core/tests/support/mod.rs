//! In-memory stand-in for a container.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use envcheck_core::config::PackagesConfig;
use envcheck_core::{
    DatasetSummary, DriverInfo, EngineInfo, Environment, ProbeError, WrapperInfo,
};

#[derive(Debug, Clone, Default)]
pub struct FakeEnvironment {
    /// `None` behaves like a missing `osgeo` module.
    pub engine: Option<EngineInfo>,
    /// `None` behaves like a missing `rasterio` module.
    pub wrapper: Option<WrapperInfo>,
    pub importable: Vec<String>,
    pub wrapper_open: Option<DatasetSummary>,
    pub engine_open: Option<DatasetSummary>,
    /// `None` behaves like a timeout.
    pub fetch: Option<u16>,
    pub calls: RefCell<Vec<String>>,
}

pub fn driver(short: &str, long: &str) -> DriverInfo {
    DriverInfo {
        short_name: short.into(),
        long_name: long.into(),
    }
}

pub fn engine(version: &str, drivers: Vec<DriverInfo>) -> EngineInfo {
    EngineInfo {
        version: version.into(),
        drivers,
    }
}

pub fn wrapper(gdal_version: &str, extensions: &[(&str, &str)]) -> WrapperInfo {
    WrapperInfo {
        version: "1.3.10".into(),
        gdal_version: gdal_version.into(),
        extensions: extensions
            .iter()
            .map(|(ext, drv)| (ext.to_string(), drv.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

pub fn dataset() -> DatasetSummary {
    DatasetSummary {
        width: 25710,
        height: 16677,
        band_count: 1,
        crs: Some("EPSG:4326".into()),
        data_type: Some("uint16".into()),
        driver: Some("EOPFZARR".into()),
    }
}

impl FakeEnvironment {
    /// Everything present and reachable.
    pub fn healthy() -> Self {
        Self {
            engine: Some(engine(
                "3.8.4",
                vec![
                    driver("GTiff", "GeoTIFF"),
                    driver("Zarr", "Zarr"),
                    driver("EOPFZARR", "EOPF Zarr Wrapper Driver"),
                ],
            )),
            wrapper: Some(wrapper("3.8.4", &[("tif", "GTiff"), ("zarr", "Zarr")])),
            importable: PackagesConfig::default().names,
            wrapper_open: Some(dataset()),
            engine_open: Some(dataset()),
            fetch: Some(200),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn without_package(mut self, name: &str) -> Self {
        self.importable.retain(|p| p != name);
        self
    }

    pub fn without_driver(mut self, name: &str) -> Self {
        if let Some(engine) = self.engine.as_mut() {
            engine.drivers.retain(|d| d.short_name != name);
        }
        self
    }

    pub fn offline(mut self) -> Self {
        self.wrapper_open = None;
        self.engine_open = None;
        self.fetch = None;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

fn missing(module: &str) -> ProbeError {
    ProbeError::ImportMissing {
        module: module.into(),
        message: format!("ModuleNotFoundError: No module named '{module}'"),
    }
}

impl Environment for FakeEnvironment {
    fn engine_info(&self) -> Result<EngineInfo, ProbeError> {
        self.record("engine_info");
        self.engine.clone().ok_or_else(|| missing("osgeo"))
    }

    fn wrapper_info(&self) -> Result<WrapperInfo, ProbeError> {
        self.record("wrapper_info");
        self.wrapper.clone().ok_or_else(|| missing("rasterio"))
    }

    fn import_package(&self, name: &str) -> Result<(), ProbeError> {
        self.record(format!("import:{name}"));
        if self.importable.iter().any(|p| p == name) {
            Ok(())
        } else {
            Err(missing(name))
        }
    }

    fn open_with_wrapper(&self, dataset: &str) -> Result<DatasetSummary, ProbeError> {
        self.record(format!("open_with_wrapper:{dataset}"));
        self.wrapper_open.clone().ok_or_else(|| ProbeError::OpenFailure {
            target: dataset.into(),
            message: "RasterioIOError: HTTP response code: 403".into(),
        })
    }

    fn open_with_engine(&self, dataset: &str) -> Result<DatasetSummary, ProbeError> {
        self.record(format!("open_with_engine:{dataset}"));
        self.engine_open.clone().ok_or_else(|| ProbeError::OpenFailure {
            target: dataset.into(),
            message: "RuntimeError: HTTP response code: 403".into(),
        })
    }

    fn fetch_status(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError> {
        self.record(format!("fetch:{url}:{}s", timeout.as_secs()));
        self.fetch.ok_or_else(|| ProbeError::NetworkFailure {
            url: url.into(),
            message: "operation timed out".into(),
        })
    }
}
