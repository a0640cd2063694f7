use std::time::Duration;

use tracing::debug;

use crate::config::{EngineBackend, ValidatorConfig};
use crate::error::ProbeError;
use crate::probe::gdalinfo::GdalInfo;
use crate::probe::python::{self, PythonRunner};
use crate::probe::{DatasetSummary, EngineInfo, Environment, WrapperInfo};

/// The real container: a Python interpreter, optionally `gdalinfo`, and the
/// network.
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
    python: PythonRunner,
    gdalinfo: GdalInfo,
    backend: EngineBackend,
}

impl SystemEnvironment {
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            python: PythonRunner::new(&config.tools.python),
            gdalinfo: GdalInfo::new(&config.tools.gdalinfo),
            backend: config.engine.backend,
        }
    }
}

fn open_failure(target: &str) -> impl FnOnce(String) -> ProbeError + '_ {
    move |message| ProbeError::OpenFailure {
        target: target.to_string(),
        message,
    }
}

impl Environment for SystemEnvironment {
    fn engine_info(&self) -> Result<EngineInfo, ProbeError> {
        match self.backend {
            EngineBackend::Python => self
                .python
                .run_json("osgeo", python::ENGINE_INFO, &[], ProbeError::Malformed)
                .map_err(|e| e.missing_tool_as_import("osgeo")),
            EngineBackend::Gdalinfo => self.gdalinfo.engine_info(),
        }
    }

    fn wrapper_info(&self) -> Result<WrapperInfo, ProbeError> {
        self.python
            .run_json("rasterio", python::WRAPPER_INFO, &[], ProbeError::Malformed)
    }

    fn import_package(&self, name: &str) -> Result<(), ProbeError> {
        self.python
            .run(name, python::IMPORT_PACKAGE, &[name], |message| {
                ProbeError::ImportMissing {
                    module: name.to_string(),
                    message,
                }
            })
            .map(|_| ())
    }

    fn open_with_wrapper(&self, dataset: &str) -> Result<DatasetSummary, ProbeError> {
        self.python.run_json(
            "rasterio",
            python::WRAPPER_OPEN,
            &[dataset],
            open_failure(dataset),
        )
    }

    fn open_with_engine(&self, dataset: &str) -> Result<DatasetSummary, ProbeError> {
        match self.backend {
            EngineBackend::Python => self
                .python
                .run_json("osgeo", python::ENGINE_OPEN, &[dataset], open_failure(dataset))
                .map_err(|e| e.missing_tool_as_import("osgeo")),
            EngineBackend::Gdalinfo => self.gdalinfo.open(dataset),
        }
    }

    fn fetch_status(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError> {
        debug!(target: "envcheck.probe", url, ?timeout, "fetching");
        let network = |e: reqwest::Error| ProbeError::NetworkFailure {
            url: url.to_string(),
            message: e.to_string(),
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(network)?;
        let response = client.get(url).send().map_err(network)?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_interpreter_is_a_launch_error() {
        let mut config = ValidatorConfig::default();
        config.tools.python = "/nonexistent/envcheck/python3".into();
        let env = SystemEnvironment::from_config(&config);
        let err = env.import_package("numpy").unwrap_err();
        assert!(matches!(err, ProbeError::Launch { .. }), "{err}");
    }

    #[test]
    fn missing_interpreter_reads_as_unloaded_engine() {
        let mut config = ValidatorConfig::default();
        config.tools.python = "/nonexistent/envcheck/python3".into();
        let env = SystemEnvironment::from_config(&config);
        let err = env.engine_info().unwrap_err();
        assert!(err.is_import_missing(), "{err}");
        assert!(matches!(&err, ProbeError::ImportMissing { module, .. } if module == "osgeo"));
        let err = env.open_with_engine("EOPFZARR:\"/vsicurl/x\"").unwrap_err();
        assert!(err.is_import_missing(), "{err}");
    }

    #[test]
    fn malformed_url_is_a_network_failure() {
        let env = SystemEnvironment::from_config(&ValidatorConfig::default());
        let err = env
            .fetch_status("not a url", Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, ProbeError::NetworkFailure { .. }), "{err}");
    }
}
