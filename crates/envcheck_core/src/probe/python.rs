use std::path::PathBuf;
use std::process::Command;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ProbeError;

pub(crate) const ENGINE_INFO: &str = r#"
import json
from osgeo import gdal
gdal.AllRegister()
drivers = []
for i in range(gdal.GetDriverCount()):
    d = gdal.GetDriver(i)
    drivers.append({"short_name": d.ShortName, "long_name": d.LongName})
print(json.dumps({"version": gdal.VersionInfo("RELEASE_NAME"), "drivers": drivers}))
"#;

pub(crate) const WRAPPER_INFO: &str = r#"
import json
import rasterio
from rasterio.drivers import raster_driver_extensions
with rasterio.env.Env():
    extensions = raster_driver_extensions()
print(json.dumps({
    "version": rasterio.__version__,
    "gdal_version": rasterio.__gdal_version__,
    "extensions": extensions,
}))
"#;

pub(crate) const IMPORT_PACKAGE: &str = r#"
import importlib, sys
importlib.import_module(sys.argv[1])
"#;

pub(crate) const WRAPPER_OPEN: &str = r#"
import json, sys
import rasterio
with rasterio.open(sys.argv[1]) as ds:
    print(json.dumps({
        "width": ds.width,
        "height": ds.height,
        "band_count": ds.count,
        "crs": str(ds.crs) if ds.crs else None,
        "data_type": ds.dtypes[0] if ds.count > 0 else None,
        "driver": ds.driver,
    }))
"#;

pub(crate) const ENGINE_OPEN: &str = r#"
import json, sys
from osgeo import gdal
gdal.UseExceptions()
ds = gdal.Open(sys.argv[1])
if ds is None:
    sys.exit("gdal.Open returned no dataset")
print(json.dumps({
    "width": ds.RasterXSize,
    "height": ds.RasterYSize,
    "band_count": ds.RasterCount,
    "driver": ds.GetDriver().ShortName,
}))
"#;

/// Runs short scripts in the container's interpreter.
#[derive(Debug, Clone)]
pub(crate) struct PythonRunner {
    program: PathBuf,
}

impl PythonRunner {
    pub(crate) fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs `snippet` and returns its stdout. Import errors become
    /// `ImportMissing` for `module`; other failures go through `on_failure`
    /// with the last stderr line.
    pub(crate) fn run(
        &self,
        module: &str,
        snippet: &str,
        args: &[&str],
        on_failure: impl FnOnce(String) -> ProbeError,
    ) -> Result<String, ProbeError> {
        debug!(target: "envcheck.probe", program = %self.program.display(), module, "running python probe");
        let output = Command::new(&self.program)
            .arg("-c")
            .arg(snippet)
            .args(args)
            .output()
            .map_err(|source| ProbeError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = last_error_line(&stderr)
            .unwrap_or_else(|| format!("exited with {}", output.status));
        if is_import_error(&message) {
            return Err(ProbeError::ImportMissing {
                module: missing_module(&message).unwrap_or_else(|| module.to_string()),
                message,
            });
        }
        Err(on_failure(message))
    }

    pub(crate) fn run_json<T: DeserializeOwned>(
        &self,
        module: &str,
        snippet: &str,
        args: &[&str],
        on_failure: impl FnOnce(String) -> ProbeError,
    ) -> Result<T, ProbeError> {
        let stdout = self.run(module, snippet, args, on_failure)?;
        parse_last_json_line(&stdout)
    }
}

/// Libraries may chatter on stdout before the probe prints; the payload is
/// always the last non-empty line.
pub(crate) fn parse_last_json_line<T: DeserializeOwned>(stdout: &str) -> Result<T, ProbeError> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| ProbeError::Malformed("probe printed nothing".into()))?;
    serde_json::from_str(line.trim()).map_err(|e| ProbeError::Malformed(e.to_string()))
}

pub(crate) fn last_error_line(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

fn is_import_error(line: &str) -> bool {
    line.starts_with("ModuleNotFoundError") || line.starts_with("ImportError")
}

/// Extracts `x` from `ModuleNotFoundError: No module named 'x'`.
pub(crate) fn missing_module(line: &str) -> Option<String> {
    let rest = line.split("No module named ").nth(1)?;
    let name = rest.trim().trim_matches(|c| c == '\'' || c == '"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
