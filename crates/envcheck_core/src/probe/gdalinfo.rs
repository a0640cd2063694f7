use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::ProbeError;
use crate::probe::python::last_error_line;
use crate::probe::{DatasetSummary, DriverInfo, EngineInfo};

/// Engine probing through the `gdalinfo` utility instead of the bindings.
#[derive(Debug, Clone)]
pub(crate) struct GdalInfo {
    program: PathBuf,
}

impl GdalInfo {
    pub(crate) fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub(crate) fn engine_info(&self) -> Result<EngineInfo, ProbeError> {
        let version = self.run(&["--version"]).map_err(|e| e.missing_tool_as_import("gdal"))?;
        let formats = self.run(&["--formats"]).map_err(|e| e.missing_tool_as_import("gdal"))?;
        Ok(EngineInfo {
            version: parse_version(&version)?,
            drivers: parse_formats(&formats),
        })
    }

    pub(crate) fn open(&self, dataset: &str) -> Result<DatasetSummary, ProbeError> {
        let stdout = self.run(&["-json", dataset]).map_err(|e| match e {
            ProbeError::Malformed(message) => ProbeError::OpenFailure {
                target: dataset.to_string(),
                message,
            },
            other => other,
        })?;
        parse_info_json(&stdout)
    }

    /// Non-zero exits come back as `Malformed` carrying the last stderr line;
    /// callers re-tag them.
    fn run(&self, args: &[&str]) -> Result<String, ProbeError> {
        debug!(target: "envcheck.probe", program = %self.program.display(), ?args, "running gdalinfo");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| ProbeError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ProbeError::Malformed(
            last_error_line(&stderr).unwrap_or_else(|| format!("exited with {}", output.status)),
        ))
    }
}

/// `GDAL 3.8.4, released 2024/02/08` -> `3.8.4`
pub(crate) fn parse_version(output: &str) -> Result<String, ProbeError> {
    let line = output.lines().next().unwrap_or_default().trim();
    line.strip_prefix("GDAL ")
        .and_then(|rest| rest.split([',', ' ']).next())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProbeError::Malformed(format!("unrecognised version line `{line}`")))
}

/// Parses the `Supported Formats:` listing, one driver per line:
/// `  GTiff -raster- (rw+vs): GeoTIFF (*.tif, *.tiff)`.
///
/// `gdalinfo --formats` lists raster drivers only, so the count is lower
/// than `GetDriverCount()` from the bindings, which includes vector drivers.
pub(crate) fn parse_formats(output: &str) -> Vec<DriverInfo> {
    output
        .lines()
        .filter(|line| line.starts_with(' ') || line.starts_with('\t'))
        .filter_map(|line| {
            let line = line.trim();
            let (short_name, rest) = line.split_once(' ')?;
            let long_name = rest.split_once("): ").map(|(_, long)| long)?;
            Some(DriverInfo {
                short_name: short_name.to_string(),
                long_name: strip_extension_list(long_name.trim()).to_string(),
            })
        })
        .collect()
}

/// Newer releases append the extensions: `GeoTIFF (*.tif, *.tiff)`.
fn strip_extension_list(long_name: &str) -> &str {
    match long_name.rfind(" (") {
        Some(idx) if long_name.ends_with(')') && long_name[idx..].contains("*.") => {
            long_name[..idx].trim_end()
        }
        _ => long_name,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoJson {
    #[serde(default)]
    driver_short_name: Option<String>,
    #[serde(default)]
    size: Vec<u64>,
    #[serde(default)]
    bands: Vec<BandJson>,
    #[serde(default)]
    coordinate_system: Option<CoordinateSystemJson>,
}

#[derive(Debug, Deserialize)]
struct BandJson {
    #[serde(default, rename = "type")]
    data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoordinateSystemJson {
    #[serde(default)]
    wkt: String,
}

pub(crate) fn parse_info_json(output: &str) -> Result<DatasetSummary, ProbeError> {
    let info: InfoJson =
        serde_json::from_str(output).map_err(|e| ProbeError::Malformed(e.to_string()))?;
    let (width, height) = match info.size.as_slice() {
        [w, h, ..] => (*w, *h),
        _ => (0, 0),
    };
    Ok(DatasetSummary {
        width,
        height,
        band_count: info.bands.len() as u64,
        crs: info
            .coordinate_system
            .and_then(|cs| crs_name(&cs.wkt).map(str::to_string)),
        data_type: info.bands.first().and_then(|b| b.data_type.clone()),
        driver: info.driver_short_name,
    })
}

/// First quoted name of a WKT definition, e.g. `WGS 84 / UTM zone 32N`.
fn crs_name(wkt: &str) -> Option<&str> {
    let start = wkt.find("[\"")? + 2;
    let len = wkt[start..].find('"')?;
    Some(&wkt[start..start + len]).filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: &str = "Supported Formats: (ro:read-only, rw:read-write, +:update, v:virtual-I/O s:subdatasets)
  VRT -raster,multidimensional raster- (rw+v): Virtual Raster
  GTiff -raster- (rw+vs): GeoTIFF
  Zarr -raster,multidimensional raster- (rw+vs): Zarr
  EOPFZARR -raster- (rovs): EOPF Zarr Wrapper Driver
";

    #[test]
    fn formats_listing_yields_one_driver_per_line() {
        let drivers = parse_formats(FORMATS);
        assert_eq!(drivers.len(), 4);
        assert_eq!(drivers[1].short_name, "GTiff");
        assert_eq!(drivers[1].long_name, "GeoTIFF");
        assert_eq!(drivers[3].short_name, "EOPFZARR");
        assert_eq!(drivers[3].long_name, "EOPF Zarr Wrapper Driver");
    }

    #[test]
    fn extension_suffix_is_dropped_from_long_name() {
        let listing = "Supported Formats:
  GTiff -raster- (rw+uvs): GeoTIFF (*.tif, *.tiff)
  netCDF -raster,multidimensional raster,vector- (rw+vs): Network Common Data Format (*.nc)
  PCIDSK -raster,vector- (rw+uv): PCIDSK Database File (*.pix)
  USGSDEM -raster- (rov): USGS Optional ASCII DEM (and CDED) (*.dem)
  MEM -raster,multidimensional raster- (rw+): In Memory raster (legacy)
";
        let drivers = parse_formats(listing);
        let names: Vec<_> = drivers.iter().map(|d| d.long_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "GeoTIFF",
                "Network Common Data Format",
                "PCIDSK Database File",
                "USGS Optional ASCII DEM (and CDED)",
                "In Memory raster (legacy)",
            ]
        );
    }

    #[test]
    fn version_line_is_reduced_to_release() {
        assert_eq!(
            parse_version("GDAL 3.8.4, released 2024/02/08\n").unwrap(),
            "3.8.4"
        );
        assert!(matches!(
            parse_version("gdalinfo: command failed"),
            Err(ProbeError::Malformed(_))
        ));
    }

    #[test]
    fn info_json_maps_to_summary() {
        let json = r#"{
            "description": "EOPFZARR:\"/vsicurl/https://example.org/a.zarr\"",
            "driverShortName": "EOPFZARR",
            "size": [25710, 16677],
            "coordinateSystem": {"wkt": "GEOGCRS[\"WGS 84\",DATUM[\"World Geodetic System 1984\"]]"},
            "bands": [{"band": 1, "type": "UInt16"}, {"band": 2, "type": "UInt16"}]
        }"#;
        let summary = parse_info_json(json).unwrap();
        assert_eq!((summary.width, summary.height), (25710, 16677));
        assert_eq!(summary.band_count, 2);
        assert_eq!(summary.crs.as_deref(), Some("WGS 84"));
        assert_eq!(summary.data_type.as_deref(), Some("UInt16"));
        assert_eq!(summary.driver.as_deref(), Some("EOPFZARR"));
    }

    #[test]
    fn info_json_without_georeferencing() {
        let summary = parse_info_json(r#"{"size": [4, 4], "bands": []}"#).unwrap();
        assert_eq!(summary.band_count, 0);
        assert!(summary.crs.is_none());
        assert!(summary.data_type.is_none());
    }

    #[test]
    fn missing_binary_reads_as_unloaded_engine() {
        let probe = GdalInfo::new("/nonexistent/envcheck/gdalinfo");
        let err = probe.engine_info().unwrap_err();
        assert!(err.is_import_missing(), "{err}");
    }
}
