//! The container checks, in the order they run.

use tracing::{info, warn};

use crate::config::{CheckToggles, ValidatorConfig};
use crate::error::ProbeError;
use crate::probe::Environment;
use crate::report::{CheckStatus, Finding, FindingLevel};

const URL_PREVIEW_CHARS: usize = 80;
const ERROR_PREVIEW_CHARS: usize = 100;

pub struct CheckContext<'a> {
    pub env: &'a dyn Environment,
    pub config: &'a ValidatorConfig,
}

/// A named probe. Procedures never return errors: every failure is folded
/// into the outcome.
#[derive(Clone, Copy)]
pub struct Check {
    pub id: &'static str,
    pub name: &'static str,
    pub procedure: fn(&CheckContext<'_>) -> CheckOutcome,
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub findings: Vec<Finding>,
}

impl Default for CheckOutcome {
    fn default() -> Self {
        Self {
            status: CheckStatus::Pass,
            findings: Vec::new(),
        }
    }
}

impl CheckOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        let mut out = Self::default();
        out.error(message);
        out.with_status(CheckStatus::Fail)
    }

    pub fn with_status(mut self, status: CheckStatus) -> Self {
        self.status = status;
        self
    }

    fn push(&mut self, level: FindingLevel, message: impl Into<String>) {
        self.findings.push(Finding {
            level,
            message: message.into(),
        });
    }

    pub fn ok(&mut self, message: impl Into<String>) {
        self.push(FindingLevel::Ok, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(FindingLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(FindingLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(FindingLevel::Error, message);
    }
}

pub const ALL_CHECKS: [Check; 5] = [
    Check {
        id: "engine",
        name: "GDAL Installation",
        procedure: check_engine,
    },
    Check {
        id: "driver",
        name: "EOPF-Zarr Driver",
        procedure: check_driver,
    },
    Check {
        id: "bindings",
        name: "Rasterio-GDAL Compatibility",
        procedure: check_bindings,
    },
    Check {
        id: "packages",
        name: "Python Environment",
        procedure: check_packages,
    },
    Check {
        id: "remote",
        name: "Remote Zarr URL",
        procedure: check_remote,
    },
];

/// Checks enabled by `toggles`, in declaration order.
pub fn registered_checks(toggles: &CheckToggles) -> Vec<Check> {
    ALL_CHECKS
        .iter()
        .filter(|check| toggles.enabled(check.id))
        .copied()
        .collect()
}

fn check_engine(ctx: &CheckContext<'_>) -> CheckOutcome {
    match ctx.env.engine_info() {
        Ok(engine) => {
            let mut out = CheckOutcome::default();
            out.ok(format!("GDAL {} loaded successfully", engine.version));
            out.info(format!(
                "Total drivers available: {}",
                engine.driver_count()
            ));
            out
        }
        Err(err) => CheckOutcome::failed(format!("Failed to load GDAL: {err}")),
    }
}

fn check_driver(ctx: &CheckContext<'_>) -> CheckOutcome {
    let wanted = &ctx.config.driver;
    let engine = match ctx.env.engine_info() {
        Ok(engine) => engine,
        Err(err) => {
            return CheckOutcome::failed(format!("Error checking {} driver: {err}", wanted.name))
        }
    };

    let mut out = CheckOutcome::default();
    match engine.driver(&wanted.name) {
        Some(driver) => {
            out.ok(format!(
                "{} driver found: {}",
                driver.short_name, driver.long_name
            ));
            out
        }
        None if wanted.required => {
            out.error(ProbeError::DriverAbsent(wanted.name.clone()).to_string());
            out.with_status(CheckStatus::Fail)
        }
        None => {
            out.warn(format!(
                "{} driver not found - optional in this deployment",
                wanted.name
            ));
            out.with_status(CheckStatus::Warn)
        }
    }
}

fn check_bindings(ctx: &CheckContext<'_>) -> CheckOutcome {
    let failed = |err: ProbeError| {
        CheckOutcome::failed(format!("Rasterio-GDAL compatibility test failed: {err}"))
    };
    let engine = match ctx.env.engine_info() {
        Ok(engine) => engine,
        Err(err) => return failed(err),
    };
    let wrapper = match ctx.env.wrapper_info() {
        Ok(wrapper) => wrapper,
        Err(err) => return failed(err),
    };

    let mut out = CheckOutcome::default();
    out.info(format!("GDAL version: {}", engine.version));
    out.info(format!("Rasterio version: {}", wrapper.version));
    if wrapper.gdal_version != engine.version {
        out.warn(format!(
            "Rasterio was built against GDAL {} but the engine reports {}",
            wrapper.gdal_version, engine.version
        ));
        out.status = CheckStatus::Warn;
    }
    out.ok(format!(
        "Rasterio has access to {} GDAL driver extensions",
        wrapper.extensions.len()
    ));

    let keyword = &ctx.config.driver.family_keyword;
    let related = wrapper.extensions_matching(keyword);
    if related.is_empty() {
        out.info(format!(
            "No {keyword} drivers found in rasterio extensions (expected)"
        ));
    } else {
        let listed = related
            .iter()
            .map(|(ext, driver)| format!("{ext} -> {driver}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.ok(format!("{keyword}-related drivers found: {listed}"));
    }
    out
}

/// Share of importable packages required for the inventory to pass.
/// Compared in basis points so ratios like 0.7 hit their exact boundary.
pub fn meets_threshold(available: usize, total: usize, min_ratio: f64) -> bool {
    let required = (min_ratio.clamp(0.0, 1.0) * 10_000.0).round() as u128;
    available as u128 * 10_000 >= total as u128 * required
}

fn check_packages(ctx: &CheckContext<'_>) -> CheckOutcome {
    let packages = &ctx.config.packages;
    let mut out = CheckOutcome::default();
    let mut available = 0;
    for name in &packages.names {
        match ctx.env.import_package(name) {
            Ok(()) => {
                available += 1;
                out.ok(name.as_str());
            }
            Err(ProbeError::ImportMissing { .. }) => out.error(format!("{name} - missing")),
            Err(err) => out.error(format!(
                "{name} - {}",
                preview(&err.to_string(), ERROR_PREVIEW_CHARS)
            )),
        }
    }
    let total = packages.names.len();
    info!(target: "envcheck.packages", available, total, "package inventory");
    out.info(format!("Environment: {available}/{total} packages available"));
    if meets_threshold(available, total, packages.min_ratio) {
        out
    } else {
        out.with_status(CheckStatus::Fail)
    }
}

fn check_remote(ctx: &CheckContext<'_>) -> CheckOutcome {
    let remote = &ctx.config.remote;
    let dataset = remote.dataset_path(&ctx.config.driver.name);
    let mut out = CheckOutcome::default();
    out.info(format!(
        "Testing URL: {}",
        preview(&dataset, URL_PREVIEW_CHARS)
    ));

    match ctx.env.open_with_wrapper(&dataset) {
        Ok(ds) => {
            out.ok(format!(
                "rasterio successfully opened remote {} URL",
                ctx.config.driver.name
            ));
            out.info(format!("Shape: ({}, {})", ds.height, ds.width));
            out.info(format!("Count: {}", ds.band_count));
            out.info(format!("CRS: {}", ds.crs.as_deref().unwrap_or("None")));
            out.info(format!(
                "Data type: {}",
                ds.data_type.as_deref().unwrap_or("N/A")
            ));
            return out;
        }
        Err(err) => {
            warn!(target: "envcheck.remote", strategy = "wrapper", error = %err, "remote open failed");
            out.warn(format!(
                "rasterio remote URL test: {}",
                preview(&err.to_string(), ERROR_PREVIEW_CHARS)
            ));
        }
    }

    match ctx.env.open_with_engine(&dataset) {
        Ok(ds) => {
            out.ok(format!(
                "GDAL successfully opened remote {} URL",
                ctx.config.driver.name
            ));
            out.info(format!("Size: {}x{}", ds.width, ds.height));
            out.info(format!("Bands: {}", ds.band_count));
            out.info(format!(
                "Driver: {}",
                ds.driver.as_deref().unwrap_or("unknown")
            ));
            return out;
        }
        Err(err) => {
            warn!(target: "envcheck.remote", strategy = "engine", error = %err, "remote open failed");
            out.warn(format!(
                "GDAL remote URL test: {}",
                preview(&err.to_string(), ERROR_PREVIEW_CHARS)
            ));
        }
    }

    let metadata_url = remote.metadata_url();
    match ctx.env.fetch_status(&metadata_url, remote.fetch_timeout()) {
        Ok(200) => {
            out.ok("Network access to remote Zarr store confirmed");
            return out;
        }
        Ok(status) => {
            warn!(target: "envcheck.remote", strategy = "fetch", status, "unexpected status");
            out.warn(format!("Network test: HTTP {status} for {}", remote.metadata_key));
        }
        Err(err) => {
            warn!(target: "envcheck.remote", strategy = "fetch", error = %err, "metadata fetch failed");
            out.warn(format!(
                "Network test: {}",
                preview(&err.to_string(), ERROR_PREVIEW_CHARS)
            ));
        }
    }

    // Reachability is best-effort.
    out.info("Remote URL tests may fail due to network/auth restrictions");
    out.with_status(CheckStatus::Warn)
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
