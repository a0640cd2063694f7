use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::checks::{registered_checks, Check, CheckContext, CheckOutcome};
use crate::config::ValidatorConfig;
use crate::probe::Environment;
use crate::report::{CheckResult, ValidationReport};

pub struct ValidationOptions {
    pub run_id: String,
}

impl ValidationOptions {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }
}

/// Runs an ordered list of checks against an [`Environment`].
pub struct Validator {
    config: ValidatorConfig,
    checks: Vec<Check>,
}

impl Validator {
    /// Registers the checks enabled in `config.checks`.
    pub fn new(config: ValidatorConfig) -> Self {
        let checks = registered_checks(&config.checks);
        Self::with_checks(config, checks)
    }

    pub fn with_checks(config: ValidatorConfig, checks: Vec<Check>) -> Self {
        Self { config, checks }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Every check runs, whatever happened to the previous ones.
    pub fn run(&self, env: &dyn Environment, options: &ValidationOptions) -> ValidationReport {
        let ctx = CheckContext {
            env,
            config: &self.config,
        };
        let results = self
            .checks
            .iter()
            .map(|check| run_check(check, &ctx))
            .collect();
        let report = ValidationReport::new(options.run_id.clone(), self.config.title.clone(), results);
        info!(
            target: "envcheck.validator",
            run_id = %report.id,
            passed = report.summary.passed,
            total = report.summary.total,
            "validation finished"
        );
        report
    }
}

pub fn run_validations(
    config: &ValidatorConfig,
    env: &dyn Environment,
    options: &ValidationOptions,
) -> ValidationReport {
    Validator::new(config.clone()).run(env, options)
}

fn run_check(check: &Check, ctx: &CheckContext<'_>) -> CheckResult {
    let _span = info_span!("check", id = check.id).entered();
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (check.procedure)(ctx)))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(target: "envcheck.validator", check = check.id, %message, "check panicked");
            CheckOutcome::failed(format!("{} check aborted: {message}", check.name))
        });
    let duration_ms = started.elapsed().as_millis() as u64;
    info!(target: "envcheck.validator", status = ?outcome.status, duration_ms, "check finished");

    CheckResult {
        id: check.id.to_string(),
        name: check.name.to_string(),
        status: outcome.status,
        findings: outcome.findings,
        duration_ms,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
