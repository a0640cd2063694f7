pub mod checks;
pub mod config;
pub mod error;
pub mod probe;
pub mod report;
pub mod validator;

pub use checks::{registered_checks, Check, CheckContext, CheckOutcome, ALL_CHECKS};
pub use config::{CheckToggles, EngineBackend, ValidatorConfig};
pub use error::ProbeError;
pub use probe::{DatasetSummary, DriverInfo, EngineInfo, Environment, SystemEnvironment, WrapperInfo};
pub use report::{
    CheckResult, CheckStatus, Finding, FindingLevel, ReportStatus, ReportSummary, ValidationReport,
};
pub use validator::{run_validations, ValidationOptions, Validator};
