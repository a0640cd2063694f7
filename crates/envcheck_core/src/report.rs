use chrono::Utc;
use serde::{Deserialize, Serialize};

const RULE_WIDTH: usize = 40;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub id: String,
    pub timestamp: String,
    pub title: String,
    pub summary: ReportSummary,
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn new(id: impl Into<String>, title: impl Into<String>, checks: Vec<CheckResult>) -> Self {
        let summary = summarize_checks(&checks);
        Self {
            id: id.into(),
            timestamp: Utc::now().to_rfc3339(),
            title: title.into(),
            summary,
            checks,
        }
    }

    /// One entry per executed check, in declaration order.
    pub fn results(&self) -> Vec<bool> {
        self.checks.iter().map(CheckResult::passed).collect()
    }

    pub fn all_passed(&self) -> bool {
        self.summary.status == ReportStatus::Pass
    }

    pub fn summary_line(&self) -> String {
        format!("{}/{}", self.summary.passed, self.summary.total)
    }

    /// Human-readable transcript printed by the CLI.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("🧪 {}", self.title), "=".repeat(RULE_WIDTH)];
        for check in &self.checks {
            lines.push(String::new());
            lines.push(format!("🔍 Testing {}...", check.name));
            lines.extend(
                check
                    .findings
                    .iter()
                    .map(|finding| format!("{} {}", finding.level.marker(), finding.message)),
            );
            let verdict = if check.passed() { "✅ PASS" } else { "❌ FAIL" };
            lines.push(format!("Result: {verdict}"));
        }
        lines.push(String::new());
        lines.push(format!("🎯 Overall: {} tests passed", self.summary_line()));
        lines.push(if self.all_passed() {
            "🚀 Container is ready for use!".to_string()
        } else {
            "⚠️ Some tests failed - check configuration".to_string()
        });

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn summarize_checks(checks: &[CheckResult]) -> ReportSummary {
    let passed = checks.iter().filter(|c| c.passed()).count();
    let status = if passed == checks.len() {
        ReportStatus::Pass
    } else {
        ReportStatus::Fail
    };
    ReportSummary {
        passed,
        total: checks.len(),
        status,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub passed: usize,
    pub total: usize,
    pub status: ReportStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: String,
    pub name: String,
    pub status: CheckStatus,
    pub findings: Vec<Finding>,
    pub duration_ms: u64,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.status.passed()
    }
}

/// `Warn` marks an acceptable degraded outcome and still counts as passed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn passed(self) -> bool {
        self != CheckStatus::Fail
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub level: FindingLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FindingLevel {
    Ok,
    Info,
    Warn,
    Error,
}

impl FindingLevel {
    pub fn marker(self) -> &'static str {
        match self {
            FindingLevel::Ok => "✅",
            FindingLevel::Info => "ℹ️",
            FindingLevel::Warn => "⚠️",
            FindingLevel::Error => "❌",
        }
    }
}
