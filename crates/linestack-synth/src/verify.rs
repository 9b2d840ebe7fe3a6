//! Structural invariant checks and platform-limit linting.
//!
//! `verify` guards the contract between the descriptor and the deployed
//! service (secret names, table name, key schema). `lint` reports values the
//! platform would reject or that deserve attention before an apply; the
//! descriptor itself never enforces them.

use serde::Serialize;
use tracing::warn;

use linestack_core::RemovalPolicy;

use crate::descriptor::{secret_path, Descriptor, ENV_TABLE_NAME, SECRET_NAMES};
use crate::error::{DescriptorError, DescriptorResult};

/// Platform bounds for health-check settings.
const HEALTH_SECS_RANGE: std::ops::RangeInclusive<u64> = 1..=20;
const HEALTH_THRESHOLD_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// Check the structural invariants. Returns the first violation.
pub fn verify(descriptor: &Descriptor) -> DescriptorResult<()> {
    expect_count("role", 2, descriptor.roles.len())?;
    expect_count("grant", 1, descriptor.grants.len())?;
    expect_count("output", 1, descriptor.outputs.len())?;

    let service = &descriptor.service;
    let env_table = service.env.get(ENV_TABLE_NAME);
    if env_table != Some(&descriptor.table.table_name) {
        return Err(DescriptorError::TableNameMismatch {
            table: descriptor.table.table_name.clone(),
            env: env_table.cloned(),
        });
    }

    let found = service.secret_names();
    if found != SECRET_NAMES {
        return Err(DescriptorError::SecretSet {
            expected: SECRET_NAMES.iter().map(|s| s.to_string()).collect(),
            found: found.iter().map(|s| s.to_string()).collect(),
        });
    }
    for secret in &service.secrets {
        let expected = secret_path(&secret.name);
        if secret.parameter_path != expected {
            return Err(DescriptorError::SecretPath {
                name: secret.name.clone(),
                path: secret.parameter_path.clone(),
                expected,
            });
        }
    }

    for role_id in [&service.access_role, &service.instance_role] {
        if descriptor.role(role_id).is_none() {
            return Err(dangling(&service.logical_id, "role", role_id));
        }
    }

    for grant in &descriptor.grants {
        if descriptor.role(&grant.role).is_none() {
            return Err(dangling(&grant.logical_id, "role", &grant.role));
        }
        if grant.table != descriptor.table.logical_id {
            return Err(dangling(&grant.logical_id, "table", &grant.table));
        }
    }

    Ok(())
}

fn expect_count(kind: &'static str, expected: usize, found: usize) -> DescriptorResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(DescriptorError::Count {
            kind,
            expected,
            found,
        })
    }
}

fn dangling(from: &str, kind: &'static str, target: &str) -> DescriptorError {
    DescriptorError::DanglingReference {
        from: from.to_string(),
        kind,
        target: target.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The platform rejects this at apply time.
    Error,
    Warning,
}

impl Severity {
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub logical_id: String,
    pub message: String,
}

impl Finding {
    fn error(logical_id: &str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            logical_id: logical_id.to_string(),
            message,
        }
    }

    fn warning(logical_id: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            logical_id: logical_id.to_string(),
            message,
        }
    }
}

/// Report platform-limit violations and notable settings.
pub fn lint(descriptor: &Descriptor) -> Vec<Finding> {
    let mut findings = Vec::new();
    let service = &descriptor.service;
    let id = service.logical_id.as_str();
    let hc = &service.health_check;

    if hc.timeout_secs > hc.interval_secs {
        findings.push(Finding::error(
            id,
            format!(
                "health check timeout {}s exceeds interval {}s",
                hc.timeout_secs, hc.interval_secs
            ),
        ));
    }
    for (field, value) in [("interval", hc.interval_secs), ("timeout", hc.timeout_secs)] {
        if !HEALTH_SECS_RANGE.contains(&value) {
            findings.push(Finding::error(
                id,
                format!("health check {field} {value}s outside 1..=20s"),
            ));
        }
    }
    for (field, value) in [
        ("healthy threshold", hc.healthy_threshold),
        ("unhealthy threshold", hc.unhealthy_threshold),
    ] {
        if !HEALTH_THRESHOLD_RANGE.contains(&value) {
            findings.push(Finding::error(
                id,
                format!("health check {field} {value} outside 1..=20"),
            ));
        }
    }
    if !hc.path.starts_with('/') {
        findings.push(Finding::error(
            id,
            format!("health check path {:?} must start with '/'", hc.path),
        ));
    }
    if service.port == 0 {
        findings.push(Finding::error(id, "service port must be non-zero".to_string()));
    }

    let table = &descriptor.table;
    if table.removal_policy == RemovalPolicy::Destroy {
        findings.push(Finding::warning(
            &table.logical_id,
            format!(
                "table {} is deleted with the stack; its data does not survive teardown",
                table.table_name
            ),
        ));
    }

    for finding in &findings {
        warn!(
            logical_id = %finding.logical_id,
            severity = ?finding.severity,
            "{}",
            finding.message
        );
    }
    findings
}

/// Whether any finding would fail an apply.
pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}
