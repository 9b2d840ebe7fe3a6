//! Human-readable descriptor report.

use crate::descriptor::Descriptor;
use crate::health::HealthTracker;
use crate::verify::Finding;

/// Width of a value cell inside the header box.
const BOX_CELL: usize = 31;

/// Pad or truncate `value` to exactly `width` characters.
fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        format!("{value:<width$}")
    } else {
        let mut cut: String = value.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

pub fn format_report(descriptor: &Descriptor, findings: &[Finding]) -> String {
    let service = &descriptor.service;
    let table = &descriptor.table;
    let hc = &service.health_check;
    let tracker = HealthTracker::new(hc);
    let mut out = String::new();

    out.push_str("\n╔══════════════════════════════════════════╗\n");
    out.push_str("║  linestack Deployment Descriptor         ║\n");
    out.push_str("╠══════════════════════════════════════════╣\n");
    out.push_str(&format!("║  Service: {}║\n", fit(&service.service_name, BOX_CELL)));
    out.push_str(&format!("║  Table:   {}║\n", fit(&table.table_name, BOX_CELL)));
    out.push_str(&format!("║  Port:    {}║\n", fit(&service.port.to_string(), BOX_CELL)));
    out.push_str("╚══════════════════════════════════════════╝\n\n");

    out.push_str(&format!("Image: {}\n", service.image.identifier()));
    out.push_str(&format!(
        "Auto deployments: {}\n\n",
        if service.auto_deployments_enabled { "on" } else { "off" }
    ));

    out.push_str(&format!("Roles ({}):\n", descriptor.roles.len()));
    for role in &descriptor.roles {
        out.push_str(&format!(
            "  • {} ← {} [{}]\n",
            role.role_name,
            role.assumed_by.as_str(),
            role.managed_policy.name
        ));
    }
    out.push('\n');

    out.push_str(&format!("Secrets ({}):\n", service.secrets.len()));
    for secret in &service.secrets {
        out.push_str(&format!("  • {:<26} {}\n", secret.name, secret.parameter_path));
    }
    out.push('\n');

    out.push_str("Environment:\n");
    for (name, value) in &service.env {
        out.push_str(&format!("  {name}={value}\n"));
    }
    out.push('\n');

    out.push_str(&format!(
        "Health check: GET {} every {}s (timeout {}s)\n",
        hc.path, hc.interval_secs, hc.timeout_secs
    ));
    out.push_str(&format!(
        "  unhealthy after {} failures (~{}s), healthy after {} successes (~{}s)\n\n",
        hc.unhealthy_threshold,
        tracker.time_to_unhealthy().as_secs(),
        hc.healthy_threshold,
        tracker.time_to_healthy().as_secs()
    ));

    out.push_str(&format!(
        "Table keys: {} ({}) / {} ({}), removal: {:?}\n",
        table.partition_key.name,
        table.partition_key.attribute_type.code(),
        table.sort_key.name,
        table.sort_key.attribute_type.code(),
        table.removal_policy
    ));
    for grant in &descriptor.grants {
        out.push_str(&format!(
            "Grant: {} → {} ({:?})\n",
            grant.role, grant.table, grant.access
        ));
    }
    out.push('\n');

    if findings.is_empty() {
        out.push_str("✅ No findings\n");
    } else {
        out.push_str(&format!("Findings ({}):\n\n", findings.len()));
        for f in findings {
            out.push_str(&format!(
                "  {} {}: {}\n",
                f.severity.symbol(),
                f.logical_id,
                f.message
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::build_descriptor;
    use crate::verify::lint;
    use linestack_core::{DeployContext, RepositoryRef};

    #[test]
    fn report_lists_contract() {
        let ctx = DeployContext::new("123456789012", "ap-northeast-1").unwrap();
        let repo = RepositoryRef::parse("line-bot-hands-on").unwrap();
        let d = build_descriptor(&ctx, &repo);
        let report = format_report(&d, &lint(&d));

        assert!(report.contains("line-bot-hands-on-table"));
        assert!(report.contains("OPEN_WEATHER_MAP_API_KEY"));
        assert!(report.contains("AWS_REGION=ap-northeast-1"));
        assert!(report.contains("GET /health every 10s (timeout 10s)"));
        assert!(report.contains("~100s"));
        assert!(report.contains("LineBotHandsonTable"));
    }

    #[test]
    fn long_names_keep_box_aligned() {
        let ctx = DeployContext::new("123456789012", "ap-northeast-1").unwrap();
        let repo = RepositoryRef::parse("line-bot-hands-on").unwrap();
        let mut d = build_descriptor(&ctx, &repo);
        d.service.service_name = "a-service-name-well-beyond-thirty-one-characters".to_string();
        let report = format_report(&d, &[]);

        let widths: Vec<usize> = report
            .lines()
            .filter(|l| l.starts_with('║'))
            .map(|l| l.chars().count())
            .collect();
        assert_eq!(widths.len(), 4);
        assert!(widths.iter().all(|w| *w == widths[0]), "{widths:?}");
        assert!(report.contains("a-service-name-well-beyond-thi…"));
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefg", 5), "abcd…");
        assert_eq!(fit("abcde", 5), "abcde");
    }
}
