//! End-to-end descriptor evaluation.
//!
//! Evaluates the descriptor for a concrete account/region/repository and
//! checks the contract the deployed service relies on, both on the typed
//! descriptor and on the synthesized template.

use linestack_core::{
    AttributeType, DeployContext, GrantAccess, OutputValue, RemovalPolicy, RepositoryRef,
};
use linestack_synth::descriptor::{ENV_REGION, ENV_TABLE_NAME, SECRET_NAMES};
use linestack_synth::*;
use serde_json::json;

const REPO: &str = "123456789012.dkr.ecr.ap-northeast-1.amazonaws.com/line-bot-hands-on";

fn evaluate() -> (DeployContext, Descriptor) {
    let ctx = DeployContext::new("123456789012", "ap-northeast-1").unwrap();
    let repo = RepositoryRef::parse(REPO).unwrap();
    let descriptor = build_descriptor(&ctx, &repo);
    (ctx, descriptor)
}

#[test]
fn scenario_image_and_environment() {
    let (_, d) = evaluate();
    assert_eq!(d.service.image.identifier(), format!("{REPO}:latest"));
    assert_eq!(d.service.env.get(ENV_REGION).map(String::as_str), Some("ap-northeast-1"));
    assert_eq!(
        d.service.env.get(ENV_TABLE_NAME).map(String::as_str),
        Some("line-bot-hands-on-table")
    );
    assert_eq!(d.service.env.len(), 2);
}

#[test]
fn scenario_declaration_counts() {
    let (_, d) = evaluate();
    assert_eq!(d.roles.len(), 2);
    assert_eq!(d.grants.len(), 1);
    assert_eq!(d.outputs.len(), 1);
    verify(&d).unwrap();
}

#[test]
fn scenario_secret_contract() {
    let (_, d) = evaluate();
    assert_eq!(d.service.secrets.len(), 8);
    for (secret, expected) in d.service.secrets.iter().zip(SECRET_NAMES) {
        assert_eq!(secret.name, expected);
        assert_eq!(
            secret.parameter_path,
            format!("linebot-apprunner-handson/{expected}")
        );
        assert!(secret.arn.ends_with(&format!(":parameter/linebot-apprunner-handson/{expected}")));
        assert!(secret.arn.starts_with("arn:aws:ssm:ap-northeast-1:123456789012:"));
    }
}

#[test]
fn scenario_health_policy() {
    let (_, d) = evaluate();
    let hc = &d.service.health_check;
    assert_eq!(hc.path, "/health");
    assert_eq!(hc.healthy_threshold, 5);
    assert_eq!(hc.unhealthy_threshold, 10);
    assert_eq!(hc.interval_secs, 10);
    assert_eq!(hc.timeout_secs, 10);
    assert!(!has_errors(&lint(&d)));
}

#[test]
fn scenario_table_schema_and_teardown() {
    let (_, d) = evaluate();
    assert_eq!(d.table.partition_key.name, "publisherId");
    assert_eq!(d.table.partition_key.attribute_type, AttributeType::String);
    assert_eq!(d.table.sort_key.name, "timestamp");
    assert_eq!(d.table.sort_key.attribute_type, AttributeType::Number);
    assert_eq!(d.table.removal_policy, RemovalPolicy::Destroy);
}

#[test]
fn scenario_grant_and_output() {
    let (_, d) = evaluate();
    let grant = &d.grants[0];
    assert_eq!(grant.role, "InstanceRole");
    assert_eq!(grant.table, d.table.logical_id);
    assert_eq!(grant.access, GrantAccess::ReadWriteData);
    assert_eq!(
        d.outputs[0].value,
        OutputValue::ServiceUrl {
            service: "AppRunnerService".to_string()
        }
    );
}

#[test]
fn scenario_template() {
    let (ctx, d) = evaluate();
    let template = synthesize(&d, &ctx);
    let json: serde_json::Value =
        serde_json::from_str(&template.to_json_pretty().unwrap()).unwrap();

    let resources = json["Resources"].as_object().unwrap();
    assert_eq!(resources.len(), 5);

    let svc = &json["Resources"]["AppRunnerService"]["Properties"];
    assert_eq!(
        svc["SourceConfiguration"]["ImageRepository"]["ImageIdentifier"],
        format!("{REPO}:latest")
    );
    assert_eq!(svc["SourceConfiguration"]["AutoDeploymentsEnabled"], true);
    assert_eq!(
        svc["SourceConfiguration"]["ImageRepository"]["ImageConfiguration"]
            ["RuntimeEnvironmentVariables"],
        json!([
            { "Name": "AWS_REGION", "Value": "ap-northeast-1" },
            { "Name": "DYNAMODB_TABLE_NAME", "Value": "line-bot-hands-on-table" },
        ])
    );

    let table = &json["Resources"]["LineBotHandsonTable"];
    assert_eq!(table["DeletionPolicy"], "Delete");
    assert_eq!(table["Properties"]["TableName"], "line-bot-hands-on-table");

    assert!(json["Outputs"]["AppRunnerServiceUrl"]["Value"].is_object());
}

#[test]
fn region_flows_into_environment_and_secrets() {
    let ctx = DeployContext::new("210987654321", "us-west-2").unwrap();
    let repo = RepositoryRef::parse("line-bot-hands-on").unwrap();
    let d = build_descriptor(&ctx, &repo);
    assert_eq!(d.service.env[ENV_REGION], "us-west-2");
    assert_eq!(
        d.service.image.identifier(),
        "210987654321.dkr.ecr.us-west-2.amazonaws.com/line-bot-hands-on:latest"
    );
    assert!(d
        .service
        .secrets
        .iter()
        .all(|s| s.arn.starts_with("arn:aws:ssm:us-west-2:210987654321:parameter/")));
    verify(&d).unwrap();
}
