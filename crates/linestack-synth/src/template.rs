//! CloudFormation template synthesis.
//!
//! Renders an evaluated [`Descriptor`] into the JSON document the
//! provisioning engine applies as one unit. Cross-resource references use
//! intrinsic functions (`Ref`, `Fn::GetAtt`, `Fn::Join`); nothing is
//! resolved here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::info;

use linestack_core::{
    AccessRole, DeployContext, GrantRelation, OutputValue, ServiceDescriptor, StackOutput,
    StorageTable,
};

use crate::descriptor::Descriptor;

pub const FORMAT_VERSION: &str = "2010-09-09";
pub const DESCRIPTION: &str = "LINE bot hands-on: App Runner service, roles and DynamoDB table";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    pub description: String,
    pub resources: BTreeMap<String, Resource>,
    pub outputs: BTreeMap<String, Output>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deletion_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub update_replace_policy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl Template {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Hex SHA-256 of the compact JSON rendering.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Resources of the given type, in logical-id order.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }
}

/// Render the descriptor as a template.
pub fn synthesize(descriptor: &Descriptor, ctx: &DeployContext) -> Template {
    let mut resources = BTreeMap::new();

    for role in &descriptor.roles {
        resources.insert(role.logical_id.clone(), role_resource(role, ctx));
    }
    resources.insert(
        descriptor.service.logical_id.clone(),
        service_resource(&descriptor.service),
    );
    resources.insert(
        descriptor.table.logical_id.clone(),
        table_resource(&descriptor.table),
    );
    for grant in &descriptor.grants {
        resources.insert(grant.logical_id.clone(), grant_resource(grant));
    }

    let outputs = descriptor
        .outputs
        .iter()
        .map(|o| (o.logical_id.clone(), output(o)))
        .collect();

    let template = Template {
        format_version: FORMAT_VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        resources,
        outputs,
    };
    info!(
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "template synthesized"
    );
    template
}

fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

fn role_resource(role: &AccessRole, ctx: &DeployContext) -> Resource {
    Resource {
        resource_type: "AWS::IAM::Role".to_string(),
        properties: json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": role.assumed_by.as_str() },
                }],
            },
            "ManagedPolicyArns": [ctx.managed_policy_arn(&role.managed_policy.name)],
            "RoleName": role.role_name,
        }),
        deletion_policy: None,
        update_replace_policy: None,
    }
}

fn service_resource(service: &ServiceDescriptor) -> Resource {
    let variables: Vec<Value> = service
        .env
        .iter()
        .map(|(name, value)| json!({ "Name": name, "Value": value }))
        .collect();
    let secrets: Vec<Value> = service
        .secrets
        .iter()
        .map(|s| json!({ "Name": s.name, "Value": s.arn }))
        .collect();
    let hc = &service.health_check;

    Resource {
        resource_type: "AWS::AppRunner::Service".to_string(),
        properties: json!({
            "ServiceName": service.service_name,
            "SourceConfiguration": {
                "AuthenticationConfiguration": {
                    "AccessRoleArn": get_att(&service.access_role, "Arn"),
                },
                "AutoDeploymentsEnabled": service.auto_deployments_enabled,
                "ImageRepository": {
                    "ImageIdentifier": service.image.identifier(),
                    "ImageRepositoryType": "ECR",
                    "ImageConfiguration": {
                        "Port": service.port.to_string(),
                        "RuntimeEnvironmentVariables": variables,
                        "RuntimeEnvironmentSecrets": secrets,
                    },
                },
            },
            "InstanceConfiguration": {
                "InstanceRoleArn": get_att(&service.instance_role, "Arn"),
            },
            "HealthCheckConfiguration": {
                "Protocol": "HTTP",
                "Path": hc.path,
                "Interval": hc.interval_secs,
                "Timeout": hc.timeout_secs,
                "HealthyThreshold": hc.healthy_threshold,
                "UnhealthyThreshold": hc.unhealthy_threshold,
            },
        }),
        deletion_policy: None,
        update_replace_policy: None,
    }
}

fn table_resource(table: &StorageTable) -> Resource {
    let policy = table.removal_policy.deletion_policy().to_string();
    Resource {
        resource_type: "AWS::DynamoDB::Table".to_string(),
        properties: json!({
            "TableName": table.table_name,
            "AttributeDefinitions": [
                {
                    "AttributeName": table.partition_key.name,
                    "AttributeType": table.partition_key.attribute_type.code(),
                },
                {
                    "AttributeName": table.sort_key.name,
                    "AttributeType": table.sort_key.attribute_type.code(),
                },
            ],
            "KeySchema": [
                { "AttributeName": table.partition_key.name, "KeyType": "HASH" },
                { "AttributeName": table.sort_key.name, "KeyType": "RANGE" },
            ],
            "ProvisionedThroughput": {
                "ReadCapacityUnits": table.throughput.read_capacity_units,
                "WriteCapacityUnits": table.throughput.write_capacity_units,
            },
        }),
        deletion_policy: Some(policy.clone()),
        update_replace_policy: Some(policy),
    }
}

fn grant_resource(grant: &GrantRelation) -> Resource {
    Resource {
        resource_type: "AWS::IAM::Policy".to_string(),
        properties: json!({
            "PolicyName": grant.logical_id,
            "PolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": grant.access.actions(),
                    "Effect": "Allow",
                    "Resource": [get_att(&grant.table, "Arn")],
                }],
            },
            "Roles": [{ "Ref": grant.role }],
        }),
        deletion_policy: None,
        update_replace_policy: None,
    }
}

fn output(output: &StackOutput) -> Output {
    match &output.value {
        OutputValue::ServiceUrl { service } => Output {
            value: json!({
                "Fn::Join": ["", ["https://", get_att(service, "ServiceUrl")]],
            }),
            description: Some("Public HTTPS endpoint of the service".to_string()),
        },
    }
}
