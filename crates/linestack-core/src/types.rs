//! Resource declarations that make up a deployment descriptor.
//!
//! Every type here is a plain configuration record. Records are built once
//! when the descriptor is evaluated and are never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logical identifier of a declaration inside one descriptor.
pub type LogicalId = String;

// ── Access roles ───────────────────────────────────────────────────

/// Platform principal allowed to assume a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePrincipal(pub String);

impl ServicePrincipal {
    pub fn new(service: &str) -> Self {
        Self(service.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Provider-managed permission policy, referenced by name
/// (e.g. `service-role/AWSAppRunnerServicePolicyForECRAccess`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedPolicy {
    pub name: String,
}

impl ManagedPolicy {
    pub fn aws_managed(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

/// Identity with a trust principal and one attached managed policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRole {
    pub logical_id: LogicalId,
    pub role_name: String,
    pub assumed_by: ServicePrincipal,
    pub managed_policy: ManagedPolicy,
}

// ── Compute service ────────────────────────────────────────────────

/// Container image pulled from a registry repository at a fixed tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Full registry URI of the repository, without tag.
    pub repository_uri: String,
    pub tag: String,
}

impl ImageSource {
    /// `<repository_uri>:<tag>`
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.repository_uri, self.tag)
    }
}

/// Named credential resolved from the parameter store at apply time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    /// Environment variable name the deployed service reads.
    pub name: String,
    /// Parameter path, e.g. `linebot-apprunner-handson/CHANNEL_SECRET`.
    pub parameter_path: String,
    /// Fully qualified parameter ARN in the deploying account/region.
    pub arn: String,
}

/// HTTP health-check settings for the compute service.
///
/// The platform requires `interval_secs >= timeout_secs`; the descriptor
/// declares the values and leaves enforcement to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckPolicy {
    pub path: String,
    /// Consecutive successes before the service is marked healthy.
    pub healthy_threshold: u32,
    /// Consecutive failures before the service is marked unhealthy.
    pub unhealthy_threshold: u32,
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

/// Managed container service declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub logical_id: LogicalId,
    pub service_name: String,
    pub image: ImageSource,
    pub port: u16,
    /// Secrets in declaration order.
    pub secrets: Vec<SecretReference>,
    pub env: BTreeMap<String, String>,
    /// Logical id of the role the build principal uses to pull the image.
    pub access_role: LogicalId,
    /// Logical id of the role the running task assumes.
    pub instance_role: LogicalId,
    pub health_check: HealthCheckPolicy,
    pub auto_deployments_enabled: bool,
}

impl ServiceDescriptor {
    pub fn secret(&self, name: &str) -> Option<&SecretReference> {
        self.secrets.iter().find(|s| s.name == name)
    }

    pub fn secret_names(&self) -> Vec<&str> {
        self.secrets.iter().map(|s| s.name.as_str()).collect()
    }
}

// ── Storage table ──────────────────────────────────────────────────

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

impl AttributeType {
    /// Single-letter code used in table attribute definitions.
    pub fn code(&self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn new(name: &str, attribute_type: AttributeType) -> Self {
        Self {
            name: name.to_string(),
            attribute_type,
        }
    }
}

/// What happens to a resource when its declaration is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

impl RemovalPolicy {
    /// Value used for `DeletionPolicy` / `UpdateReplacePolicy`.
    pub fn deletion_policy(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
        }
    }
}

/// Provisioned read/write capacity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throughput {
    pub read_capacity_units: u32,
    pub write_capacity_units: u32,
}

impl Default for Throughput {
    fn default() -> Self {
        Self {
            read_capacity_units: 5,
            write_capacity_units: 5,
        }
    }
}

/// Keyed NoSQL table with a two-part primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageTable {
    pub logical_id: LogicalId,
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub removal_policy: RemovalPolicy,
    pub throughput: Throughput,
}

// ── Grants & outputs ───────────────────────────────────────────────

/// Access level granted on a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantAccess {
    ReadData,
    ReadWriteData,
}

impl GrantAccess {
    /// Table actions covered by this access level.
    pub fn actions(&self) -> &'static [&'static str] {
        const READ: &[&str] = &[
            "dynamodb:BatchGetItem",
            "dynamodb:GetRecords",
            "dynamodb:GetShardIterator",
            "dynamodb:Query",
            "dynamodb:GetItem",
            "dynamodb:Scan",
            "dynamodb:ConditionCheckItem",
            "dynamodb:DescribeTable",
        ];
        const READ_WRITE: &[&str] = &[
            "dynamodb:BatchGetItem",
            "dynamodb:GetRecords",
            "dynamodb:GetShardIterator",
            "dynamodb:Query",
            "dynamodb:GetItem",
            "dynamodb:Scan",
            "dynamodb:ConditionCheckItem",
            "dynamodb:BatchWriteItem",
            "dynamodb:PutItem",
            "dynamodb:UpdateItem",
            "dynamodb:DeleteItem",
            "dynamodb:DescribeTable",
        ];
        match self {
            GrantAccess::ReadData => READ,
            GrantAccess::ReadWriteData => READ_WRITE,
        }
    }
}

/// Non-owning link: `role` may access `table`. Rendered as a policy
/// attached to the role, never as a structural reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRelation {
    pub logical_id: LogicalId,
    pub role: LogicalId,
    pub table: LogicalId,
    pub access: GrantAccess,
}

/// Value exported by the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputValue {
    /// `https://` followed by the public URL attribute of the service.
    ServiceUrl { service: LogicalId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub logical_id: LogicalId,
    pub value: OutputValue,
}
