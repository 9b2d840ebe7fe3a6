//! The deployment descriptor: a fixed, linear sequence of declarations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use linestack_core::{
    AccessRole, AttributeType, DeployContext, GrantAccess, GrantRelation, HealthCheckPolicy,
    ImageSource, KeyAttribute, ManagedPolicy, OutputValue, RemovalPolicy, RepositoryRef,
    SecretReference, ServiceDescriptor, ServicePrincipal, StackOutput, StorageTable, Throughput,
};

pub const INSTANCE_ROLE_ID: &str = "InstanceRole";
pub const INSTANCE_ROLE_NAME: &str = "HandsonAppRunnerInstanceRole";
pub const INSTANCE_PRINCIPAL: &str = "tasks.apprunner.amazonaws.com";
pub const INSTANCE_POLICY: &str = "AmazonSSMReadOnlyAccess";

pub const ACCESS_ROLE_ID: &str = "EcrAccessRole";
pub const ACCESS_ROLE_NAME: &str = "HandsonAppRunnerECRAccessRole";
pub const ACCESS_PRINCIPAL: &str = "build.apprunner.amazonaws.com";
pub const ACCESS_POLICY: &str = "service-role/AWSAppRunnerServicePolicyForECRAccess";

pub const SERVICE_ID: &str = "AppRunnerService";
pub const SERVICE_NAME: &str = "line-bot-hands-on";
pub const SERVICE_PORT: u16 = 8080;
pub const IMAGE_TAG: &str = "latest";

pub const TABLE_ID: &str = "LineBotHandsonTable";
/// Shared between the table declaration and the service environment.
pub const TABLE_NAME: &str = "line-bot-hands-on-table";
pub const PARTITION_KEY: &str = "publisherId";
pub const SORT_KEY: &str = "timestamp";

pub const GRANT_ID: &str = "InstanceRoleDefaultPolicy";
pub const OUTPUT_ID: &str = "AppRunnerServiceUrl";

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_TABLE_NAME: &str = "DYNAMODB_TABLE_NAME";

pub const SECRET_PREFIX: &str = "linebot-apprunner-handson";

/// Credentials the deployed service expects, in declaration order.
/// Changing this list changes the runtime contract of the service.
pub const SECRET_NAMES: [&str; 8] = [
    "CHANNEL_SECRET",
    "CHANNEL_TOKEN",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_ENDPOINT",
    "OPENAI_API_VERSION",
    "OPEN_WEATHER_MAP_API_KEY",
];

/// The full resource graph produced by one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Instance role first, access role second.
    pub roles: Vec<AccessRole>,
    pub service: ServiceDescriptor,
    pub table: StorageTable,
    pub grants: Vec<GrantRelation>,
    pub outputs: Vec<StackOutput>,
}

impl Descriptor {
    pub fn role(&self, logical_id: &str) -> Option<&AccessRole> {
        self.roles.iter().find(|r| r.logical_id == logical_id)
    }

    /// Total number of declarations, outputs included.
    pub fn declaration_count(&self) -> usize {
        self.roles.len() + 1 + 1 + self.grants.len() + self.outputs.len()
    }
}

/// Parameter path for a named secret.
pub fn secret_path(name: &str) -> String {
    format!("{SECRET_PREFIX}/{name}")
}

/// Evaluate the descriptor. Pure: performs no I/O and resolves nothing.
pub fn build_descriptor(ctx: &DeployContext, repository: &RepositoryRef) -> Descriptor {
    // 1. Role assumed by the running task.
    let instance_role = AccessRole {
        logical_id: INSTANCE_ROLE_ID.to_string(),
        role_name: INSTANCE_ROLE_NAME.to_string(),
        assumed_by: ServicePrincipal::new(INSTANCE_PRINCIPAL),
        managed_policy: ManagedPolicy::aws_managed(INSTANCE_POLICY),
    };
    debug!(logical_id = INSTANCE_ROLE_ID, principal = INSTANCE_PRINCIPAL, "declared role");

    // 2. Role the build principal uses to pull from the registry.
    let access_role = AccessRole {
        logical_id: ACCESS_ROLE_ID.to_string(),
        role_name: ACCESS_ROLE_NAME.to_string(),
        assumed_by: ServicePrincipal::new(ACCESS_PRINCIPAL),
        managed_policy: ManagedPolicy::aws_managed(ACCESS_POLICY),
    };
    debug!(logical_id = ACCESS_ROLE_ID, principal = ACCESS_PRINCIPAL, "declared role");

    // 3. Table name, shared by steps 4 and 5.
    let table_name = TABLE_NAME.to_string();

    // 4. Compute service.
    let secrets = SECRET_NAMES
        .iter()
        .map(|name| {
            let parameter_path = secret_path(name);
            SecretReference {
                name: name.to_string(),
                arn: ctx.parameter_arn(&parameter_path),
                parameter_path,
            }
        })
        .collect();

    let env = BTreeMap::from([
        (ENV_REGION.to_string(), ctx.region.clone()),
        (ENV_TABLE_NAME.to_string(), table_name.clone()),
    ]);

    let service = ServiceDescriptor {
        logical_id: SERVICE_ID.to_string(),
        service_name: SERVICE_NAME.to_string(),
        image: ImageSource {
            repository_uri: repository.uri(ctx),
            tag: IMAGE_TAG.to_string(),
        },
        port: SERVICE_PORT,
        secrets,
        env,
        access_role: access_role.logical_id.clone(),
        instance_role: instance_role.logical_id.clone(),
        health_check: HealthCheckPolicy {
            path: "/health".to_string(),
            healthy_threshold: 5,
            unhealthy_threshold: 10,
            interval_secs: 10,
            timeout_secs: 10,
        },
        auto_deployments_enabled: true,
    };
    debug!(
        logical_id = SERVICE_ID,
        image = %service.image.identifier(),
        secrets = service.secrets.len(),
        "declared service"
    );

    // 5. Table. Destroyed on teardown.
    let table = StorageTable {
        logical_id: TABLE_ID.to_string(),
        table_name,
        partition_key: KeyAttribute::new(PARTITION_KEY, AttributeType::String),
        sort_key: KeyAttribute::new(SORT_KEY, AttributeType::Number),
        removal_policy: RemovalPolicy::Destroy,
        throughput: Throughput::default(),
    };
    debug!(logical_id = TABLE_ID, table = %table.table_name, "declared table");

    // 6. Instance role may read and write table data.
    let grant = GrantRelation {
        logical_id: GRANT_ID.to_string(),
        role: instance_role.logical_id.clone(),
        table: table.logical_id.clone(),
        access: GrantAccess::ReadWriteData,
    };
    debug!(logical_id = GRANT_ID, role = %grant.role, table = %grant.table, "declared grant");

    // 7. Public endpoint.
    let output = StackOutput {
        logical_id: OUTPUT_ID.to_string(),
        value: OutputValue::ServiceUrl {
            service: service.logical_id.clone(),
        },
    };

    let descriptor = Descriptor {
        roles: vec![instance_role, access_role],
        service,
        table,
        grants: vec![grant],
        outputs: vec![output],
    };
    info!(
        account = %ctx.account,
        region = %ctx.region,
        declarations = descriptor.declaration_count(),
        "descriptor evaluated"
    );
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> Descriptor {
        let ctx = DeployContext::new("123456789012", "ap-northeast-1").unwrap();
        let repo = RepositoryRef::parse("line-bot-hands-on").unwrap();
        build_descriptor(&ctx, &repo)
    }

    #[test]
    fn declares_fixed_resource_counts() {
        let d = build();
        assert_eq!(d.roles.len(), 2);
        assert_eq!(d.grants.len(), 1);
        assert_eq!(d.outputs.len(), 1);
        assert_eq!(d.declaration_count(), 6);
    }

    #[test]
    fn roles_bind_principals_and_policies() {
        let d = build();
        let instance = d.role(INSTANCE_ROLE_ID).unwrap();
        assert_eq!(instance.assumed_by.as_str(), "tasks.apprunner.amazonaws.com");
        assert_eq!(instance.managed_policy.name, "AmazonSSMReadOnlyAccess");

        let access = d.role(ACCESS_ROLE_ID).unwrap();
        assert_eq!(access.assumed_by.as_str(), "build.apprunner.amazonaws.com");
        assert_eq!(
            access.managed_policy.name,
            "service-role/AWSAppRunnerServicePolicyForECRAccess"
        );
        assert_eq!(d.roles[0].logical_id, INSTANCE_ROLE_ID);
    }

    #[test]
    fn table_name_matches_service_env() {
        let d = build();
        assert_eq!(
            d.service.env.get(ENV_TABLE_NAME),
            Some(&d.table.table_name)
        );
    }

    #[test]
    fn secrets_follow_naming_convention() {
        let d = build();
        assert_eq!(d.service.secret_names(), SECRET_NAMES.to_vec());
        let token = d.service.secret("CHANNEL_TOKEN").unwrap();
        assert_eq!(token.parameter_path, "linebot-apprunner-handson/CHANNEL_TOKEN");
        assert_eq!(
            token.arn,
            "arn:aws:ssm:ap-northeast-1:123456789012:parameter/linebot-apprunner-handson/CHANNEL_TOKEN"
        );
    }

    #[test]
    fn service_references_both_roles() {
        let d = build();
        assert_eq!(d.service.access_role, ACCESS_ROLE_ID);
        assert_eq!(d.service.instance_role, INSTANCE_ROLE_ID);
        assert!(d.service.auto_deployments_enabled);
        assert_eq!(d.service.port, 8080);
    }

    #[test]
    fn evaluation_is_deterministic() {
        assert_eq!(build(), build());
    }
}
