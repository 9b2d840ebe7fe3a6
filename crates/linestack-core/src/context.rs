//! Account/region context a descriptor is evaluated against.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PARTITION: &str = "aws";

const REGION_PATTERN: &str = r"^[a-z]{2}(-[a-z]+)+-\d$";
const PARTITION_PATTERN: &str = r"^aws(-[a-z]+)*$";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid account id: {0} (expected 12 digits)")]
    InvalidAccount(String),
    #[error("invalid region: {0}")]
    InvalidRegion(String),
    #[error("invalid partition: {0}")]
    InvalidPartition(String),
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// Ambient deployment context: which account and region the descriptor
/// targets. Only used to render identifiers; nothing is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployContext {
    pub account: String,
    pub region: String,
    pub partition: String,
}

impl DeployContext {
    pub fn new(account: &str, region: &str) -> Result<Self, ContextError> {
        Self::with_partition(account, region, DEFAULT_PARTITION)
    }

    pub fn with_partition(
        account: &str,
        region: &str,
        partition: &str,
    ) -> Result<Self, ContextError> {
        let account_re = Regex::new(r"^\d{12}$")?;
        if !account_re.is_match(account) {
            return Err(ContextError::InvalidAccount(account.to_string()));
        }
        if !is_valid_region(region)? {
            return Err(ContextError::InvalidRegion(region.to_string()));
        }
        if !is_valid_partition(partition)? {
            return Err(ContextError::InvalidPartition(partition.to_string()));
        }
        Ok(Self {
            account: account.to_string(),
            region: region.to_string(),
            partition: partition.to_string(),
        })
    }

    /// ARN of a parameter-store entry at `path` in this account/region.
    pub fn parameter_arn(&self, path: &str) -> String {
        format!(
            "arn:{}:ssm:{}:{}:parameter/{}",
            self.partition,
            self.region,
            self.account,
            path.trim_start_matches('/')
        )
    }

    /// ARN of a provider-managed IAM policy.
    pub fn managed_policy_arn(&self, name: &str) -> String {
        format!("arn:{}:iam::aws:policy/{name}", self.partition)
    }

    /// Private container registry host for this account/region.
    pub fn ecr_registry(&self) -> String {
        ecr_registry(&self.account, &self.region, &self.partition)
    }
}

pub fn is_valid_region(region: &str) -> Result<bool, regex::Error> {
    Ok(Regex::new(REGION_PATTERN)?.is_match(region))
}

pub fn is_valid_partition(partition: &str) -> Result<bool, regex::Error> {
    Ok(Regex::new(PARTITION_PATTERN)?.is_match(partition))
}

/// Service endpoint domain for a partition.
pub fn dns_suffix(partition: &str) -> &'static str {
    match partition {
        "aws-cn" => "amazonaws.com.cn",
        _ => "amazonaws.com",
    }
}

/// Registry host for an account/region in the given partition.
pub fn ecr_registry(account: &str, region: &str, partition: &str) -> String {
    format!("{account}.dkr.ecr.{region}.{}", dns_suffix(partition))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DeployContext {
        DeployContext::new("123456789012", "ap-northeast-1").unwrap()
    }

    #[test]
    fn test_valid_context() {
        let ctx = ctx();
        assert_eq!(ctx.partition, "aws");
        assert_eq!(ctx.region, "ap-northeast-1");
    }

    #[test]
    fn test_rejects_short_account() {
        let err = DeployContext::new("12345", "ap-northeast-1").unwrap_err();
        assert!(matches!(err, ContextError::InvalidAccount(_)));
    }

    #[test]
    fn test_rejects_bad_region() {
        for region in ["", "tokyo", "AP-NORTHEAST-1", "ap-northeast"] {
            let err = DeployContext::new("123456789012", region).unwrap_err();
            assert!(matches!(err, ContextError::InvalidRegion(_)), "{region}");
        }
    }

    #[test]
    fn test_gov_region_and_partition() {
        let ctx = DeployContext::with_partition("123456789012", "us-gov-west-1", "aws-us-gov")
            .unwrap();
        assert_eq!(
            ctx.managed_policy_arn("AmazonSSMReadOnlyAccess"),
            "arn:aws-us-gov:iam::aws:policy/AmazonSSMReadOnlyAccess"
        );
    }

    #[test]
    fn test_parameter_arn() {
        assert_eq!(
            ctx().parameter_arn("linebot-apprunner-handson/CHANNEL_SECRET"),
            "arn:aws:ssm:ap-northeast-1:123456789012:parameter/linebot-apprunner-handson/CHANNEL_SECRET"
        );
    }

    #[test]
    fn test_china_partition_uses_cn_suffix() {
        let ctx = DeployContext::with_partition("123456789012", "cn-north-1", "aws-cn").unwrap();
        assert_eq!(
            ctx.ecr_registry(),
            "123456789012.dkr.ecr.cn-north-1.amazonaws.com.cn"
        );
        assert_eq!(
            ctx.parameter_arn("linebot-apprunner-handson/CHANNEL_TOKEN"),
            "arn:aws-cn:ssm:cn-north-1:123456789012:parameter/linebot-apprunner-handson/CHANNEL_TOKEN"
        );
    }

    #[test]
    fn test_dns_suffix() {
        assert_eq!(dns_suffix("aws"), "amazonaws.com");
        assert_eq!(dns_suffix("aws-us-gov"), "amazonaws.com");
        assert_eq!(dns_suffix("aws-cn"), "amazonaws.com.cn");
    }

    #[test]
    fn test_ecr_registry() {
        assert_eq!(
            ctx().ecr_registry(),
            "123456789012.dkr.ecr.ap-northeast-1.amazonaws.com"
        );
    }
}
