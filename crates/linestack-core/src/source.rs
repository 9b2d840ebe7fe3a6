//! Container repository reference resolution.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{ecr_registry, is_valid_partition, is_valid_region, DeployContext};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RepositoryRef {
    /// Registry URI: 123456789012.dkr.ecr.ap-northeast-1.amazonaws.com/my-app
    Uri { registry: String, name: String },
    /// ARN: arn:aws:ecr:ap-northeast-1:123456789012:repository/my-app
    Arn {
        partition: String,
        region: String,
        account: String,
        name: String,
    },
    /// Bare repository name, resolved against the deploying account.
    Name { name: String },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid repository reference: {0}")]
    InvalidRepository(String),
    #[error("not a private container registry repository: {0}")]
    ForeignRegistry(String),
    #[error("repository reference must not carry a tag or digest: {0}")]
    TagNotAllowed(String),
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

impl RepositoryRef {
    pub fn parse(reference: &str) -> Result<Self, SourceError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(SourceError::InvalidRepository(reference.to_string()));
        }
        if reference.contains('@') {
            return Err(SourceError::TagNotAllowed(reference.to_string()));
        }

        if let Some(rest) = reference.strip_prefix("arn:") {
            let arn_re = Regex::new(r"^([a-z-]+):ecr:([^:]+):(\d{12}):repository/(.+)$")?;
            let caps = arn_re
                .captures(rest)
                .ok_or_else(|| SourceError::InvalidRepository(reference.to_string()))?;
            if !is_valid_partition(&caps[1])? || !is_valid_region(&caps[2])? {
                return Err(SourceError::InvalidRepository(reference.to_string()));
            }
            let name = caps[4].to_string();
            validate_name(&name, reference)?;
            return Ok(RepositoryRef::Arn {
                partition: caps[1].to_string(),
                region: caps[2].to_string(),
                account: caps[3].to_string(),
                name,
            });
        }

        // A colon outside an ARN can only be a tag (or a registry port,
        // which private registries don't use).
        if reference.contains(':') {
            return Err(SourceError::TagNotAllowed(reference.to_string()));
        }

        if let Some((host, name)) = reference.split_once('/') {
            let ecr_host_re =
                Regex::new(r"^\d{12}\.dkr\.ecr\.([a-z0-9-]+)\.amazonaws\.com(\.cn)?$")?;
            if let Some(caps) = ecr_host_re.captures(host) {
                if !is_valid_region(&caps[1])? {
                    return Err(SourceError::InvalidRepository(reference.to_string()));
                }
                validate_name(name, reference)?;
                return Ok(RepositoryRef::Uri {
                    registry: host.to_string(),
                    name: name.to_string(),
                });
            }
            // A first segment ending in a top-level domain names another
            // registry; the service can only pull from the private one.
            let domain_re = Regex::new(r"^([a-z0-9-]+\.)+[a-z]{2,}$")?;
            if host == "localhost" || domain_re.is_match(host) {
                return Err(SourceError::ForeignRegistry(reference.to_string()));
            }
        }

        validate_name(reference, reference)?;
        Ok(RepositoryRef::Name {
            name: reference.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            RepositoryRef::Uri { name, .. }
            | RepositoryRef::Arn { name, .. }
            | RepositoryRef::Name { name } => name,
        }
    }

    /// Registry URI of the repository, without tag.
    pub fn uri(&self, ctx: &DeployContext) -> String {
        match self {
            RepositoryRef::Uri { registry, name } => format!("{registry}/{name}"),
            RepositoryRef::Arn {
                partition,
                region,
                account,
                name,
            } => format!("{}/{name}", ecr_registry(account, region, partition)),
            RepositoryRef::Name { name } => format!("{}/{name}", ctx.ecr_registry()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryRef::Uri { .. } => "uri",
            RepositoryRef::Arn { .. } => "arn",
            RepositoryRef::Name { .. } => "name",
        }
    }
}

fn validate_name(name: &str, reference: &str) -> Result<(), SourceError> {
    let name_re = Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*(?:/[a-z0-9]+(?:[._-][a-z0-9]+)*)*$")?;
    if name_re.is_match(name) {
        Ok(())
    } else {
        Err(SourceError::InvalidRepository(reference.to_string()))
    }
}
