//! linestack-synth — the deployment descriptor and its renderings.
//!
//! Evaluates the fixed resource graph for the LINE bot service (two roles,
//! one container service, one table, one grant, one output), checks the
//! invariants the deployed service depends on, and renders a
//! CloudFormation template for the provisioning engine.
//!
//! # Pipeline
//!
//! ```text
//! (DeployContext, RepositoryRef)
//!   └── build_descriptor() → Descriptor
//!         ├── verify()      → invariants (table name, secrets, references)
//!         ├── lint()        → platform-limit findings
//!         └── synthesize()  → Template (JSON + fingerprint)
//! ```
//!
//! Evaluation performs no I/O. Secret and image resolution happen when the
//! template is applied, and a failure there aborts the whole deployment.

pub mod descriptor;
pub mod error;
pub mod health;
pub mod report;
pub mod template;
pub mod verify;

pub use descriptor::{build_descriptor, Descriptor};
pub use error::{DescriptorError, DescriptorResult};
pub use health::{HealthStatus, HealthTracker, ProbeResult};
pub use template::{synthesize, Template};
pub use verify::{has_errors, lint, verify, Finding, Severity};
