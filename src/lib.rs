pub mod core;
pub mod orchestration;
pub mod portal;
pub mod security;

pub use crate::core::*;
pub use orchestration::{DeploymentReport, PublishWorkflow, WaitForPublicationWorkflow};
pub use portal::{PortalClient, Transport};
pub use security::{AuthToken, CredentialProvider, EnvCredentialProvider};
