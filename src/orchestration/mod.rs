//! Orchestration layer for portal publishing
//!
//! The two end-to-end workflows: upload a bundle and wait for validation, and
//! wait for an existing deployment to be published.

pub mod publish;
pub mod report;
pub mod wait_for_publication;

// Re-export main types for convenience
pub use publish::PublishWorkflow;
pub use report::DeploymentReport;
pub use wait_for_publication::WaitForPublicationWorkflow;
