//! Scripted portal used by state machine and workflow tests

use crate::core::error::{PortalError, Result};
use crate::core::traits::{Bundle, DeploymentState, PortalApi, StatusResponse};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

pub(crate) const DEPLOYMENT_ID: &str = "dep-1";

pub(crate) fn status(state: DeploymentState) -> StatusResponse {
    StatusResponse {
        deployment_id: DEPLOYMENT_ID.to_string(),
        deployment_name: Some("bundle.zip".to_string()),
        deployment_state: state,
        purls: None,
        errors: None,
    }
}

pub(crate) fn failed_status(errors: &[(&str, &[&str])]) -> StatusResponse {
    let errors: IndexMap<String, Vec<String>> = errors
        .iter()
        .map(|(category, reasons)| {
            (
                category.to_string(),
                reasons.iter().map(|r| r.to_string()).collect(),
            )
        })
        .collect();

    StatusResponse {
        errors: Some(errors),
        ..status(DeploymentState::Failed)
    }
}

/// Replays queued status results, then repeats `fallback` forever
#[derive(Default)]
pub(crate) struct ScriptedPortal {
    upload: Mutex<Option<Result<String>>>,
    statuses: Mutex<VecDeque<Result<StatusResponse>>>,
    fallback: Option<StatusResponse>,
    upload_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl ScriptedPortal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_upload(self, result: Result<String>) -> Self {
        *self.upload.lock().unwrap() = Some(result);
        self
    }

    pub(crate) fn then_state(self, state: DeploymentState) -> Self {
        self.then_status(status(state))
    }

    pub(crate) fn then_status(self, response: StatusResponse) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub(crate) fn then_error(self, error: PortalError) -> Self {
        self.statuses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn repeating(mut self, state: DeploymentState) -> Self {
        self.fallback = Some(status(state));
        self
    }

    pub(crate) fn upload_calls(&self) -> u32 {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PortalApi for ScriptedPortal {
    async fn upload_bundle(&self, _bundle: &Bundle) -> Result<String> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.upload
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(DEPLOYMENT_ID.to_string()))
    }

    async fn get_status(&self, deployment_id: &str) -> Result<StatusResponse> {
        assert_eq!(deployment_id, DEPLOYMENT_ID);
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(next) = self.statuses.lock().unwrap().pop_front() {
            return next;
        }

        match &self.fallback {
            Some(response) => Ok(response.clone()),
            None => panic!("status script exhausted"),
        }
    }
}
