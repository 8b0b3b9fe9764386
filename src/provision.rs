// Provisioning of a single account: create the user, then attach the
// role. The two calls are not transactional; a user whose role could not
// be assigned stays on the server and is reported back as such.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{AssignRolesRequest, CreateUserRequest, ManagementApi};
use crate::error::{Error, Result};

/// Outcome of one provisioning attempt, persisted as-is to the results file.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProvisionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_assigned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the user exists remotely but the role step failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_created: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ProvisionResult {
    pub fn provisioned(user: Value, dry_run: bool) -> Self {
        ProvisionResult {
            success: true,
            user: Some(user),
            role_assigned: Some(true),
            debug_mode: dry_run.then_some(true),
            error: None,
            user_created: None,
            status_code: None,
        }
    }

    pub fn creation_failed(body: &str, status: u16) -> Self {
        ProvisionResult {
            success: false,
            user: None,
            role_assigned: None,
            debug_mode: None,
            error: Some(format!("Failed to create user: {body}")),
            user_created: None,
            status_code: Some(status),
        }
    }

    pub fn assignment_failed(body: &str, user: Value, status: u16) -> Self {
        ProvisionResult {
            success: false,
            user: None,
            role_assigned: None,
            debug_mode: None,
            error: Some(format!("Failed to assign role: {body}")),
            user_created: Some(user),
            status_code: Some(status),
        }
    }

    /// Remote id of the created user, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .or(self.user_created.as_ref())
            .and_then(|u| u.get("user_id"))
            .and_then(Value::as_str)
    }
}

/// Create `email` and assign it `role_id`.
///
/// A rejected call (non-201 on create, non-204 on assign) is reported as an
/// unsuccessful [`ProvisionResult`]; role assignment is skipped when the
/// create step fails. Transport failures and unusable success bodies are
/// returned as `Err`.
pub fn provision(api: &dyn ManagementApi, email: &str, role_id: &str) -> Result<ProvisionResult> {
    let created = api.create_user(&CreateUserRequest::for_email(email))?;
    if created.status != 201 {
        warn!(email, status = created.status, "user creation rejected");
        return Ok(ProvisionResult::creation_failed(&created.body, created.status));
    }

    let user = created.json()?;
    let user_id = user
        .get("user_id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::UnexpectedResponse(format!("created user has no user_id: {}", created.body))
        })?
        .to_string();
    debug!(email, %user_id, "user created");

    let assign = AssignRolesRequest {
        roles: vec![role_id.to_string()],
    };
    let assigned = api.assign_roles(&user_id, &assign)?;
    if assigned.status != 204 {
        warn!(%user_id, status = assigned.status, "role assignment rejected");
        return Ok(ProvisionResult::assignment_failed(&assigned.body, user, assigned.status));
    }

    debug!(%user_id, role_id, "role assigned");
    Ok(ProvisionResult::provisioned(user, api.is_dry_run()))
}
