// API client module: a small blocking HTTP client for the identity
// platform's management API, plus a dry-run stand-in that prints the
// requests it would have sent and answers with canned data.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_CONNECTION: &str = "Username-Password-Authentication";
pub const TEMPORARY_PASSWORD: &str = "Temp1234!";

/// Raw answer from the management API. Status interpretation is left to
/// the caller since each endpoint has its own success code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Payload for `POST {api}users`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CreateUserRequest {
    pub email: String,
    pub connection: String,
    pub password: String,
    pub email_verified: bool,
}

impl CreateUserRequest {
    pub fn for_email(email: &str) -> Self {
        CreateUserRequest {
            email: email.to_string(),
            connection: DEFAULT_CONNECTION.to_string(),
            password: TEMPORARY_PASSWORD.to_string(),
            email_verified: true,
        }
    }
}

/// Payload for `POST {api}users/{id}/roles`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AssignRolesRequest {
    pub roles: Vec<String>,
}

/// The three management endpoints the tool talks to.
pub trait ManagementApi {
    fn list_roles(&self) -> Result<ApiResponse>;
    fn create_user(&self, req: &CreateUserRequest) -> Result<ApiResponse>;
    fn assign_roles(&self, user_id: &str, req: &AssignRolesRequest) -> Result<ApiResponse>;

    /// Whether responses are synthesized rather than fetched.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Blocking client that holds a reqwest client, the API base URL taken
/// from the token audience and the bearer headers built from the token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl ApiClient {
    /// Build a client for `base_url`. No request timeout is configured:
    /// every call blocks until the server answers or the connection fails.
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.to_string(),
            headers: auth_headers(token)?,
        })
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        let url = self.url(path);
        debug!(%url, "POST");
        let res = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()?;
        read_response(res)
    }
}

impl ManagementApi for ApiClient {
    fn list_roles(&self) -> Result<ApiResponse> {
        let url = self.url("roles");
        debug!(%url, "GET");
        let res = self.client.get(&url).headers(self.headers.clone()).send()?;
        read_response(res)
    }

    fn create_user(&self, req: &CreateUserRequest) -> Result<ApiResponse> {
        self.post("users", req)
    }

    fn assign_roles(&self, user_id: &str, req: &AssignRolesRequest) -> Result<ApiResponse> {
        self.post(&format!("users/{user_id}/roles"), req)
    }
}

fn read_response(res: reqwest::blocking::Response) -> Result<ApiResponse> {
    let status = res.status().as_u16();
    let body = res.text()?;
    debug!(status, body = %body, "response");
    Ok(ApiResponse { status, body })
}

/// Headers sent with every call: bearer auth and a JSON content type.
pub fn auth_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}"))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Resource URL under the API base. The base is used as-is, so it is
/// expected to end with a slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}")
}

/// Stand-in for [`ApiClient`] used with `--debug`. Nothing leaves the
/// machine; each request is printed to stdout with the response that was
/// synthesized for it.
pub struct DryRunApi {
    base_url: String,
    token: String,
}

impl DryRunApi {
    pub fn new(token: &str, base_url: &str) -> Self {
        DryRunApi {
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }

    fn print_request(&self, title: &str, path: &str, payload: Option<&Value>) {
        let headers = json!({
            "Authorization": format!("Bearer {}", self.token),
            "Content-Type": "application/json",
        });
        println!("\n=== DEBUG: {title} ===");
        println!("URL: {}", endpoint(&self.base_url, path));
        println!("Headers: {}", pretty(&headers));
        if let Some(payload) = payload {
            println!("Payload: {}", pretty(payload));
        }
    }
}

impl ManagementApi for DryRunApi {
    fn list_roles(&self) -> Result<ApiResponse> {
        self.print_request("Role Listing Request", "roles", None);
        let roles = fixture_roles();
        println!("Mock Response: {}", pretty(&roles));
        Ok(ApiResponse::new(200, roles.to_string()))
    }

    fn create_user(&self, req: &CreateUserRequest) -> Result<ApiResponse> {
        self.print_request("User Creation Request", "users", Some(&serde_json::to_value(req)?));
        let user = mock_user(&req.email);
        println!("Mock Response: {}", pretty(&user));
        Ok(ApiResponse::new(201, user.to_string()))
    }

    fn assign_roles(&self, user_id: &str, req: &AssignRolesRequest) -> Result<ApiResponse> {
        self.print_request(
            "Role Assignment Request",
            &format!("users/{user_id}/roles"),
            Some(&serde_json::to_value(req)?),
        );
        println!("Mock Response: No content (204)");
        Ok(ApiResponse::new(204, ""))
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

/// Deterministic user id for a dry run: `auth0|debug-` followed by the
/// email with `@` spelled out as `-at-`.
pub fn mock_user_id(email: &str) -> String {
    format!("auth0|debug-{}", email.replace('@', "-at-"))
}

/// User object a real create call would return for `email`.
pub fn mock_user(email: &str) -> Value {
    let user_id = mock_user_id(email);
    let identity_id = user_id.split_once('|').map_or(user_id.as_str(), |(_, id)| id);
    json!({
        "user_id": user_id,
        "email": email,
        "email_verified": true,
        "created_at": "2023-01-01T00:00:00.000Z",
        "updated_at": "2023-01-01T00:00:00.000Z",
        "identities": [
            {
                "connection": DEFAULT_CONNECTION,
                "user_id": identity_id,
                "provider": "auth0",
                "isSocial": false
            }
        ]
    })
}

fn fixture_roles() -> Value {
    json!([
        { "id": "rol_debug_admin", "name": "Admin", "description": "Full administrative access" },
        { "id": "rol_debug_editor", "name": "Editor", "description": "Can create and edit content" },
        { "id": "rol_debug_viewer", "name": "Viewer", "description": "Read-only access" }
    ])
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_concatenates_without_normalizing() {
        assert_eq!(
            endpoint("https://t.auth0.com/api/v2/", "users"),
            "https://t.auth0.com/api/v2/users"
        );
        assert_eq!(endpoint("https://t/api/v2", "roles"), "https://t/api/v2roles");
    }

    #[test]
    fn headers_carry_bearer_and_json() {
        let headers = auth_headers("abc.def.ghi").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc.def.ghi");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn token_with_newline_is_rejected_as_header() {
        assert!(auth_headers("abc\ndef").is_err());
    }

    #[test]
    fn create_user_payload_shape() {
        let body = serde_json::to_value(CreateUserRequest::for_email("a@b.io")).unwrap();
        assert_eq!(
            body,
            json!({
                "email": "a@b.io",
                "connection": "Username-Password-Authentication",
                "password": "Temp1234!",
                "email_verified": true
            })
        );
    }

    #[test]
    fn mock_user_is_deterministic() {
        assert_eq!(mock_user_id("u1@x.com"), "auth0|debug-u1-at-x.com");
        let user = mock_user("u1@x.com");
        assert_eq!(user["user_id"], "auth0|debug-u1-at-x.com");
        assert_eq!(user["identities"][0]["user_id"], "debug-u1-at-x.com");
        assert_eq!(user, mock_user("u1@x.com"));
    }

    #[test]
    fn dry_run_answers_with_success_codes() {
        let api = DryRunApi::new("t.o.k", "https://t.auth0.com/api/v2/");
        assert!(api.is_dry_run());

        let roles = api.list_roles().unwrap();
        assert_eq!(roles.status, 200);
        assert_eq!(roles.json().unwrap().as_array().unwrap().len(), 3);

        let created = api.create_user(&CreateUserRequest::for_email("a@b.io")).unwrap();
        assert_eq!(created.status, 201);
        assert_eq!(created.json().unwrap()["email"], "a@b.io");

        let assigned = api
            .assign_roles(
                "auth0|debug-a-at-b.io",
                &AssignRolesRequest {
                    roles: vec!["rol_1".into()],
                },
            )
            .unwrap();
        assert_eq!(assigned.status, 204);
    }
}
