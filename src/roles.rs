// Role lookup. Fetching is done here; the interactive pick lives in `ui`
// so this module stays free of terminal I/O.

use serde::Deserialize;
use tracing::debug;

use crate::api::ManagementApi;
use crate::error::{Error, Result};

/// A role as returned by `GET {api}roles`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Role {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// List the roles available to the token. Anything but a 200 is an error.
pub fn fetch_roles(api: &dyn ManagementApi) -> Result<Vec<Role>> {
    let res = api.list_roles()?;
    if res.status != 200 {
        return Err(Error::Api {
            status: res.status,
            body: res.body,
        });
    }
    let roles: Vec<Role> = serde_json::from_str(&res.body)?;
    debug!(count = roles.len(), "fetched roles");
    Ok(roles)
}

/// Resolve a 1-based menu selection to a role.
pub fn role_at(roles: &[Role], selection: usize) -> Option<&Role> {
    selection.checked_sub(1).and_then(|i| roles.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResponse, AssignRolesRequest, CreateUserRequest, DryRunApi};

    struct RolesOnly(ApiResponse);

    impl ManagementApi for RolesOnly {
        fn list_roles(&self) -> Result<ApiResponse> {
            Ok(self.0.clone())
        }
        fn create_user(&self, _: &CreateUserRequest) -> Result<ApiResponse> {
            unreachable!()
        }
        fn assign_roles(&self, _: &str, _: &AssignRolesRequest) -> Result<ApiResponse> {
            unreachable!()
        }
    }

    #[test]
    fn parses_roles_with_and_without_description() {
        let api = RolesOnly(ApiResponse::new(
            200,
            r#"[{"id":"rol_1","name":"Admin","description":"All"},{"id":"rol_2","name":"Guest"}]"#,
        ));
        let roles = fetch_roles(&api).unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].description(), "All");
        assert_eq!(roles[1].description(), "");
    }

    #[test]
    fn non_200_is_api_error() {
        let api = RolesOnly(ApiResponse::new(403, "insufficient scope"));
        match fetch_roles(&api) {
            Err(Error::Api { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "insufficient scope");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn dry_run_returns_three_fixture_roles() {
        let roles = fetch_roles(&DryRunApi::new("a.b.c", "https://t/api/v2/")).unwrap();
        assert_eq!(roles.len(), 3);
    }

    #[test]
    fn selection_is_one_based() {
        let roles = vec![
            Role {
                id: "a".into(),
                name: "A".into(),
                description: None,
            },
            Role {
                id: "b".into(),
                name: "B".into(),
                description: None,
            },
        ];
        assert!(role_at(&roles, 0).is_none());
        assert_eq!(role_at(&roles, 1).unwrap().id, "a");
        assert_eq!(role_at(&roles, 2).unwrap().id, "b");
        assert!(role_at(&roles, 3).is_none());
    }
}
