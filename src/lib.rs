// Library root
// ------------
// This crate exposes the pieces of the user creator as a library so the
// batch logic can be exercised without a terminal or a network. The
// binary (`main.rs`) parses arguments and hands a `RunConfig` to `ui::run`.
//
// Module responsibilities:
// - `token`: pulls the management API base URL out of the bearer token.
// - `api`: HTTP transport (real and dry-run) for the management endpoints.
// - `roles`: fetches the assignable roles.
// - `provision`: create-user-then-assign-role for one email.
// - `batch`: email template expansion and the fail-fast batch loop.
// - `store`: merges results into the JSON output file.
// - `cli`: command line arguments and the validated run configuration.
// - `ui`: operator-facing flow (role picker, progress, summary).
pub mod api;
pub mod batch;
pub mod cli;
pub mod error;
pub mod provision;
pub mod roles;
pub mod store;
pub mod token;
pub mod ui;

pub use error::{Error, Result};
