// Command line surface. Arguments are parsed once into `Cli` and turned
// into a `RunConfig`; nothing downstream looks at the process arguments
// or environment again.

use std::path::PathBuf;

use clap::Parser;

use crate::batch::BatchPlan;
use crate::error::Result;
use crate::store::DEFAULT_OUTPUT;

/// Create Auth0 users with incremental emails
#[derive(Parser, Debug, Clone)]
#[command(name = "auth0-user-creator", version, about, long_about = None)]
pub struct Cli {
    /// Auth0 Management API token
    #[arg(long, env = "AUTH0_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Email template with {$} placeholder
    #[arg(long)]
    pub email: String,

    /// Starting number for email replacement
    #[arg(long, allow_negative_numbers = true)]
    pub start: i64,

    /// Ending number for email replacement
    #[arg(long, allow_negative_numbers = true)]
    pub end: i64,

    /// Role ID to assign to users; prompts from the role list when omitted
    #[arg(long, env = "AUTH0_ROLE_ID")]
    pub role_id: Option<String>,

    /// Output file for successful responses
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Run in debug mode without making actual API calls
    #[arg(long)]
    pub debug: bool,
}

/// Everything a run needs, with the template and range already validated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub token: String,
    pub plan: BatchPlan,
    pub role_id: Option<String>,
    pub output: PathBuf,
    pub dry_run: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<RunConfig> {
        let plan = BatchPlan::new(&self.email, self.start, self.end)?;
        Ok(RunConfig {
            token: self.token,
            plan,
            role_id: self.role_id.filter(|id| !id.trim().is_empty()),
            output: self.output,
            dry_run: self.debug,
        })
    }
}
