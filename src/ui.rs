// UI layer: drives a run from a parsed `RunConfig`, talks to the operator
// (role picker, per-user progress, summary) and persists results. The
// provisioning logic itself lives in `batch`/`provision`.

use anyhow::{bail, Context, Result};
use crossterm::style::Stylize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::api::{ApiClient, DryRunApi, ManagementApi};
use crate::batch::{run_batch, BatchEvent, BatchFailure};
use crate::cli::RunConfig;
use crate::roles::{fetch_roles, role_at, Role};
use crate::store::save_results;
use crate::token::extract_api_url;

/// Run one batch end to end against the live API, or the dry-run
/// stand-in when `--debug` is set.
pub fn run(config: RunConfig) -> Result<()> {
    if config.dry_run {
        println!("=== RUNNING IN DEBUG MODE - NO ACTUAL API CALLS WILL BE MADE ===");
    }

    let api_url = extract_api_url(&config.token).context("invalid management API token")?;
    println!("API URL extracted from token: {api_url}");

    let api: Box<dyn ManagementApi> = if config.dry_run {
        Box::new(DryRunApi::new(&config.token, &api_url))
    } else {
        Box::new(ApiClient::new(&config.token, &api_url)?)
    };

    run_with(api.as_ref(), &config)
}

/// Resolve the role, provision the batch through `api` and persist the
/// successes.
///
/// Whatever was provisioned before a failure is written to the output
/// file before the failure is returned. Nothing is written when no user
/// succeeded.
pub fn run_with(api: &dyn ManagementApi, config: &RunConfig) -> Result<()> {
    let role_id = match &config.role_id {
        Some(id) => id.clone(),
        None => {
            let roles = fetch_roles(api).context("failed to fetch roles")?;
            select_role(&roles)?
        }
    };
    info!(%role_id, "using role");

    // Dry runs print every request, which would fight with a live bar.
    let progress = if config.dry_run {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(config.plan.count());
        bar.set_style(ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")?);
        bar
    };

    // `suspend` also prints when the bar is hidden, unlike `println`.
    let say = |line: String| progress.suspend(|| println!("{line}"));
    let outcome = run_batch(api, &config.plan, &role_id, |event| match event {
        BatchEvent::Started { email } => {
            say(format!("Creating user with email: {email}"));
            progress.set_message(email.to_string());
        }
        BatchEvent::Provisioned { result, .. } => {
            say(format!(
                "  {} User created successfully with ID: {}",
                "✓".green(),
                result.user_id().unwrap_or("<unknown>")
            ));
            progress.inc(1);
        }
        BatchEvent::Rejected { result, .. } => {
            say(format!(
                "  {} Error: {}",
                "✗".red(),
                result.error.as_deref().unwrap_or("provisioning failed")
            ));
        }
        BatchEvent::Aborted { error, .. } => {
            say(format!("  {} Unexpected error: {error}", "✗".red()));
        }
    });
    progress.finish_and_clear();

    if !outcome.results.is_empty() {
        let saved = save_results(&outcome.results, &config.output)
            .with_context(|| format!("failed to write {}", config.output.display()));
        let total = match (saved, &outcome.failure) {
            (Ok(total), _) => total,
            (Err(e), Some(failure)) => return Err(e.context(stopped_at(failure))),
            (Err(e), None) => return Err(e),
        };
        if outcome.is_success() {
            println!(
                "Successfully created {} users. Results saved to {} ({total} total)",
                outcome.results.len(),
                config.output.display()
            );
        } else {
            println!(
                "Saved {} successful results to {} ({total} total)",
                outcome.results.len(),
                config.output.display()
            );
        }
    }

    if let Some(failure) = &outcome.failure {
        bail!(stopped_at(failure));
    }

    if config.dry_run {
        println!("\nNOTE: Since this was run in debug mode, no actual users were created.");
    }
    Ok(())
}

fn stopped_at(failure: &BatchFailure) -> String {
    format!("stopped at {}: {}", failure.email(), failure.message())
}

/// Print the numbered role list and ask for a selection until a valid
/// index is entered. Blocks on stdin with no timeout.
pub fn select_role(roles: &[Role]) -> Result<String> {
    if roles.is_empty() {
        bail!("no roles available to assign");
    }

    println!("\nAvailable roles:");
    for (i, role) in roles.iter().enumerate() {
        if role.description().is_empty() {
            println!("  {}. {} ({})", i + 1, role.name.as_str().bold(), role.id);
        } else {
            println!(
                "  {}. {} ({}) - {}",
                i + 1,
                role.name.as_str().bold(),
                role.id,
                role.description()
            );
        }
    }

    let count = roles.len();
    // `Input` re-prompts on its own when the text does not parse as a number.
    let selection: usize = Input::new()
        .with_prompt(format!("Select a role [1-{count}]"))
        .validate_with(move |n: &usize| -> std::result::Result<(), String> {
            if (1..=count).contains(n) {
                Ok(())
            } else {
                Err(format!("enter a number between 1 and {count}"))
            }
        })
        .interact_text()?;

    match role_at(roles, selection) {
        Some(role) => Ok(role.id.clone()),
        None => bail!("role selection {selection} out of range"),
    }
}
