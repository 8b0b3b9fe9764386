// Batch runner: expand an email template over a numeric range and
// provision each address in order, stopping at the first failure.
//
// The runner does no file or process handling; it returns what it
// collected together with how the run ended and leaves persistence and
// the exit code to the caller.

use std::ops::RangeInclusive;

use tracing::{debug, info};

use crate::api::ManagementApi;
use crate::error::{Error, Result};
use crate::provision::{provision, ProvisionResult};

/// Placeholder replaced by the sequence number in an email template.
pub const PLACEHOLDER: &str = "{$}";

/// Email address pattern such as `qa+{$}@example.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate(String);

impl EmailTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        if !template.contains(PLACEHOLDER) {
            return Err(Error::Validation(format!(
                "email template must contain {PLACEHOLDER} placeholder"
            )));
        }
        Ok(EmailTemplate(template.to_string()))
    }

    /// Substitute `n` for every placeholder occurrence.
    pub fn render(&self, n: i64) -> String {
        self.0.replace(PLACEHOLDER, &n.to_string())
    }
}

/// A validated template plus the inclusive range to expand it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    template: EmailTemplate,
    start: i64,
    end: i64,
}

impl BatchPlan {
    pub fn new(template: &str, start: i64, end: i64) -> Result<Self> {
        let template = EmailTemplate::parse(template)?;
        if start > end {
            return Err(Error::Validation(
                "start number must be less than or equal to end number".into(),
            ));
        }
        Ok(BatchPlan {
            template,
            start,
            end,
        })
    }

    pub fn range(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }

    /// Number of addresses the plan expands to.
    pub fn count(&self) -> u64 {
        self.end.abs_diff(self.start).saturating_add(1)
    }

    /// Addresses in ascending sequence order.
    pub fn emails(&self) -> impl Iterator<Item = String> + '_ {
        self.range().map(|n| self.template.render(n))
    }
}

/// Progress notifications emitted while the batch runs.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Started { email: &'a str },
    Provisioned { email: &'a str, result: &'a ProvisionResult },
    Rejected { email: &'a str, result: &'a ProvisionResult },
    Aborted { email: &'a str, error: &'a Error },
}

/// Why a batch stopped before reaching the end of its range.
#[derive(Debug)]
pub enum BatchFailure {
    /// The API refused one of the two provisioning calls.
    Rejected { email: String, result: ProvisionResult },
    /// The attempt could not complete (network failure, bad response body).
    Aborted { email: String, error: Error },
}

impl BatchFailure {
    pub fn email(&self) -> &str {
        match self {
            BatchFailure::Rejected { email, .. } | BatchFailure::Aborted { email, .. } => email,
        }
    }

    pub fn message(&self) -> String {
        match self {
            BatchFailure::Rejected { result, .. } => result
                .error
                .clone()
                .unwrap_or_else(|| "provisioning failed".to_string()),
            BatchFailure::Aborted { error, .. } => error.to_string(),
        }
    }
}

/// Everything a batch produced: the successes in order, and the failure
/// that stopped it, if any.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<ProvisionResult>,
    pub failure: Option<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Provision every address of `plan` with `role_id`, one at a time.
///
/// Each attempt finishes before the next begins. The first rejected or
/// aborted attempt ends the batch; results collected up to that point are
/// returned alongside the failure.
pub fn run_batch<F>(
    api: &dyn ManagementApi,
    plan: &BatchPlan,
    role_id: &str,
    mut on_event: F,
) -> BatchOutcome
where
    F: FnMut(BatchEvent<'_>),
{
    let mut results = Vec::new();
    info!(total = plan.count(), "starting batch");

    for email in plan.emails() {
        on_event(BatchEvent::Started { email: &email });

        match provision(api, &email, role_id) {
            Ok(result) if result.success => {
                on_event(BatchEvent::Provisioned {
                    email: &email,
                    result: &result,
                });
                results.push(result);
            }
            Ok(result) => {
                on_event(BatchEvent::Rejected {
                    email: &email,
                    result: &result,
                });
                return BatchOutcome {
                    results,
                    failure: Some(BatchFailure::Rejected { email, result }),
                };
            }
            Err(error) => {
                on_event(BatchEvent::Aborted {
                    email: &email,
                    error: &error,
                });
                return BatchOutcome {
                    results,
                    failure: Some(BatchFailure::Aborted { email, error }),
                };
            }
        }
    }

    debug!(provisioned = results.len(), "batch complete");
    BatchOutcome {
        results,
        failure: None,
    }
}
