//! Concurrent evaluation of one domain.
//!
//! Every mechanism runs as its own task in a `JoinSet`, bounded by the
//! per-mechanism timeout. The join is bounded by the global ceiling; when it
//! expires the set is dropped, which aborts whatever is still running, and
//! each missing mandatory mechanism is reported as `unknown`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, error, info, warn};
use strum::IntoEnumIterator;
use tokio::task::JoinSet;

use crate::config::EvaluatorConfig;
use crate::dns::{DnsResolver, ResolverAdapter};
use crate::domain::Domain;
use crate::error_handling::EvaluationError;
use crate::evaluate::{
    apply_bimi_prerequisite, check_bimi, check_dkim, check_dmarc, check_mta_sts, check_mx,
    check_spf, PolicyFetcher,
};
use crate::report::{build_report, MechanismKind, MechanismResult, Outcomes, SecurityReport};

type TaskOutput = (MechanismKind, Result<Option<MechanismResult>, EvaluationError>);

/// Evaluates domains. Cheap to clone; clones share nothing mutable.
#[derive(Clone)]
pub struct Evaluator<R, F> {
    dns: ResolverAdapter<R>,
    fetcher: F,
    config: Arc<EvaluatorConfig>,
}

impl<R: DnsResolver, F: PolicyFetcher> Evaluator<R, F> {
    pub fn new(resolver: R, fetcher: F, config: EvaluatorConfig) -> Self {
        Self {
            dns: ResolverAdapter::new(resolver, &config),
            fetcher,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Validates `input` and evaluates all six mechanisms concurrently.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::InvalidDomain` before any network call when the
    /// input is not a domain name, and `EvaluationError::NxDomain` when the
    /// domain does not exist. Every other failure is reported inside the report.
    pub async fn evaluate(&self, input: &str) -> Result<SecurityReport, EvaluationError> {
        let domain = Domain::parse(input)?;
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.global_timeout;

        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
        for kind in MechanismKind::iter() {
            let this = self.clone();
            let domain = domain.clone();
            tasks.spawn(async move {
                let outcome = match tokio::time::timeout(
                    this.config.mechanism_timeout,
                    this.run_mechanism(kind, &domain),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(
                            "{kind} check for {domain} timed out after {:?}",
                            this.config.mechanism_timeout
                        );
                        Ok(kind
                            .is_mandatory()
                            .then(|| unfinished(kind, format!("{kind} check timed out"))))
                    }
                };
                (kind, outcome)
            });
        }

        let mut outcomes = Outcomes::new();
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((kind, Ok(result))))) => {
                    debug!("{kind} for {domain} finished");
                    outcomes.post(kind, result);
                }
                Ok(Some(Ok((kind, Err(fatal))))) => {
                    info!("Aborting evaluation of {domain}: {kind} reported {fatal}");
                    return Err(fatal);
                }
                Ok(Some(Err(e))) => error!("Mechanism task for {domain} failed: {e}"),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Evaluation of {domain} reached the {:?} ceiling with {} check(s) unfinished",
                        self.config.global_timeout,
                        tasks.len()
                    );
                    break;
                }
            }
        }
        // Dropping the set aborts unfinished tasks; their results are never posted
        drop(tasks);

        for kind in MechanismKind::iter().filter(MechanismKind::is_mandatory) {
            if !outcomes.is_filled(kind) {
                outcomes.post(
                    kind,
                    Some(unfinished(kind, format!("{kind} check did not finish before the evaluation deadline"))),
                );
            }
        }

        let dmarc = outcomes.get(MechanismKind::Dmarc).cloned();
        if let Some(bimi) = outcomes.get_mut(MechanismKind::Bimi) {
            apply_bimi_prerequisite(bimi, dmarc.as_ref());
        }

        let report = build_report(&domain, outcomes, Utc::now());
        info!(
            "Evaluated {domain}: score {} ({}) in {:.2}s",
            report.overall_score,
            report.compliance_level,
            started.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    async fn run_mechanism(
        &self,
        kind: MechanismKind,
        domain: &Domain,
    ) -> Result<Option<MechanismResult>, EvaluationError> {
        let result = match kind {
            MechanismKind::Spf => Some(check_spf(&self.dns, domain, &self.config).await?),
            MechanismKind::Dkim => Some(check_dkim(&self.dns, domain, &self.config).await),
            MechanismKind::Dmarc => Some(check_dmarc(&self.dns, domain).await),
            MechanismKind::Mx => Some(check_mx(&self.dns, domain).await?),
            MechanismKind::Bimi => check_bimi(&self.dns, domain, &self.config.bimi_selector).await,
            MechanismKind::MtaSts => check_mta_sts(&self.dns, &self.fetcher, domain).await,
        };
        Ok(result)
    }
}

fn unfinished(kind: MechanismKind, message: String) -> MechanismResult {
    let result = MechanismResult::unknown(message);
    if kind == MechanismKind::Mx {
        result.with_records(Vec::new())
    } else {
        result
    }
}
