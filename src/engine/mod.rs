//! Aggregation orchestrator.
//!
//! One invocation moves `Idle → Dispatching → AwaitingWorkers → Done`:
//! the roster is registered in the store, one worker per subject is spawned
//! into a semaphore-bounded pool, and the orchestrator joins them all into a
//! [`RunReport`]. A subject whose source fetch fails is recorded and skipped;
//! a store failure aborts the remaining workers and fails the run.

mod workers;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::{Config, Roster};
use crate::metrics::{defect_ratio, Vocabulary};
use crate::models::{Metric, Observation, ReportKind, RunReport, Subject, SubjectFailure, UndefinedRatio};
use crate::store::{keys, AggregateStore, Store, StoreError};
use crate::tracker::IssueSource;

use workers::{Outcome, RunContext, WorkerError};

const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Dispatching,
    AwaitingWorkers,
    Done,
}

pub struct Orchestrator {
    source: Arc<dyn IssueSource>,
    store: Arc<dyn Store>,
    roster: Roster,
    vocabulary: Vocabulary,
    max_concurrency: usize,
    phase: RunPhase,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn IssueSource>, store: Arc<dyn Store>, roster: Roster) -> Self {
        Self {
            source,
            store,
            roster,
            vocabulary: Vocabulary::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            phase: RunPhase::Idle,
        }
    }

    pub fn from_config(config: &Config, source: Arc<dyn IssueSource>, store: Arc<dyn Store>) -> Self {
        Self::new(source, store, config.roster())
            .with_vocabulary(config.vocabulary.clone())
            .with_max_concurrency(config.max_concurrency)
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub async fn run(&mut self, report: ReportKind) -> Result<RunReport, RunError> {
        self.run_at(report, Utc::now()).await
    }

    /// Run with an explicit clock. `now` picks the week for point-in-time
    /// gauges and the reference time for recent-edit checks.
    pub async fn run_at(
        &mut self,
        report: ReportKind,
        now: DateTime<Utc>,
    ) -> Result<RunReport, RunError> {
        let result = self.execute(report, now).await;
        self.phase = RunPhase::Done;
        result
    }

    async fn execute(&mut self, report: ReportKind, now: DateTime<Utc>) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.phase = RunPhase::Dispatching;
        self.register_roster()?;

        let subjects: Vec<Subject> = report
            .subject_kinds()
            .iter()
            .flat_map(|kind| self.roster.subjects(*kind))
            .collect();
        tracing::info!(
            run_id = %run_id,
            report = report.as_str(),
            subjects = subjects.len(),
            max_concurrency = self.max_concurrency,
            "Dispatching workers"
        );

        let ctx = Arc::new(RunContext {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            vocabulary: self.vocabulary.clone(),
            now,
        });
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut pool = JoinSet::new();

        for subject in subjects {
            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            pool.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = workers::run_subject(&ctx, report, &subject).await;
                (subject, result)
            });
        }

        self.phase = RunPhase::AwaitingWorkers;

        let mut succeeded = 0;
        let mut observations = Vec::new();
        let mut undefined_ratios = Vec::new();
        let mut findings = Vec::new();
        let mut failures = Vec::new();
        let mut defect_ratios: HashMap<String, f64> = HashMap::new();

        while let Some(joined) = pool.join_next().await {
            let (subject, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    pool.abort_all();
                    tracing::error!(run_id = %run_id, error = %e, "Worker task failed, aborting run");
                    return Err(RunError::Worker(e.to_string()));
                }
            };

            match result {
                Ok(outcome) => {
                    succeeded += 1;
                    if let Some(ratio) = outcome.defect_ratio {
                        defect_ratios.insert(subject.id.clone(), ratio);
                    }
                    let Outcome {
                        observations: o,
                        undefined_ratios: u,
                        findings: f,
                        ..
                    } = outcome;
                    observations.extend(o);
                    undefined_ratios.extend(u);
                    findings.extend(f);
                }
                Err(WorkerError::Source(e)) => {
                    tracing::warn!(run_id = %run_id, subject = %subject, error = %e, "Subject pass abandoned");
                    failures.push(SubjectFailure {
                        subject,
                        report,
                        error: e.to_string(),
                    });
                }
                Err(WorkerError::Store(e)) => {
                    pool.abort_all();
                    tracing::error!(run_id = %run_id, subject = %subject, error = %e, "Store unavailable, aborting run");
                    return Err(RunError::StoreUnavailable(e));
                }
            }
        }

        if report == ReportKind::DefectRatio {
            self.team_defect_ratios(&ctx, &defect_ratios, &mut observations, &mut undefined_ratios)?;
        }

        observations.sort_by(|a, b| {
            (&a.subject, a.metric.as_str(), &a.bucket).cmp(&(&b.subject, b.metric.as_str(), &b.bucket))
        });
        findings.sort_by(|a, b| (&a.subject, &a.issue_key).cmp(&(&b.subject, &b.issue_key)));

        let report = RunReport {
            run_id,
            report,
            started_at,
            finished_at: Utc::now(),
            succeeded,
            failed: failures.len(),
            observations,
            failures,
            undefined_ratios,
            findings,
        };

        tracing::info!(
            run_id = %run_id,
            succeeded = report.succeeded,
            failed = report.failed,
            observations = report.observations.len(),
            "Run complete"
        );
        Ok(report)
    }

    /// Record every developer, team, team membership and project.
    fn register_roster(&self) -> Result<(), StoreError> {
        for developer in self.roster.developers() {
            self.store.add_member(keys::DEVELOPERS, &developer)?;
        }
        for team in &self.roster.teams {
            self.store.add_member(keys::TEAMS, &team.name)?;
            let members_key = keys::team_members_key(&team.name);
            for member in &team.members {
                self.store.add_member(&members_key, member)?;
            }
        }
        for project in &self.roster.projects {
            self.store.add_member(keys::PROJECTS, project)?;
        }
        Ok(())
    }

    /// A team's ratio is the mean of its members' defined ratios.
    fn team_defect_ratios(
        &self,
        ctx: &RunContext,
        ratios: &HashMap<String, f64>,
        observations: &mut Vec<Observation>,
        undefined_ratios: &mut Vec<UndefinedRatio>,
    ) -> Result<(), StoreError> {
        let aggregates = AggregateStore::new(self.store.as_ref());
        let bucket = ctx.current_week();

        for team in &self.roster.teams {
            let subject = Subject::team(&team.name);
            let member_ratios: Vec<f64> = team
                .members
                .iter()
                .filter_map(|member| ratios.get(member).copied())
                .collect();

            match defect_ratio::mean(&member_ratios) {
                Some(value) => {
                    aggregates.set_gauge(Metric::DefectRatio, &subject, &bucket, value)?;
                    observations.push(Observation {
                        subject,
                        metric: Metric::DefectRatio,
                        bucket: bucket.clone(),
                        value,
                    });
                }
                None => {
                    tracing::warn!(team = %team.name, "No member has a defined defect ratio");
                    undefined_ratios.push(UndefinedRatio {
                        subject,
                        metric: Metric::DefectRatio,
                        bucket: bucket.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
