//! Per-subject passes, one function per report kind.
//!
//! Every pass fetches everything it needs before its first store write, so a
//! source failure leaves the store untouched for that subject.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::flags;
use crate::metrics::{defect_ratio, estimate, meetings, progress, velocity, Fold, Vocabulary};
use crate::models::{
    Bucket, Finding, Issue, Metric, Observation, ReportKind, Subject, SubjectKind, UndefinedRatio,
    WeekKey, Worklog,
};
use crate::store::{AggregateStore, Store, StoreError};
use crate::tracker::{IssueQuery, IssueSource, SourceError};

/// What every worker of one run shares.
pub(super) struct RunContext {
    pub source: Arc<dyn IssueSource>,
    pub store: Arc<dyn Store>,
    pub vocabulary: Vocabulary,
    pub now: DateTime<Utc>,
}

impl RunContext {
    /// The bucket point-in-time gauges are written to.
    pub fn current_week(&self) -> Bucket {
        WeekKey::of(&self.now).into()
    }
}

#[derive(Debug)]
pub(super) enum WorkerError {
    Source(SourceError),
    Store(StoreError),
}

impl From<SourceError> for WorkerError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<StoreError> for WorkerError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// What one subject's pass produced.
#[derive(Debug, Default)]
pub(super) struct Outcome {
    pub observations: Vec<Observation>,
    pub undefined_ratios: Vec<UndefinedRatio>,
    pub findings: Vec<Finding>,
    /// The developer's defect ratio, when the pass computed a defined one.
    pub defect_ratio: Option<f64>,
}

impl Outcome {
    fn observe(&mut self, subject: &Subject, metric: Metric, bucket: Bucket, value: f64) {
        self.observations.push(Observation {
            subject: subject.clone(),
            metric,
            bucket,
            value,
        });
    }
}

pub(super) async fn run_subject(
    ctx: &RunContext,
    report: ReportKind,
    subject: &Subject,
) -> Result<Outcome, WorkerError> {
    match report {
        ReportKind::Velocity => velocity_pass(ctx, subject).await,
        ReportKind::DefectRatio => defect_ratio_pass(ctx, subject).await,
        ReportKind::Meetings => meetings_pass(ctx, subject).await,
        ReportKind::EstimateAccuracy => estimate_pass(ctx, subject).await,
        ReportKind::Progress => progress_pass(ctx, subject).await,
        ReportKind::RedFlags => red_flags_pass(ctx, subject).await,
    }
}

async fn assigned_issues(ctx: &RunContext, subject: &Subject) -> Result<Vec<Issue>, SourceError> {
    ctx.source
        .fetch_issues(&IssueQuery::assigned_to(&subject.id))
        .await
}

/// Commit each fold at most once and return every bucket the folds touch,
/// including those of records counted by earlier runs.
fn commit_folds(
    aggregates: &AggregateStore<'_>,
    subject: &Subject,
    folds: &[Fold],
) -> Result<BTreeSet<Bucket>, StoreError> {
    let mut touched = BTreeSet::new();
    for fold in folds {
        let counted = aggregates.fold_once(subject, fold)?;
        tracing::debug!(
            subject = %subject,
            record = %fold.record_id,
            counted,
            "Folded record"
        );
        touched.extend(fold.buckets());
    }
    Ok(touched)
}

// ============================================================
// Velocity
// ============================================================

async fn velocity_pass(ctx: &RunContext, subject: &Subject) -> Result<Outcome, WorkerError> {
    let issues = assigned_issues(ctx, subject).await?;
    let folds: Vec<Fold> = issues
        .iter()
        .filter_map(|issue| velocity::derive(issue, &ctx.vocabulary))
        .collect();

    let aggregates = AggregateStore::new(ctx.store.as_ref());
    let mut outcome = Outcome::default();

    for bucket in commit_folds(&aggregates, subject, &folds)? {
        let total = aggregates.get(Metric::VelocityTotal, subject, &bucket)?;
        let entries = aggregates.get(Metric::VelocityEntries, subject, &bucket)?;
        outcome.observe(subject, Metric::VelocityTotal, bucket.clone(), total);
        outcome.observe(subject, Metric::VelocityEntries, bucket.clone(), entries);

        if let Some(value) = velocity::gauge(total, entries) {
            aggregates.set_gauge(Metric::Velocity, subject, &bucket, value)?;
            outcome.observe(subject, Metric::Velocity, bucket, value);
        }
    }

    Ok(outcome)
}

// ============================================================
// Defect ratio
// ============================================================

async fn defect_ratio_pass(ctx: &RunContext, subject: &Subject) -> Result<Outcome, WorkerError> {
    let issues = assigned_issues(ctx, subject).await?;
    let counts = defect_ratio::count(&issues, &ctx.vocabulary);
    let bucket = ctx.current_week();
    let mut outcome = Outcome::default();

    match counts.ratio() {
        Some(ratio) => {
            AggregateStore::new(ctx.store.as_ref()).set_gauge(
                Metric::DefectRatio,
                subject,
                &bucket,
                ratio,
            )?;
            outcome.observe(subject, Metric::DefectRatio, bucket, ratio);
            outcome.defect_ratio = Some(ratio);
        }
        None => {
            tracing::warn!(subject = %subject, bucket = %bucket, "Defect ratio undefined, nothing delivered");
            outcome.undefined_ratios.push(UndefinedRatio {
                subject: subject.clone(),
                metric: Metric::DefectRatio,
                bucket,
            });
        }
    }

    Ok(outcome)
}

// ============================================================
// Meeting time
// ============================================================

async fn meetings_pass(ctx: &RunContext, subject: &Subject) -> Result<Outcome, WorkerError> {
    let query = IssueQuery::assigned_to(&subject.id)
        .of_type(&ctx.vocabulary.meeting_issue_type)
        .with_status(&ctx.vocabulary.meeting_status);
    let issues = ctx.source.fetch_issues(&query).await?;

    let mut worklogs: Vec<Worklog> = Vec::new();
    for issue in &issues {
        worklogs.extend(ctx.source.fetch_worklogs(&issue.key).await?);
    }
    let folds: Vec<Fold> = worklogs.iter().map(meetings::derive).collect();

    let aggregates = AggregateStore::new(ctx.store.as_ref());
    let mut outcome = Outcome::default();

    for bucket in commit_folds(&aggregates, subject, &folds)? {
        let minutes = aggregates.get(Metric::MeetingMinutes, subject, &bucket)?;
        outcome.observe(subject, Metric::MeetingMinutes, bucket, minutes);
    }

    Ok(outcome)
}

// ============================================================
// Estimate accuracy
// ============================================================

async fn estimate_pass(ctx: &RunContext, subject: &Subject) -> Result<Outcome, WorkerError> {
    let query = IssueQuery::assigned_to(&subject.id).with_status(&ctx.vocabulary.accepted);
    let issues = ctx.source.fetch_issues(&query).await?;

    let aggregates = AggregateStore::new(ctx.store.as_ref());
    let mut outcome = Outcome::default();

    for issue in &issues {
        if let Some(value) = estimate::accuracy(issue, &ctx.vocabulary) {
            let bucket = Bucket::label(&issue.key);
            aggregates.set_gauge(Metric::EstimateAccuracy, subject, &bucket, value)?;
            outcome.observe(subject, Metric::EstimateAccuracy, bucket, value);
        }
    }

    Ok(outcome)
}

// ============================================================
// Release progress
// ============================================================

async fn progress_pass(ctx: &RunContext, subject: &Subject) -> Result<Outcome, WorkerError> {
    let issues = ctx
        .source
        .fetch_issues(&IssueQuery::in_project(&subject.id))
        .await?;
    let folds: Vec<Fold> = issues
        .iter()
        .flat_map(|issue| progress::derive(issue, &ctx.vocabulary))
        .collect();

    let aggregates = AggregateStore::new(ctx.store.as_ref());
    let mut outcome = Outcome::default();

    for bucket in commit_folds(&aggregates, subject, &folds)? {
        let complete = aggregates.get(Metric::ProgressComplete, subject, &bucket)?;
        let total = aggregates.get(Metric::ProgressTotal, subject, &bucket)?;
        outcome.observe(subject, Metric::ProgressTotal, bucket.clone(), total);
        outcome.observe(subject, Metric::ProgressComplete, bucket.clone(), complete);

        if let Some(value) = progress::gauge(complete, total) {
            aggregates.set_gauge(Metric::Progress, subject, &bucket, value)?;
            outcome.observe(subject, Metric::Progress, bucket, value);
        }
    }

    Ok(outcome)
}

// ============================================================
// Red flags
// ============================================================

async fn red_flags_pass(ctx: &RunContext, subject: &Subject) -> Result<Outcome, WorkerError> {
    let findings = match subject.kind {
        SubjectKind::Project => ctx
            .source
            .fetch_issues(&IssueQuery::in_project(&subject.id))
            .await?
            .iter()
            .flat_map(|issue| flags::recent_edits(issue, subject, &ctx.vocabulary, ctx.now))
            .collect(),
        _ => assigned_issues(ctx, subject)
            .await?
            .iter()
            .flat_map(|issue| flags::inspect(issue, subject, &ctx.vocabulary))
            .collect(),
    };

    Ok(Outcome {
        findings,
        ..Outcome::default()
    })
}
