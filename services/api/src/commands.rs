//! Store-backed subcommands. Each run opens the snapshot file, does one job and exits.

use crate::infra::{parse_date, resolve_store_path};
use applicant_pipeline::config::AppConfig;
use applicant_pipeline::error::AppError;
use applicant_pipeline::telemetry;
use applicant_pipeline::workflows::applicants::{
    ApplicantPipelineService, ApplicantStatusView, BatchReport, RecordId, ResetScope,
    SnapshotStore,
};
use applicant_pipeline::workflows::intake::IntakeImporter;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct StoreArgs {
    /// Snapshot file holding the record store (defaults to PIPELINE_STORE_PATH, then
    /// pipeline-store.json)
    #[arg(long)]
    pub(crate) store: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct RematerializeArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    /// Applicant row whose stored document is written back
    #[arg(long)]
    pub(crate) record_id: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ShortlistArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    /// Date open-ended roles are measured to (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScopeArg {
    Document,
    Classification,
    #[default]
    All,
}

impl ScopeArg {
    pub(crate) fn into_scope(self) -> ResetScope {
        match self {
            ScopeArg::Document => ResetScope::Document,
            ScopeArg::Classification => ResetScope::Classification,
            ScopeArg::All => ResetScope::All,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ResetArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long)]
    pub(crate) record_id: String,
    /// Which stored results to clear
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    pub(crate) scope: ScopeArg,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    /// Intake CSV with one row per experience entry
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct StatusArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    /// Show a single applicant instead of the whole table
    #[arg(long)]
    pub(crate) record_id: Option<String>,
}

struct CommandContext {
    config: AppConfig,
    store: Arc<SnapshotStore>,
}

impl CommandContext {
    fn open(args: StoreArgs) -> Result<Self, AppError> {
        let config = AppConfig::load()?;
        telemetry::init(&config.telemetry)?;

        let path = resolve_store_path(args.store, config.store.snapshot_path.clone());
        let store = Arc::new(SnapshotStore::open(&path)?);
        info!(path = %path.display(), "opened record store snapshot");

        Ok(Self { config, store })
    }

    fn service(&self, as_of: Option<NaiveDate>) -> ApplicantPipelineService<SnapshotStore> {
        let service =
            ApplicantPipelineService::new(self.store.clone(), self.config.shortlist.clone());
        match as_of {
            Some(date) => service.with_evaluation_date(date),
            None => service,
        }
    }
}

pub(crate) fn run_project(args: StoreArgs) -> Result<(), AppError> {
    let context = CommandContext::open(args)?;
    let report = context.service(None).project_all()?;
    render_batch(&report);
    Ok(())
}

pub(crate) fn run_rematerialize(args: RematerializeArgs) -> Result<(), AppError> {
    let RematerializeArgs { store, record_id } = args;
    let context = CommandContext::open(store)?;
    let summary = context
        .service(None)
        .rematerialize(&RecordId::new(record_id.trim()))?;

    println!(
        "Rematerialized {}",
        summary
            .applicant_id
            .as_ref()
            .map(|id| id.0.as_str())
            .unwrap_or(record_id.as_str())
    );
    for (label, writes) in [
        ("personal", &summary.personal),
        ("experience", &summary.experience),
        ("salary", &summary.salary),
    ] {
        println!(
            "- {label}: {} created | {} updated",
            writes.created, writes.updated
        );
    }
    for warning in &summary.warnings {
        println!("  warning: {warning}");
    }
    Ok(())
}

pub(crate) fn run_shortlist(args: ShortlistArgs) -> Result<(), AppError> {
    let ShortlistArgs { store, as_of } = args;
    let context = CommandContext::open(store)?;
    let report = context.service(as_of).shortlist_all()?;
    render_batch(&report);
    Ok(())
}

pub(crate) fn run_reset(args: ResetArgs) -> Result<(), AppError> {
    let ResetArgs {
        store,
        record_id,
        scope,
    } = args;
    let context = CommandContext::open(store)?;
    let view = context
        .service(None)
        .reset(&RecordId::new(record_id.trim()), scope.into_scope())?;
    render_status(&view);
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let ImportArgs { store, csv } = args;
    let context = CommandContext::open(store)?;
    let summary = IntakeImporter::default().import_path(context.store.as_ref(), &csv)?;

    println!(
        "Imported {} applicant(s) from {} ({} already present)",
        summary.imported.len(),
        csv.display(),
        summary.skipped.len()
    );
    for applicant in &summary.imported {
        println!(
            "- {} -> {} ({} experience entries)",
            applicant.applicant_id, applicant.record_id, applicant.experience
        );
    }
    for failure in &summary.failed {
        match &failure.record_id {
            Some(record_id) => println!(
                "- {} failed on {record_id}: {} (re-run the import to resume)",
                failure.applicant_id, failure.error
            ),
            None => println!("- {} failed: {}", failure.applicant_id, failure.error),
        }
    }
    for warning in &summary.warnings {
        println!("  warning: {warning}");
    }
    Ok(())
}

pub(crate) fn run_status(args: StatusArgs) -> Result<(), AppError> {
    let StatusArgs { store, record_id } = args;
    let context = CommandContext::open(store)?;
    let service = context.service(None);

    let views = match record_id {
        Some(record_id) => vec![service.status(&RecordId::new(record_id.trim()))?],
        None => service.statuses()?,
    };
    if views.is_empty() {
        println!("No applicants in the store");
    }
    for view in &views {
        render_status(view);
    }
    Ok(())
}

pub(crate) fn render_batch(report: &BatchReport) {
    println!(
        "{}: {} completed | {} skipped | {} failed",
        report.job, report.completed, report.skipped, report.failed
    );
    for item in &report.items {
        println!("  - {} {:?}: {}", item.record_id, item.status, item.detail);
    }
}

pub(crate) fn render_status(view: &ApplicantStatusView) {
    let status = view
        .status
        .map(|status| status.label())
        .unwrap_or("Unclassified");
    println!(
        "{} ({}) | projected: {} | {}",
        view.applicant_id.as_deref().unwrap_or("<no Application ID>"),
        view.record_id,
        if view.projected { "yes" } else { "no" },
        status
    );
    if let Some(rationale) = &view.rationale {
        println!("  {rationale}");
    }
}
