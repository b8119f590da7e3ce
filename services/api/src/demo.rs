use crate::commands::{render_batch, render_status};
use applicant_pipeline::error::AppError;
use applicant_pipeline::workflows::applicants::schema::{self, Schema};
use applicant_pipeline::workflows::applicants::{
    ApplicantDocument, ApplicantPipelineService, FieldValue, Fields, MemoryRecordStore,
    RecordStore, ShortlistCriteria, ShortlistOutcome,
};
use applicant_pipeline::workflows::intake::IntakeImporter;
use chrono::{NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;

const DEMO_SHEET: &str = "\
Application ID,Full Name,Email,Location,LinkedIn URL,Company Name,Job Title,Start Date,End Date,Technologies,Preferred Hourly Rate,Minimum Hourly Rate,Currency,Weekly Availability
APP-1001,Priya Natarajan,priya@example.com,\"Bengaluru, India\",https://www.linkedin.com/in/priya,Infosys,Senior Engineer,2016-04-01,2020-03-31,Java; Kafka,3500,3000,INR,40
APP-1001,,,,,Razorpay,Staff Engineer,2020-04-01,,Rust; Kafka; Postgres,,,,
APP-1002,Liam O'Connor,liam@example.com,\"Dublin, Ireland\",,Stripe,Engineer,2019-01-01,,Ruby; Go,95,80,EUR,35
APP-1003,Maya Chen,maya@example.com,\"Seattle, USA\",,Amazon,SDE I,2023-06-01,,TypeScript,210,180,USD,40
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date open-ended roles are measured to (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Skip the document edit and rematerialization portion of the demo.
    #[arg(long)]
    pub(crate) skip_rematerialize: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        as_of,
        skip_rematerialize,
    } = args;
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

    println!("Applicant pipeline demo (evaluated as of {as_of})");
    let store = Arc::new(MemoryRecordStore::new());
    let summary = IntakeImporter::default().import_reader(store.as_ref(), DEMO_SHEET.as_bytes())?;
    println!(
        "- Seeded {} applicants from the intake sheet",
        summary.imported.len()
    );

    let service = ApplicantPipelineService::new(store.clone(), ShortlistCriteria::default())
        .with_evaluation_date(as_of);

    println!("\nNew application flow");
    for applicant in &summary.imported {
        let report = service.process_new_application(&applicant.record_id)?;
        match &report.shortlist {
            ShortlistOutcome::Classified {
                classification,
                lead,
            } => {
                println!(
                    "- {} -> {}{}",
                    applicant.applicant_id,
                    classification.status.label(),
                    lead.as_ref()
                        .map(|lead| format!(" (lead {lead})"))
                        .unwrap_or_default()
                );
                println!("  {}", classification.rationale);
            }
            other => println!("- {} -> {}", applicant.applicant_id, other.label()),
        }
    }

    println!("\nRe-running the batch leaves classified applicants alone");
    render_batch(&service.shortlist_all()?);

    if skip_rematerialize {
        return Ok(());
    }

    let Some(first) = summary.imported.first() else {
        return Ok(());
    };
    println!("\nEditing the stored document of {}", first.applicant_id);
    let tables = Schema::default();
    let applicant = store.get_record(&tables.applicants, &first.record_id)?;
    let Some(raw) = applicant.text(schema::applicant::DOCUMENT) else {
        println!("  No stored document to edit");
        return Ok(());
    };
    let mut document = match ApplicantDocument::from_json(raw) {
        Ok(document) => document,
        Err(err) => {
            println!("  Stored document unreadable: {err}");
            return Ok(());
        }
    };
    if let Some(salary) = document.salary.as_mut() {
        salary.weekly_availability = Some(30.0);
    }
    match document.to_json() {
        Ok(json) => {
            let mut fields = Fields::new();
            fields.insert(schema::applicant::DOCUMENT.to_string(), FieldValue::text(json));
            store.update_record(&tables.applicants, &first.record_id, fields)?;
        }
        Err(err) => {
            println!("  Document could not be encoded: {err}");
            return Ok(());
        }
    }

    let writes = service.rematerialize(&first.record_id)?;
    println!(
        "- Rematerialized: {} created | {} updated",
        writes.total_created(),
        writes.total_updated()
    );

    println!("\nFinal state");
    for view in service.statuses()? {
        render_status(&view);
    }
    Ok(())
}
