use crate::commands::{
    run_import, run_project, run_rematerialize, run_reset, run_shortlist, run_status, ImportArgs,
    RematerializeArgs, ResetArgs, ShortlistArgs, StatusArgs, StoreArgs,
};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use applicant_pipeline::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Applicant Pipeline",
    about = "Project, rematerialize and shortlist applicants from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Build and store the document for every applicant that lacks one
    Project(StoreArgs),
    /// Write one applicant's stored document back into the normalized tables
    Rematerialize(RematerializeArgs),
    /// Classify every projected, unclassified applicant
    Shortlist(ShortlistArgs),
    /// Clear a stored document and/or classification so an applicant can be reprocessed
    Reset(ResetArgs),
    /// Seed the store from an intake CSV sheet
    Import(ImportArgs),
    /// Print the stored state of one or all applicants
    Status(StatusArgs),
    /// Run the whole pipeline over synthetic applicants in memory
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Project(args) => run_project(args),
        Command::Rematerialize(args) => run_rematerialize(args),
        Command::Shortlist(args) => run_shortlist(args),
        Command::Reset(args) => run_reset(args),
        Command::Import(args) => run_import(args),
        Command::Status(args) => run_status(args),
        Command::Demo(args) => run_demo(args),
    }
}
