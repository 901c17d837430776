use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use coldiff_api::{DiffClient, DiffService};
use coldiff_engine::{
    ColumnIndices, CompareOptions, CompareSummary, LocalBase, Reporter, TracingReporter, UiSurface, handle_submission,
    plan_requests, render_form,
};
use coldiff_types::form::{COMPARE_BUTTON, DIFF_IDX_KEY, SRC_IDX_KEY, TARGET_IDX_KEY};
use coldiff_types::{FormSpec, FormSubmission};
use coldiff_util::ColdiffConfig;
use serde_json::{Map, Value, json};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "coldiff", version, about = "Compare two table columns row by row through a diff service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the instructions and the compare form
    Form,
    /// Run the comparison against a base snapshot
    Compare(CompareArgs),
    /// Print the resolved configuration
    Config {
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Base snapshot (JSON) to read from and write links into
    #[arg(long, short)]
    snapshot: PathBuf,
    /// Visible position of the original text column (first column is 0)
    #[arg(long, allow_hyphen_values = true)]
    src_idx: Option<String>,
    /// Visible position of the modified text column
    #[arg(long, allow_hyphen_values = true)]
    target_idx: Option<String>,
    /// Visible position of the column receiving diff links
    #[arg(long, allow_hyphen_values = true)]
    diff_idx: Option<String>,
    /// Diff service URL, overriding config and environment
    #[arg(long)]
    endpoint: Option<String>,
    /// Write the updated snapshot here instead of in place
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Print the requests that would be sent; no HTTP calls, no writes
    #[arg(long)]
    dry_run: bool,
}

/// Markdown goes straight to stdout.
struct StdoutSurface;

impl UiSurface for StdoutSurface {
    fn markdown(&mut self, text: &str) {
        println!("{}", text.trim_end());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Form => {
            render_form(&mut StdoutSurface, &FormSpec::compare());
            Ok(())
        }
        Command::Compare(args) => run_compare(args).await,
        Command::Config { endpoint } => {
            let config = ColdiffConfig::load(endpoint.as_deref()).context("load configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_compare(args: CompareArgs) -> Result<()> {
    let config = ColdiffConfig::load(args.endpoint.as_deref()).context("load configuration")?;
    let base = LocalBase::load(&args.snapshot).with_context(|| format!("load snapshot {}", args.snapshot.display()))?;
    let values = submission_values(&FormSpec::compare(), &args);

    if args.dry_run {
        let indices = ColumnIndices::from_form_values(&values)?;
        let planned = plan_requests(&base, &indices).await.context("plan requests")?;
        let out = json!({
            "method": "POST",
            "url": config.endpoint,
            "requests": planned,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let client = DiffClient::from_config(&config)?;
    let submission = FormSubmission {
        key: COMPARE_BUTTON.to_string(),
        values,
    };
    let options = CompareOptions {
        link_label: config.link_label.clone(),
    };
    let output = args.output.as_ref().unwrap_or(&args.snapshot);
    let summary = compare_and_save(
        &mut StdoutSurface,
        &submission,
        &base,
        &client,
        &TracingReporter,
        &options,
        output,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Run the submission against `base`, then write the snapshot to `output`.
///
/// The snapshot is written whether or not the run succeeded, so links written
/// before a failure are kept. A save failure takes precedence over the run's.
async fn compare_and_save<U, D, R>(
    ui: &mut U,
    submission: &FormSubmission,
    base: &LocalBase,
    diff_service: &D,
    reporter: &R,
    options: &CompareOptions,
    output: &Path,
) -> Result<CompareSummary>
where
    U: UiSurface + ?Sized,
    D: DiffService + ?Sized,
    R: Reporter + ?Sized,
{
    let outcome = handle_submission(ui, submission, base, diff_service, reporter, options).await;

    base.save(output)
        .with_context(|| format!("save snapshot {}", output.display()))?;
    info!(path = %output.display(), "snapshot saved");

    outcome.context("comparison aborted")
}

/// Form values as the renderer would submit them: flags override defaults,
/// and each raw flag becomes a number only when it parses as one.
fn submission_values(form: &FormSpec, args: &CompareArgs) -> Map<String, Value> {
    let mut values = form.default_values();
    let overrides = [
        (SRC_IDX_KEY, &args.src_idx),
        (TARGET_IDX_KEY, &args.target_idx),
        (DIFF_IDX_KEY, &args.diff_idx),
    ];
    for (key, raw) in overrides {
        if let Some(raw) = raw {
            values.insert(key.to_string(), index_value(raw));
        }
    }
    values
}

fn index_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Number(number)) => Value::Number(number),
        _ => Value::String(raw.to_string()),
    }
}
