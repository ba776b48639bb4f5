use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use strata_artifact::TargetId;
use strata_cli::{cli, commands, init_tracing};
use strata_constitutional::FsStore;
use strata_core::RoundOrchestrator;
use strata_llm::{HttpFetcher, OpenAiGenerator};

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let mut stdout = std::io::stdout().lock();
    let result: Result<()> = match matches.subcommand() {
        Some(("round", args)) => run_round(args, &mut stdout).await,
        Some(("merge", args)) => match (
            args.get_one::<PathBuf>("old"),
            args.get_one::<PathBuf>("new"),
            args.get_one::<PathBuf>("out"),
        ) {
            (Some(old), Some(new), Some(dest)) => commands::merge(old, new, dest, &mut stdout),
            _ => Err(anyhow::anyhow!("merge needs <old> <new> <out>")),
        },
        Some(("history", args)) => run_history(args, &mut stdout).await,
        _ => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let _ = writeln!(std::io::stderr(), "error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_round(args: &clap::ArgMatches, out: &mut impl Write) -> Result<()> {
    let config = commands::load_config(args)?;
    let generator =
        OpenAiGenerator::from_config(&config.generation).context("failed to build HTTP client")?;
    let store = Arc::new(FsStore::new(&config.workspace_root));
    let fetcher = HttpFetcher::new().context("failed to build HTTP client")?;
    let orchestrator = RoundOrchestrator::from_config(&config, Arc::new(generator), store.clone())
        .with_fetcher(Arc::new(fetcher));

    let outcome = commands::round(&orchestrator, commands::round_input(args), out).await?;
    writeln!(out, "artifact: {}", store.artifact_path(&outcome.target).display())?;
    Ok(())
}

async fn run_history(args: &clap::ArgMatches, out: &mut impl Write) -> Result<()> {
    let config = commands::load_config(args)?;
    let store = FsStore::new(&config.workspace_root);
    let target = args
        .get_one::<String>("target")
        .map(|t| TargetId::from_task(t))
        .context("missing target")?;
    commands::history(&store, &target, args.get_flag("json"), out).await?;
    Ok(())
}
