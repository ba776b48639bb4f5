//! Command bodies

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::io::Write;
use std::path::{Path, PathBuf};
use strata_artifact::{Attachment, RoundRecord, TargetId};
use strata_constitutional::ArtifactStore;
use strata_core::{merge_html, RoundInput, RoundOrchestrator, RoundOutcome, StrataConfig};

/// Load configuration, then apply `--config`/`--workspace`/`--model`/
/// `--fallback-image` from the subcommand's arguments
pub fn load_config(args: &ArgMatches) -> Result<StrataConfig> {
    let path = args.get_one::<PathBuf>("config");
    let mut config = StrataConfig::load(path.map(PathBuf::as_path))
        .context("failed to load configuration")?;

    if let Some(root) = args.get_one::<PathBuf>("workspace") {
        config = config.with_workspace_root(root);
    }
    if let Ok(Some(model)) = args.try_get_one::<String>("model") {
        config.generation = config.generation.with_model(model);
    }
    if let Ok(Some(image)) = args.try_get_one::<String>("fallback-image") {
        config = config.with_fallback_image(image);
    }
    Ok(config)
}

/// Round input from `round` arguments
#[must_use]
pub fn round_input(args: &ArgMatches) -> RoundInput {
    let task = args.get_one::<String>("task").cloned().unwrap_or_default();
    let brief = args.get_one::<String>("brief").cloned().unwrap_or_default();
    let mut input = RoundInput::new(task, brief);
    if let Some(target) = args.get_one::<String>("target") {
        input = input.with_target(TargetId::from_task(target));
    }
    if let Some(round) = args.get_one::<u32>("round") {
        input = input.with_round(*round);
    }
    if let Some(attachments) = args.get_many::<Attachment>("attach") {
        for attachment in attachments {
            input = input.with_attachment(attachment.clone());
        }
    }
    input
}

/// Run one round and report it
pub async fn round(
    orchestrator: &RoundOrchestrator,
    input: RoundInput,
    out: &mut impl Write,
) -> Result<RoundOutcome> {
    let outcome = orchestrator
        .run(input)
        .await
        .context("round could not be stored")?;
    let record = &outcome.record;

    writeln!(
        out,
        "round {} for {}: {} ({})",
        record.round,
        outcome.target,
        record.path,
        if record.success { "ok" } else { "fallback" }
    )?;
    writeln!(out, "hash: {}", record.artifact_hash)?;
    if !outcome.attachments.is_empty() {
        writeln!(out, "attachments: {}", outcome.attachments.join(", "))?;
    }
    if let Some(err) = &outcome.generation_error {
        writeln!(out, "generation failed: {err}")?;
    }
    if !outcome.collisions.is_empty() {
        writeln!(out, "replaced definitions:")?;
        for collision in &outcome.collisions {
            writeln!(out, "  {collision}")?;
        }
    }
    for ambiguity in &outcome.ambiguities {
        writeln!(out, "dropped: {ambiguity}")?;
    }
    Ok(outcome)
}

/// Merge `new` into `old` and write the result to `dest`
pub fn merge(old: &Path, new: &Path, dest: &Path, out: &mut impl Write) -> Result<()> {
    let old_html =
        std::fs::read_to_string(old).with_context(|| format!("failed to read {}", old.display()))?;
    let new_html =
        std::fs::read_to_string(new).with_context(|| format!("failed to read {}", new.display()))?;

    let merged = merge_html(&old_html, &new_html);
    std::fs::write(dest, &merged.html)
        .with_context(|| format!("failed to write {}", dest.display()))?;

    writeln!(out, "wrote {}", dest.display())?;
    for collision in &merged.collisions {
        writeln!(out, "  replaced {collision}")?;
    }
    for id in &merged.restored {
        writeln!(out, "  restored #{id}")?;
    }
    for ambiguity in &merged.ambiguities {
        writeln!(out, "  dropped {ambiguity}")?;
    }
    Ok(())
}

/// Print the history of a target, oldest first
pub async fn history(
    store: &dyn ArtifactStore,
    target: &TargetId,
    json: bool,
    out: &mut impl Write,
) -> Result<Vec<RoundRecord>> {
    let records = store
        .history(target)
        .await
        .with_context(|| format!("failed to read history of {target}"))?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
        return Ok(records);
    }

    if records.is_empty() {
        writeln!(out, "no rounds recorded for {target}")?;
        return Ok(records);
    }
    for record in &records {
        writeln!(
            out,
            "{:>3}  {}  {:<8}  {:<8}  {}  {}",
            record.round,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.path.as_str(),
            if record.success { "ok" } else { "fallback" },
            record.artifact_hash.short(),
            record.brief
        )?;
    }
    Ok(records)
}
