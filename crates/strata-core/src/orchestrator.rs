//! Round orchestrator
//!
//! Runs one round for one target: write its attachments, decide first vs
//! later round from the store, call the generator, fall back on failure, merge when an artifact
//! already exists, then write the artifact, summary and round record.
//!
//! Generation failures never escape; storage failures always do.

use crate::attachment::{materialize, Fetcher};
use crate::config::StrataConfig;
use crate::error::{GenerationError, RoundError};
use crate::fallback::fallback_document;
use crate::gate::RoundGate;
use crate::generator::{validate_output, GenerationRequest, Generator};
use crate::pipeline::{compose_document, compose_fresh, merge_into, ComposedArtifact};
use crate::state::{RoundMachine, RoundState};
use std::sync::Arc;
use std::time::Duration;
use strata_artifact::{Attachment, ContentHash, RoundPath, RoundRecord, TargetId};
use strata_composition::MergeCollision;
use strata_constitutional::{
    extract, render_summary, ArtifactStore, Extraction, ExtractionAmbiguity, StorageError,
};

/// What the caller supplies for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundInput {
    /// Task name
    pub task: String,
    /// Brief for this round
    pub brief: String,
    /// Target the round writes to
    pub target: TargetId,
    /// Round number; derived from history when `None`
    pub round: Option<u32>,
    /// Files written next to the artifact before generation
    pub attachments: Vec<Attachment>,
}

impl RoundInput {
    /// Input targeting the task's default identity
    #[must_use]
    pub fn new(task: impl Into<String>, brief: impl Into<String>) -> Self {
        let task = task.into();
        Self {
            target: TargetId::from_task(&task),
            task,
            brief: brief.into(),
            round: None,
            attachments: Vec::new(),
        }
    }

    /// With explicit target
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: TargetId) -> Self {
        self.target = target;
        self
    }

    /// With explicit round number
    #[inline]
    #[must_use]
    pub fn with_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    /// With one more attachment
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Result of a completed round
#[derive(Debug)]
pub struct RoundOutcome {
    /// Target written
    pub target: TargetId,
    /// Artifact text as written
    pub html: String,
    /// Record appended to history
    pub record: RoundRecord,
    /// States visited, `Init` to `Done`
    pub trace: Vec<RoundState>,
    /// Definitions the new round superseded
    pub collisions: Vec<MergeCollision>,
    /// Regions dropped as ambiguous
    pub ambiguities: Vec<ExtractionAmbiguity>,
    /// Why generation failed, when the fallback was used
    pub generation_error: Option<GenerationError>,
    /// Attachment names written this round
    pub attachments: Vec<String>,
}

impl RoundOutcome {
    /// Whether the fallback path was taken
    #[inline]
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.record.path == RoundPath::Fallback
    }
}

/// Drives rounds against a generator and a store
pub struct RoundOrchestrator {
    generator: Arc<dyn Generator>,
    store: Arc<dyn ArtifactStore>,
    fetcher: Option<Arc<dyn Fetcher>>,
    gate: RoundGate,
    timeout: Duration,
    fallback_image: Option<String>,
    keep_prior_on_failure: bool,
}

impl std::fmt::Debug for RoundOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundOrchestrator")
            .field("timeout", &self.timeout)
            .field("fallback_image", &self.fallback_image)
            .field("keep_prior_on_failure", &self.keep_prior_on_failure)
            .finish_non_exhaustive()
    }
}

impl RoundOrchestrator {
    /// Orchestrator with default settings
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, store: Arc<dyn ArtifactStore>) -> Self {
        Self::from_config(&StrataConfig::default(), generator, store)
    }

    /// Orchestrator configured from `config`
    #[must_use]
    pub fn from_config(
        config: &StrataConfig,
        generator: Arc<dyn Generator>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            generator,
            store,
            fetcher: None,
            gate: RoundGate::new(),
            timeout: config.generation.timeout(),
            fallback_image: config.fallback_image.clone(),
            keep_prior_on_failure: config.keep_prior_on_failure,
        }
    }

    /// With a fetcher for remote attachments
    ///
    /// Without one, remote attachments are skipped.
    #[inline]
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// With generation timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// With fallback image
    #[inline]
    #[must_use]
    pub fn with_fallback_image(mut self, image: impl Into<String>) -> Self {
        self.fallback_image = Some(image.into());
        self
    }

    /// Whether a failed later round keeps the previous artifact
    #[inline]
    #[must_use]
    pub fn with_keep_prior_on_failure(mut self, keep: bool) -> Self {
        self.keep_prior_on_failure = keep;
        self
    }

    /// The store rounds are written to
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Run one round to completion
    ///
    /// Rounds for the same target are serialized; the second caller waits.
    pub async fn run(&self, input: RoundInput) -> Result<RoundOutcome, RoundError> {
        let _guard = self.gate.enter(&input.target).await;
        let target = input.target.clone();

        let attachments = materialize(
            self.store.as_ref(),
            &target,
            &input.attachments,
            self.fetcher.as_deref(),
        )
        .await
        .map_err(logged(&target))?;

        let mut machine = RoundMachine::new();
        let existing = self
            .store
            .read_artifact(&target)
            .await
            .map_err(logged(&target))?;
        let round = match input.round {
            Some(round) => round,
            None => next_round(self.store.history(&target).await?.len()),
        };

        let prior = existing.as_deref().map(extract);
        machine.advance(if prior.is_some() {
            RoundState::RoundN
        } else {
            RoundState::Round1
        })?;
        tracing::info!(%target, round, later = prior.is_some(), "round started");

        let mut request = GenerationRequest::new(&input.task, &input.brief, round);
        if let Some(prior) = &prior {
            if !prior.document.script.trim().is_empty() {
                request = request.with_prior_script(prior.document.script.clone());
            }
        }

        let (composed, path, generation_error) = match self.generate(&request).await {
            Ok(generated) => {
                machine.advance(RoundState::GenerationOk)?;
                match prior {
                    Some(prior) => (merge_into(prior, &generated), RoundPath::Merged, None),
                    None => (compose_fresh(&generated), RoundPath::Fresh, None),
                }
            }
            Err(error) => {
                tracing::warn!(%target, round, %error, "generation failed, using fallback");
                machine.advance(RoundState::GenerationFailed)?;
                machine.advance(RoundState::Fallback)?;
                let image = attachments.first().map(String::as_str);
                (
                    self.fallback(&input, prior, image),
                    RoundPath::Fallback,
                    Some(error),
                )
            }
        };
        machine.advance(RoundState::Done)?;

        let record = RoundRecord::new(
            round,
            &input.task,
            &input.brief,
            path,
            ContentHash::of_text(&composed.html),
        );
        self.persist(&target, &composed, &record).await?;

        tracing::info!(
            %target,
            round,
            path = %record.path,
            hash = %record.artifact_hash.short(),
            collisions = composed.collisions.len(),
            "round complete"
        );

        Ok(RoundOutcome {
            target,
            html: composed.html,
            record,
            trace: machine.into_trace(),
            collisions: composed.collisions,
            ambiguities: composed.ambiguities,
            generation_error,
            attachments,
        })
    }

    /// Call the generator under the timeout and validate its output
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let raw = tokio::time::timeout(self.timeout, self.generator.generate(request))
            .await
            .map_err(|_| GenerationError::Timeout {
                secs: self.timeout.as_secs(),
            })??;
        validate_output(&raw)
    }

    fn fallback(
        &self,
        input: &RoundInput,
        prior: Option<Extraction>,
        attached_image: Option<&str>,
    ) -> ComposedArtifact {
        match prior {
            Some(prior) if self.keep_prior_on_failure && !prior.document.is_blank() => {
                tracing::info!(target = %input.target, "keeping previous artifact");
                ComposedArtifact {
                    ambiguities: prior.ambiguities,
                    ..compose_document(prior.document)
                }
            }
            _ => compose_document(fallback_document(
                &input.task,
                &input.brief,
                attached_image.or(self.fallback_image.as_deref()),
            )),
        }
    }

    /// Artifact first, then summary, then the record
    async fn persist(
        &self,
        target: &TargetId,
        composed: &ComposedArtifact,
        record: &RoundRecord,
    ) -> Result<(), RoundError> {
        self.store
            .write_artifact(target, &composed.html)
            .await
            .map_err(logged(target))?;
        self.store
            .write_summary(target, &render_summary(record, &composed.document.script))
            .await
            .map_err(logged(target))?;
        self.store
            .append_record(target, record)
            .await
            .map_err(logged(target))?;
        Ok(())
    }
}

/// Log a storage failure on its way out
fn logged(target: &TargetId) -> impl Fn(StorageError) -> StorageError + '_ {
    move |error| {
        tracing::error!(%target, %error, "storage failed");
        error
    }
}

fn next_round(completed: usize) -> u32 {
    u32::try_from(completed).map_or(u32::MAX, |n| n.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockGenerator;
    use async_trait::async_trait;
    use strata_constitutional::FsStore;
    use tempfile::TempDir;

    const PAGE_ONE: &str = "<!DOCTYPE html><html><head><title>Calc</title></head><body>\
        <div id=\"out\"></div><script>function add(a, b) { return a + b; }</script></body></html>";

    const PAGE_TWO: &str = "```html\n<!DOCTYPE html><html><body><div id=\"hist\"></div>\
        <script>function sub(a, b) { return a - b; }</script></body></html>\n```";

    fn store(dir: &TempDir) -> Arc<FsStore> {
        Arc::new(FsStore::new(dir.path()))
    }

    fn failing() -> MockGenerator {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(GenerationError::transport("connection refused")));
        generator
    }

    #[tokio::test]
    async fn failed_first_round_writes_fallback() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let orchestrator = RoundOrchestrator::new(Arc::new(failing()), store.clone())
            .with_fallback_image("placeholder.png");

        let outcome = orchestrator
            .run(RoundInput::new("Todo App", "A todo list"))
            .await
            .unwrap();

        assert!(outcome.used_fallback());
        assert!(!outcome.record.success);
        assert_eq!(outcome.record.round, 1);
        assert_eq!(
            outcome.trace,
            vec![
                RoundState::Init,
                RoundState::Round1,
                RoundState::GenerationFailed,
                RoundState::Fallback,
                RoundState::Done,
            ]
        );
        assert!(outcome.html.contains("<h1>Todo App</h1>"));
        assert!(outcome.html.contains("placeholder.png"));

        let target = TargetId::from_task("Todo App");
        assert_eq!(
            store.read_artifact(&target).await.unwrap().as_deref(),
            Some(outcome.html.as_str())
        );
        assert_eq!(store.history(&target).await.unwrap(), vec![outcome.record]);
    }

    #[tokio::test]
    async fn second_round_merges_into_first() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|request| request.round == 1 && request.prior_script.is_none())
            .times(1)
            .returning(|_| Ok(PAGE_ONE.to_owned()));
        generator
            .expect_generate()
            .withf(|request| {
                request.round == 2
                    && request.prior_script.as_deref()
                        == Some("function add(a, b) { return a + b; }")
            })
            .times(1)
            .returning(|_| Ok(PAGE_TWO.to_owned()));
        let orchestrator = RoundOrchestrator::new(Arc::new(generator), store.clone());

        let first = orchestrator
            .run(RoundInput::new("Calc", "add numbers"))
            .await
            .unwrap();
        assert_eq!(first.record.path, RoundPath::Fresh);

        let second = orchestrator
            .run(RoundInput::new("Calc", "subtract too"))
            .await
            .unwrap();
        assert_eq!(second.record.path, RoundPath::Merged);
        assert_eq!(second.record.round, 2);
        assert!(second.trace.contains(&RoundState::RoundN));

        let merged = extract(&second.html).document;
        assert_eq!(merged.title, "Calc");
        assert_eq!(
            merged.script,
            "function add(a, b) { return a + b; }\n\nfunction sub(a, b) { return a - b; }"
        );
        assert_eq!(merged.body, "<div id=\"out\"></div>\n<div id=\"hist\"></div>");

        assert!(orchestrator.gate.is_empty());

        let history = store.history(&TargetId::from_task("Calc")).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn failed_later_round_can_keep_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let target = TargetId::from_task("Calc");
        store.write_artifact(&target, PAGE_ONE).await.unwrap();

        let outcome = RoundOrchestrator::new(Arc::new(failing()), store.clone())
            .with_keep_prior_on_failure(true)
            .run(RoundInput::new("Calc", "break it"))
            .await
            .unwrap();

        assert!(outcome.used_fallback());
        assert!(outcome.generation_error.is_some());
        assert_eq!(
            extract(&outcome.html).document.script,
            "function add(a, b) { return a + b; }"
        );
    }

    #[tokio::test]
    async fn failed_later_round_writes_fallback_template() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let target = TargetId::from_task("Calc");
        store.write_artifact(&target, PAGE_ONE).await.unwrap();

        let outcome = RoundOrchestrator::new(Arc::new(failing()), store.clone())
            .run(RoundInput::new("Calc", "break it").with_round(7))
            .await
            .unwrap();

        assert_eq!(outcome.record.round, 7);
        assert!(outcome.html.contains("Fallback mode"));
        assert!(!outcome.html.contains("function add"));
    }

    #[tokio::test]
    async fn first_attachment_becomes_fallback_image() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let input = RoundInput::new("Gallery", "show the photo")
            .with_attachment(Attachment::new("../bad.png", "data:,x"))
            .with_attachment(Attachment::new("photo.png", "data:image/png;base64,iVBORw=="))
            .with_attachment(Attachment::new("notes.txt", "data:,hello"));

        let outcome = RoundOrchestrator::new(Arc::new(failing()), store.clone())
            .with_fallback_image("placeholder.png")
            .run(input)
            .await
            .unwrap();

        assert_eq!(
            outcome.attachments,
            vec!["photo.png".to_owned(), "notes.txt".to_owned()]
        );
        assert!(outcome.html.contains("photo.png"));
        assert!(!outcome.html.contains("placeholder.png"));
        let written = store.target_dir(&outcome.target).join("notes.txt");
        assert_eq!(std::fs::read_to_string(written).unwrap(), "hello");
    }

    #[tokio::test]
    async fn remote_attachments_use_the_fetcher() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = crate::attachment::MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(b"GIF89a".to_vec()));
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok(PAGE_ONE.to_owned()));

        let outcome = RoundOrchestrator::new(Arc::new(generator), store(&dir))
            .with_fetcher(Arc::new(fetcher))
            .run(
                RoundInput::new("Calc", "x")
                    .with_attachment(Attachment::new("spin.gif", "https://example.com/spin.gif")),
            )
            .await
            .unwrap();

        assert_eq!(outcome.record.path, RoundPath::Fresh);
        assert_eq!(outcome.attachments, vec!["spin.gif".to_owned()]);
    }

    #[tokio::test]
    async fn non_html_output_is_a_generation_failure() {
        let dir = TempDir::new().unwrap();
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("I'm sorry, I can't do that.".to_owned()));

        let outcome = RoundOrchestrator::new(Arc::new(generator), store(&dir))
            .run(RoundInput::new("Calc", "x"))
            .await
            .unwrap();
        assert_eq!(outcome.generation_error, Some(GenerationError::NotHtml));
        assert!(outcome.used_fallback());
    }

    struct SlowGenerator;

    #[async_trait]
    impl Generator for SlowGenerator {
        async fn generate(&self, _: &GenerationRequest) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(PAGE_ONE.to_owned())
        }
    }

    #[tokio::test]
    async fn slow_generation_times_out_into_fallback() {
        let dir = TempDir::new().unwrap();
        let outcome = RoundOrchestrator::new(Arc::new(SlowGenerator), store(&dir))
            .with_timeout(Duration::from_millis(20))
            .run(RoundInput::new("Calc", "x"))
            .await
            .unwrap();
        assert!(matches!(
            outcome.generation_error,
            Some(GenerationError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn storage_failure_aborts_the_round() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = dir.path().join("file");
        std::fs::write(&not_a_dir, "x").unwrap();

        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok(PAGE_ONE.to_owned()));

        let result = RoundOrchestrator::new(Arc::new(generator), Arc::new(FsStore::new(not_a_dir)))
            .run(RoundInput::new("Calc", "x"))
            .await;
        assert!(matches!(result, Err(RoundError::Storage(_))));
    }

    #[test]
    fn round_numbers_follow_history() {
        assert_eq!(next_round(0), 1);
        assert_eq!(next_round(4), 5);
    }
}
