//! End-to-end pipeline tests with scripted collaborators.
//!
//! No network and no pdfium: the LLM is replaced by a [`ScriptedAgent`],
//! PDF extraction by a fixed-text extractor, and retries never sleep.

use async_trait::async_trait;
use resume2intern::process::{EMPTY_RESULT_REASON, LOCAL_ONLY_REASON};
use resume2intern::{
    process, process_bytes, process_document, process_sync, process_to_file, AgentStage,
    DocumentSource, MatchConfig, MatchConfigBuilder, MatchError, Opportunity, OpportunitySource,
    PipelineMode, PipelineOutcome, PipelineProgressCallback, RejectionCode, Stage, StageError,
    TextExtractor,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

type Reply = Box<dyn Fn(Stage, &str) -> Result<String, StageError> + Send + Sync>;

/// An agent that answers from a closure and records every call.
struct ScriptedAgent {
    reply: Reply,
    calls: Mutex<Vec<(Stage, String)>>,
}

impl ScriptedAgent {
    fn new(
        reply: impl Fn(Stage, &str) -> Result<String, StageError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &'static str) -> Arc<Self> {
        Self::new(move |_, _| Err(StageError::new(message)))
    }

    fn calls(&self) -> Vec<(Stage, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AgentStage for ScriptedAgent {
    async fn invoke(&self, stage: Stage, input: &str) -> Result<String, StageError> {
        self.calls.lock().unwrap().push((stage, input.to_string()));
        (self.reply)(stage, input)
    }
}

/// Extractor that serves fixed text for any path.
struct FixedExtractor {
    pages: Option<usize>,
    text: String,
}

#[async_trait]
impl TextExtractor for FixedExtractor {
    async fn page_count(&self, _path: &Path) -> Option<usize> {
        self.pages
    }

    async fn extract(&self, _path: &Path) -> String {
        self.text.clone()
    }
}

struct BrokenSource;

#[async_trait]
impl OpportunitySource for BrokenSource {
    fn name(&self) -> &str {
        "broken"
    }

    async fn opportunities(&self) -> Result<Vec<Opportunity>, MatchError> {
        Err(MatchError::CatalogFetchFailed {
            url: "https://jobs.invalid/feed.json".into(),
            reason: "HTTP 503".into(),
        })
    }
}

/// Route library logs through the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn base_builder() -> MatchConfigBuilder {
    init_tracing();
    MatchConfig::builder().retry_base_delay(Duration::ZERO)
}

fn config_with_agent(agent: Arc<ScriptedAgent>) -> MatchConfig {
    base_builder().agent(agent).build().unwrap()
}

fn text(s: &str) -> DocumentSource {
    DocumentSource::Text(s.to_string())
}

fn companies(outcome: &PipelineOutcome) -> Vec<&str> {
    outcome
        .internships()
        .iter()
        .map(|r| r.company.as_str())
        .collect()
}

const BACKEND_RESUME: &str =
    "Experienced Python backend developer, cloud and distributed systems";

const FOUR_MATCHES: &str = "Here are your matches:\n\n\
1- Acme Corp\nBackend Intern\nlink: https://acme.example/jobs/1\n\n\
2- Globex\nPlatform Intern\nlink: https://globex.example/careers\n\n\
3- Initech\nData Intern\nlink: https://initech.example/apply\n\n\
4- Umbrella\nResearch Intern\nlink: https://umbrella.example/jobs";

// ── Document gate ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_text_is_rejected_before_any_stage() {
    let agent = ScriptedAgent::new(|_, _| Ok(FOUR_MATCHES.to_string()));
    let config = config_with_agent(agent.clone());

    for input in ["", "  \n\t ", "Warning: No text content was extracted from the PDF."] {
        let outcome = process_document(&text(input), &config).await.unwrap();
        assert_eq!(outcome.rejection_code(), Some(RejectionCode::FileTextEmpty));
    }
    assert_eq!(agent.call_count(), 0);
}

#[tokio::test]
async fn test_page_limit_rejects_long_pdf() {
    let agent = ScriptedAgent::new(|_, _| Ok(FOUR_MATCHES.to_string()));
    let config = base_builder()
        .agent(agent.clone())
        .extractor(Arc::new(FixedExtractor {
            pages: Some(21),
            text: BACKEND_RESUME.into(),
        }))
        .build()
        .unwrap();

    let outcome = process_bytes(b"%PDF-1.7 fake", &config).await.unwrap();
    assert_eq!(outcome.rejection_code(), Some(RejectionCode::PdfTooLong));
    assert_eq!(agent.call_count(), 0);
}

#[tokio::test]
async fn test_size_limit_rejects_large_upload() {
    let config = base_builder()
        .max_document_bytes(8)
        .extractor(Arc::new(FixedExtractor {
            pages: Some(1),
            text: BACKEND_RESUME.into(),
        }))
        .local_only(true)
        .build()
        .unwrap();

    let outcome = process_bytes(&[b'x'; 9], &config).await.unwrap();
    assert_eq!(outcome.rejection_code(), Some(RejectionCode::PdfTooLarge));
}

#[tokio::test]
async fn test_uploaded_bytes_flow_through_extractor() {
    let config = base_builder()
        .extractor(Arc::new(FixedExtractor {
            pages: Some(2),
            text: format!("--- Page 1 ---\n{BACKEND_RESUME}"),
        }))
        .local_only(true)
        .build()
        .unwrap();

    let outcome = process_bytes(b"%PDF-1.7 fake", &config).await.unwrap();
    assert!(outcome.fallback_used());
    assert_eq!(companies(&outcome)[0], "Google");
}

// ── Retry and fallback ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_quota_failure_is_retried_then_falls_back() {
    let agent = ScriptedAgent::failing("429 Resource has been exhausted (check quota)");
    let config = config_with_agent(agent.clone());

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();

    // three attempts on the first stage, nothing after it
    let calls = agent.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(stage, _)| *stage == Stage::DocumentAnalysis));

    match outcome {
        PipelineOutcome::Fallback { reason, .. } => assert!(reason.contains("quota")),
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn test_more_attempts_means_more_retries() {
    let agent = ScriptedAgent::failing("quota exceeded");
    let config = base_builder()
        .agent(agent.clone())
        .max_attempts(5)
        .build()
        .unwrap();

    process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    assert_eq!(agent.call_count(), 5);
}

#[tokio::test]
async fn test_invalid_request_propagates_without_retry() {
    let agent = ScriptedAgent::failing("invalid request: malformed prompt");
    let config = config_with_agent(agent.clone());

    let err = process_document(&text(BACKEND_RESUME), &config)
        .await
        .unwrap_err();

    assert_eq!(agent.call_count(), 1);
    match err {
        MatchError::StageFailed {
            stage,
            attempts,
            message,
        } => {
            assert_eq!(stage, Stage::DocumentAnalysis);
            assert_eq!(attempts, 1);
            assert_eq!(message, "invalid request: malformed prompt");
        }
        other => panic!("expected StageFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_in_later_stage_falls_back() {
    let agent = ScriptedAgent::new(|stage, _| match stage {
        Stage::Summary => Err(StageError::new("503 service temporarily unavailable")),
        _ => Ok("profile".to_string()),
    });
    let config = config_with_agent(agent.clone());

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    assert!(outcome.fallback_used());

    let stages: Vec<Stage> = agent.calls().into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        stages,
        vec![
            Stage::DocumentAnalysis,
            Stage::Summary,
            Stage::Summary,
            Stage::Summary
        ]
    );
}

#[tokio::test]
async fn test_resume_without_skills_gets_catalog_order() {
    let agent = ScriptedAgent::failing("LLM Failed: rate limit reached");
    let config = config_with_agent(agent);

    let outcome = process_document(&text("Hello! I like long walks."), &config)
        .await
        .unwrap();

    assert!(outcome.fallback_used());
    assert_eq!(companies(&outcome), vec!["Google", "Microsoft", "Amazon"]);
    let ids: Vec<u32> = outcome.internships().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_backend_resume_ranks_google_and_microsoft_first() {
    let agent = ScriptedAgent::failing("deadline exceeded");
    let config = config_with_agent(agent);

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();

    let ranked = companies(&outcome);
    assert_eq!(ranked[..2], ["Google", "Microsoft"]);
    assert!(!ranked.contains(&"Tesla"));
    assert!(!ranked.contains(&"Spotify"));

    match outcome {
        PipelineOutcome::Fallback {
            keywords,
            raw_output,
            ..
        } => {
            assert_eq!(
                keywords,
                vec!["experienced", "python", "backend", "developer", "cloud"]
            );
            assert!(raw_output.starts_with("1- Google\n"));
        }
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_answer_falls_back() {
    let agent = ScriptedAgent::new(|_, _| Ok("I could not find anything suitable.".into()));
    let config = config_with_agent(agent);

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    match outcome {
        PipelineOutcome::Fallback { reason, .. } => assert_eq!(reason, EMPTY_RESULT_REASON),
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failing_catalog_degrades_to_builtin() {
    let config = base_builder()
        .local_only(true)
        .opportunity_source(Arc::new(BrokenSource))
        .build()
        .unwrap();

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    assert_eq!(companies(&outcome)[0], "Google");
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_staged_pipeline_chains_stage_outputs() {
    let agent = ScriptedAgent::new(|stage, _| {
        Ok(match stage {
            Stage::DocumentAnalysis => "profile: python, cloud".to_string(),
            Stage::Summary => "brief: backend candidate".to_string(),
            _ => FOUR_MATCHES.to_string(),
        })
    });
    let config = config_with_agent(agent.clone());

    let outcome = process_document(&text("--- Page 1 ---\r\nJane  Doe\nPython"), &config)
        .await
        .unwrap();

    let calls = agent.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], (Stage::DocumentAnalysis, "Jane Doe Python".to_string()));
    assert_eq!(calls[1], (Stage::Summary, "profile: python, cloud".to_string()));
    assert_eq!(calls[2], (Stage::Matching, "brief: backend candidate".to_string()));

    match outcome {
        PipelineOutcome::Success {
            internships,
            raw_output,
        } => {
            assert_eq!(internships.len(), 3);
            assert_eq!(internships[0].id, 1);
            assert_eq!(internships[0].company, "Acme Corp");
            assert_eq!(internships[2].url, "https://initech.example/apply");
            assert_eq!(raw_output, FOUR_MATCHES);
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_llm_numbering_is_kept_verbatim() {
    let agent = ScriptedAgent::new(|_, _| {
        Ok("7- Acme\nIntern\nlink: https://a\n\n7- Globex\nIntern\nlink: https://g".into())
    });
    let config = config_with_agent(agent);

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    let ids: Vec<u32> = outcome.internships().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![7, 7]);
}

#[tokio::test]
async fn test_combined_mode_makes_one_call() {
    let agent = ScriptedAgent::new(|_, _| Ok(FOUR_MATCHES.to_string()));
    let config = base_builder()
        .agent(agent.clone())
        .mode(PipelineMode::Combined)
        .build()
        .unwrap();

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    assert!(outcome.is_success() && !outcome.fallback_used());
    assert_eq!(
        agent.calls(),
        vec![(Stage::Combined, BACKEND_RESUME.to_string())]
    );
}

#[tokio::test]
async fn test_web_scrape_stage_sees_matches_and_listing() {
    let agent = ScriptedAgent::new(|stage, _| {
        Ok(match stage {
            Stage::WebScrape => "1- Google\nSWE Intern\nlink: https://careers.google.com".into(),
            _ => FOUR_MATCHES.to_string(),
        })
    });
    let config = base_builder()
        .agent(agent.clone())
        .web_scrape(true)
        .build()
        .unwrap();

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    assert_eq!(companies(&outcome), vec!["Google"]);

    let calls = agent.calls();
    assert_eq!(calls.len(), 4);
    let (stage, input) = &calls[3];
    assert_eq!(*stage, Stage::WebScrape);
    assert!(input.contains("Acme Corp"));
    assert!(input.contains("Spotify"));
}

#[tokio::test]
async fn test_local_only_skips_agent() {
    let agent = ScriptedAgent::new(|_, _| Ok(FOUR_MATCHES.to_string()));
    let config = base_builder()
        .agent(agent.clone())
        .local_only(true)
        .build()
        .unwrap();

    let outcome = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    match &outcome {
        PipelineOutcome::Fallback { reason, .. } => assert_eq!(reason, LOCAL_ONLY_REASON),
        other => panic!("expected fallback, got {other:?}"),
    }
    assert_eq!(agent.call_count(), 0);
}

// ── Boundary ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_outcome_json_shapes() {
    let agent = ScriptedAgent::failing("quota");
    let config = config_with_agent(agent);

    let fallback = process_document(&text(BACKEND_RESUME), &config).await.unwrap();
    let json = serde_json::to_value(&fallback).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["fallback_used"], true);
    assert_eq!(json["source"], "local-fallback");
    assert_eq!(json["fallback_reason"], "quota");
    assert_eq!(json["internships"][0]["id"], 1);
    assert_eq!(json["internships"][0]["company"], "Google");
    assert!(json["keywords"].is_array());
    assert!(json["raw_output"].is_string());

    let rejected = process_document(&text(""), &config).await.unwrap();
    let json = serde_json::to_value(&rejected).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "FILE_TEXT_EMPTY");
    assert!(json["message"].as_str().unwrap().contains("OCR"));
    assert!(json.get("internships").is_none());
}

#[tokio::test]
async fn test_process_detects_text_file_paths() {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    std::io::Write::write_all(&mut file, BACKEND_RESUME.as_bytes()).unwrap();
    let config = base_builder().local_only(true).build().unwrap();

    let outcome = process(file.path().to_string_lossy(), &config).await.unwrap();
    assert_eq!(companies(&outcome)[0], "Google");
}

#[tokio::test]
async fn test_process_to_file_writes_outcome_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("matches.json");
    let config = base_builder().local_only(true).build().unwrap();

    let outcome = process_to_file(BACKEND_RESUME, &out, &config).await.unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, serde_json::to_value(&outcome).unwrap());
    assert!(!out.with_extension("json.tmp").exists());
}

#[test]
fn test_process_sync_runs_without_runtime() {
    let config = base_builder().local_only(true).build().unwrap();
    let outcome = process_sync("Data analytics with python", &config).unwrap();
    assert_eq!(companies(&outcome)[0], "Microsoft");
}

#[tokio::test]
async fn test_progress_callback_sees_retries_and_fallback() {
    #[derive(Default)]
    struct Counter {
        starts: AtomicUsize,
        retries: AtomicUsize,
        fallbacks: AtomicUsize,
    }

    impl PipelineProgressCallback for Counter {
        fn on_stage_start(&self, _stage: Stage, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_stage_retry(&self, _stage: Stage, _attempt: u32, _max: u32, delay: Duration) {
            assert_eq!(delay, Duration::ZERO);
            self.retries.fetch_add(1, Ordering::SeqCst);
        }
        fn on_fallback(&self, _reason: &str) {
            self.fallbacks.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counter = Arc::new(Counter::default());
    let config = base_builder()
        .agent(ScriptedAgent::failing("rate limit"))
        .progress_callback(counter.clone())
        .build()
        .unwrap();

    process_document(&text(BACKEND_RESUME), &config).await.unwrap();

    assert_eq!(counter.starts.load(Ordering::SeqCst), 1);
    assert_eq!(counter.retries.load(Ordering::SeqCst), 2);
    assert_eq!(counter.fallbacks.load(Ordering::SeqCst), 1);
}
