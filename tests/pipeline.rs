//! Integration tests for bloodwork-advisor.
//!
//! The offline tests drive the public API with stub models and search
//! providers. The live test at the bottom needs a blood test PDF in
//! `./test_cases/`, model and Google credentials, and is gated behind the
//! `E2E_ENABLED` environment variable.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture
//!
//! Live run:
//!   E2E_ENABLED=1 cargo test --test pipeline live_ -- --nocapture

use async_trait::async_trait;
use bloodwork_advisor::{
    advise_file, process_blood_test_report, run_pipeline, AdvisorConfig, AdvisorError, Article,
    LanguageModel, PipelineProgressCallback, SearchProvider, Stage,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Answers by persona and records every (system, prompt) pair.
#[derive(Default)]
struct ScriptedModel {
    calls: Mutex<Vec<(String, String)>>,
    fail_on: Option<&'static str>,
}

impl ScriptedModel {
    fn failing_on(role: &'static str) -> Self {
        Self {
            fail_on: Some(role),
            ..Default::default()
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, AdvisorError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));

        if let Some(role) = self.fail_on {
            if system.contains(role) {
                return Err(AdvisorError::LlmApiError {
                    message: "503 Service Unavailable".into(),
                });
            }
        }

        let answer = if system.contains("Blood Test Analyzer") {
            "```\nFerritin is low (8 ng/mL). Hemoglobin is borderline.\n```"
        } else if system.contains("Web Search Specialist") {
            "\"iron deficiency low ferritin diet\""
        } else {
            "1. Eat more iron-rich foods.\n2. Pair them with vitamin C.\n3. Recheck ferritin in 3 months."
        };
        Ok(answer.to_string())
    }
}

/// Returns a fixed list of hits, or a fixed failure.
struct StubSearch {
    hits: Vec<Article>,
    fail: bool,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StubSearch {
    fn with_hits(n: usize) -> Self {
        let hits = (1..=n)
            .map(|i| Article {
                title: format!("Iron article {i}"),
                link: format!("https://health.example.org/iron/{i}"),
            })
            .collect();
        Self {
            hits,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_hits(0)
        }
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, query: &str, n: usize) -> Result<Vec<Article>, AdvisorError> {
        self.queries.lock().unwrap().push((query.to_string(), n));
        if self.fail {
            return Err(AdvisorError::SearchFailed {
                query: query.to_string(),
                reason: "HTTP 403: daily limit exceeded".into(),
            });
        }
        Ok(self.hits.clone())
    }
}

/// Never answers within any reasonable budget.
struct HangingModel;

#[async_trait]
impl LanguageModel for HangingModel {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, AdvisorError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(String::new())
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl PipelineProgressCallback for EventLog {
    fn on_pipeline_start(&self, total_stages: usize) {
        self.0.lock().unwrap().push(format!("start:{total_stages}"));
    }
    fn on_stage_start(&self, stage: Stage) {
        self.0.lock().unwrap().push(format!("begin:{stage}"));
    }
    fn on_stage_complete(&self, stage: Stage, _output_len: usize) {
        self.0.lock().unwrap().push(format!("ok:{stage}"));
    }
    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.0.lock().unwrap().push(format!("err:{stage}"));
    }
    fn on_pipeline_complete(&self, success: bool) {
        self.0.lock().unwrap().push(format!("done:{success}"));
    }
}

fn config(model: Arc<dyn LanguageModel>, search: Arc<dyn SearchProvider>) -> AdvisorConfig {
    AdvisorConfig::builder()
        .language_model(model)
        .search(search)
        .build()
        .unwrap()
}

const REPORT: &str = "CBC panel\nHemoglobin 11.9 g/dL (12.0-15.5)\nFerritin 8 ng/mL (15-150)\n";

// ── Offline pipeline tests ───────────────────────────────────────────────────

#[tokio::test]
async fn full_run_returns_recommendations() {
    let model = Arc::new(ScriptedModel::default());
    let search = Arc::new(StubSearch::with_hits(3));
    let cfg = config(model.clone(), search.clone());

    let result = process_blood_test_report(REPORT, &cfg).await.unwrap();
    assert!(result.starts_with("1. Eat more iron-rich foods."));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3, "one model call per stage");

    // Analysis sees the report and the trailing ellipsis.
    assert!(prompts[0].contains("Ferritin 8 ng/mL"));
    assert!(prompts[0].ends_with("..."));

    // Recommendation sees the prefixed analysis and one line per article.
    assert!(prompts[2].starts_with(
        "Based on this analysis: Analysis of blood test report: Ferritin is low"
    ));
    assert!(prompts[2].contains(
        "Iron article 1: https://health.example.org/iron/1\nIron article 2: https://health.example.org/iron/2"
    ));
    assert!(prompts[2].ends_with("Provide concise health recommendations:"));
}

#[tokio::test]
async fn report_captures_every_stage() {
    let search = Arc::new(StubSearch::with_hits(3));
    let cfg = config(Arc::new(ScriptedModel::default()), search.clone());

    let report = run_pipeline(REPORT, &cfg).await.unwrap();
    assert_eq!(
        report.analysis,
        "Analysis of blood test report: Ferritin is low (8 ng/mL). Hemoglobin is borderline."
    );
    assert_eq!(report.search_query, "iron deficiency low ferritin diet");
    assert_eq!(report.articles.len(), 3);

    let queries = search.queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![("iron deficiency low ferritin diet".to_string(), 3)]
    );

    let json = report.to_json_pretty().unwrap();
    assert!(json.contains("\"search_query\""));
}

#[tokio::test]
async fn long_report_is_truncated_before_analysis() {
    let model = Arc::new(ScriptedModel::default());
    let cfg = config(model.clone(), Arc::new(StubSearch::with_hits(1)));
    let long_report = format!("{}TAIL-MARKER", "x".repeat(1000));

    process_blood_test_report(&long_report, &cfg).await.unwrap();
    let analysis_prompt = &model.prompts()[0];
    assert!(!analysis_prompt.contains("TAIL-MARKER"));
    assert!(analysis_prompt.ends_with(&format!("{}...", "x".repeat(10))));
}

#[tokio::test]
async fn full_report_mode_keeps_the_tail() {
    let model = Arc::new(ScriptedModel::default());
    let cfg = AdvisorConfig::builder()
        .language_model(model.clone())
        .search(Arc::new(StubSearch::with_hits(1)))
        .report_excerpt_chars(None)
        .build()
        .unwrap();
    let long_report = format!("{}TAIL-MARKER", "x".repeat(1000));

    process_blood_test_report(&long_report, &cfg).await.unwrap();
    assert!(model.prompts()[0].contains("TAIL-MARKER..."));
}

#[tokio::test]
async fn fewer_hits_than_requested_still_recommends() {
    let model = Arc::new(ScriptedModel::default());
    let cfg = config(model.clone(), Arc::new(StubSearch::with_hits(1)));

    let report = run_pipeline(REPORT, &cfg).await.unwrap();
    assert_eq!(report.articles.len(), 1);
    assert!(!report.recommendations.is_empty());
}

#[tokio::test]
async fn no_hits_still_recommends() {
    let model = Arc::new(ScriptedModel::default());
    let cfg = config(model.clone(), Arc::new(StubSearch::with_hits(0)));

    assert!(process_blood_test_report(REPORT, &cfg).await.is_some());
    assert!(model.prompts()[2].contains("And these articles:\nProvide concise"));
}

#[tokio::test]
async fn extra_hits_are_capped() {
    let cfg = config(
        Arc::new(ScriptedModel::default()),
        Arc::new(StubSearch::with_hits(7)),
    );
    let report = run_pipeline(REPORT, &cfg).await.unwrap();
    assert_eq!(report.articles.len(), 3);
}

#[tokio::test]
async fn search_failure_yields_none() {
    let model = Arc::new(ScriptedModel::default());
    let cfg = config(model.clone(), Arc::new(StubSearch::failing()));

    assert!(process_blood_test_report(REPORT, &cfg).await.is_none());
    // Recommendation never ran.
    assert_eq!(model.prompts().len(), 2);

    let err = run_pipeline(REPORT, &cfg).await.unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Search));
    assert!(err.to_string().contains("daily limit exceeded"));
}

#[tokio::test]
async fn analysis_failure_stops_the_pipeline() {
    let model = Arc::new(ScriptedModel::failing_on("Blood Test Analyzer"));
    let search = Arc::new(StubSearch::with_hits(3));
    let cfg = config(model.clone(), search.clone());

    let err = run_pipeline(REPORT, &cfg).await.unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Analyze));
    assert_eq!(model.prompts().len(), 1);
    assert!(search.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn recommendation_failure_yields_none() {
    let cfg = config(
        Arc::new(ScriptedModel::failing_on("Health Recommendations Expert")),
        Arc::new(StubSearch::with_hits(3)),
    );
    assert!(process_blood_test_report(REPORT, &cfg).await.is_none());
}

#[tokio::test]
async fn progress_events_follow_stage_order() {
    let log = Arc::new(EventLog::default());
    let cfg = AdvisorConfig::builder()
        .language_model(Arc::new(ScriptedModel::default()))
        .search(Arc::new(StubSearch::with_hits(3)))
        .progress_callback(log.clone())
        .build()
        .unwrap();

    run_pipeline(REPORT, &cfg).await.unwrap();
    assert_eq!(
        log.events(),
        vec![
            "start:3",
            "begin:analyze",
            "ok:analyze",
            "begin:search",
            "ok:search",
            "begin:recommend",
            "ok:recommend",
            "done:true",
        ]
    );
}

#[tokio::test]
async fn progress_reports_failed_stage() {
    let log = Arc::new(EventLog::default());
    let cfg = AdvisorConfig::builder()
        .language_model(Arc::new(ScriptedModel::default()))
        .search(Arc::new(StubSearch::failing()))
        .progress_callback(log.clone())
        .build()
        .unwrap();

    assert!(run_pipeline(REPORT, &cfg).await.is_err());
    let events = log.events();
    assert_eq!(&events[events.len() - 2..], ["err:search", "done:false"]);
    assert!(!events.iter().any(|e| e == "begin:recommend"));
}

#[tokio::test]
async fn unresolvable_model_still_brackets_progress_events() {
    let log = Arc::new(EventLog::default());
    let cfg = AdvisorConfig::builder()
        .provider_name("definitely-not-a-provider")
        .search(Arc::new(StubSearch::with_hits(3)))
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let err = run_pipeline(REPORT, &cfg).await.unwrap_err();
    assert!(matches!(err, AdvisorError::ProviderNotConfigured { .. }), "got: {err}");
    assert_eq!(log.events(), vec!["start:3", "done:false"]);
}

#[tokio::test]
async fn missing_pdf_brackets_progress_events() {
    let log = Arc::new(EventLog::default());
    let cfg = AdvisorConfig::builder()
        .language_model(Arc::new(ScriptedModel::default()))
        .search(Arc::new(StubSearch::with_hits(3)))
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let err = advise_file("/definitely/not/a/report.pdf", &cfg)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Extract));
    assert_eq!(
        log.events(),
        vec!["start:4", "begin:extract", "err:extract", "done:false"]
    );
}

#[tokio::test]
async fn pipeline_timeout_yields_none() {
    let cfg = AdvisorConfig::builder()
        .language_model(Arc::new(HangingModel))
        .search(Arc::new(StubSearch::with_hits(3)))
        .pipeline_timeout_secs(1)
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    assert!(process_blood_test_report(REPORT, &cfg).await.is_none());
    assert!(started.elapsed() < Duration::from_secs(10));

    match run_pipeline(REPORT, &cfg).await {
        Err(AdvisorError::PipelineTimeout { secs }) => assert_eq!(secs, 1),
        other => panic!("expected pipeline timeout, got {:?}", other.map(|r| r.analysis)),
    }
}

// ── Live end-to-end test ─────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

#[tokio::test]
async fn live_blood_test_report() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("blood_test_report.pdf"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter("bloodwork_advisor=debug")
        .with_test_writer()
        .try_init();

    let cfg = AdvisorConfig::default();
    let text = bloodwork_advisor::read_pdf(&pdf, &cfg).await;
    assert!(!text.trim().is_empty(), "no text extracted from {}", pdf.display());

    let report = run_pipeline(&text, &cfg).await.expect("live pipeline run");
    println!("{}", report.to_json_pretty().unwrap());
    assert!(report.analysis.starts_with("Analysis of blood test report: "));
    assert!(report.articles.len() <= 3);
    assert!(!report.recommendations.trim().is_empty());
}
