//! Pipeline driver: analyze → search → recommend.
//!
//! Stages run strictly in sequence, each consuming the previous stage's
//! output. The whole chain runs under `pipeline_timeout_secs`; every model
//! call additionally carries its own request timeout. Any failure ends the
//! run. [`run_pipeline`] returns it as an error; [`process_blood_test_report`]
//! logs it and returns `None`. Neither ever returns partial results.

use crate::agents::{create_tasks, Task};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, StageError};
use crate::extract;
use crate::llm::{resolve_model, LanguageModel};
use crate::output::PipelineReport;
use crate::pipeline::{analyze, recommend, search, Stage};
use crate::search::{resolve_search, SearchProvider};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Run the three stages over `report` and return the recommendations.
///
/// Returns `None` if any stage fails or the pipeline times out; the cause is
/// logged.
pub async fn process_blood_test_report(report: &str, config: &AdvisorConfig) -> Option<String> {
    match run_pipeline(report, config).await {
        Ok(output) => {
            info!("Pipeline completed");
            Some(output.recommendations)
        }
        Err(e) => {
            error!(
                "An error occurred while processing the blood test report: {}",
                e
            );
            None
        }
    }
}

/// Run the three stages over `report`.
///
/// # Errors
/// - [`AdvisorError::ProviderNotConfigured`] if no model can be resolved
/// - [`AdvisorError::Stage`] wrapping the first stage failure
/// - [`AdvisorError::PipelineTimeout`] if the end-to-end budget is exceeded
pub async fn run_pipeline(
    report: &str,
    config: &AdvisorConfig,
) -> Result<PipelineReport, AdvisorError> {
    notify_pipeline_start(config, Stage::AGENT_STAGES.len());
    let result = drive(report, config).await;
    notify_pipeline_complete(config, &result);
    result
}

/// Extract `path` and run the pipeline over its text.
///
/// Extraction failure is reported as a [`Stage::Extract`] error.
pub async fn advise_file(
    path: impl AsRef<Path>,
    config: &AdvisorConfig,
) -> Result<PipelineReport, AdvisorError> {
    let path = path.as_ref();
    notify_pipeline_start(config, Stage::AGENT_STAGES.len() + 1);

    let result = async {
        notify_start(config, Stage::Extract);
        let extracted = extract::try_extract(path, config).await.and_then(|e| {
            if e.text.trim().is_empty() {
                Err(AdvisorError::NoTextExtracted {
                    path: path.to_path_buf(),
                })
            } else {
                Ok(e)
            }
        });
        let extraction = finish(config, Stage::Extract, None, extracted, |e| e.text.len())?;
        drive(&extraction.text, config).await
    }
    .await;

    notify_pipeline_complete(config, &result);
    result
}

/// Resolve the services and run the stages under the pipeline budget.
async fn drive(report: &str, config: &AdvisorConfig) -> Result<PipelineReport, AdvisorError> {
    let model = resolve_model(config)?;
    let search = resolve_search(config)?;
    info!("Pipeline created with model '{}'. Starting run...", model.name());

    let budget = config.pipeline_timeout_secs;
    match tokio::time::timeout(
        Duration::from_secs(budget),
        run_stages(report, model.as_ref(), search.as_ref(), config),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(AdvisorError::PipelineTimeout { secs: budget }),
    }
}

async fn run_stages(
    report: &str,
    model: &dyn LanguageModel,
    provider: &dyn SearchProvider,
    config: &AdvisorConfig,
) -> Result<PipelineReport, AdvisorError> {
    let start = Instant::now();
    let excerpt = analyze::report_excerpt(report, config.report_excerpt_chars);
    let [analyze_task, search_task, recommend_task] = create_tasks(excerpt);

    // ── Stage 1: Analyze ─────────────────────────────────────────────────
    notify_start(config, Stage::Analyze);
    let analysis = analyze::analyze_blood_test(model, &analyze_task, excerpt).await;
    let analysis = finish(config, Stage::Analyze, Some(&analyze_task), analysis, |a| {
        a.chars().count()
    })?;

    // ── Stage 2: Search ──────────────────────────────────────────────────
    notify_start(config, Stage::Search);
    let searched = async {
        let query = search::derive_search_query(model, &search_task, &analysis).await?;
        let articles =
            search::search_health_articles(provider, &query, config.num_search_results).await?;
        Ok::<_, AdvisorError>((query, articles))
    }
    .await;
    let (search_query, articles) =
        finish(config, Stage::Search, Some(&search_task), searched, |(_, a)| a.len())?;

    // ── Stage 3: Recommend ───────────────────────────────────────────────
    notify_start(config, Stage::Recommend);
    let rendered = search::format_articles(&articles);
    let recommendations =
        recommend::generate_recommendations(model, &recommend_task, &analysis, &rendered).await;
    let recommendations = finish(
        config,
        Stage::Recommend,
        Some(&recommend_task),
        recommendations,
        |r| r.chars().count(),
    )?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!("Pipeline finished in {}ms", duration_ms);

    Ok(PipelineReport {
        analysis,
        search_query,
        articles,
        recommendations,
        duration_ms,
    })
}

fn notify_pipeline_start(config: &AdvisorConfig, total_stages: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_pipeline_start(total_stages);
    }
}

fn notify_pipeline_complete<T>(config: &AdvisorConfig, result: &Result<T, AdvisorError>) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_pipeline_complete(result.is_ok());
    }
}

fn notify_start(config: &AdvisorConfig, stage: Stage) {
    debug!("Entering {} stage", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

/// Fire the completion/error callback and tag failures with their stage.
fn finish<T>(
    config: &AdvisorConfig,
    stage: Stage,
    task: Option<&Task>,
    result: Result<T, AdvisorError>,
    output_len: impl FnOnce(&T) -> usize,
) -> Result<T, AdvisorError> {
    match result {
        Ok(value) => {
            if let Some(task) = task {
                debug!("Task completed: {}...", task.summary());
            }
            debug!("{} stage complete, advancing to {}", stage, stage.next());
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(stage, output_len(&value));
            }
            Ok(value)
        }
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_error(stage, &e.to_string());
            }
            Err(StageError::new(stage, e).into())
        }
    }
}
