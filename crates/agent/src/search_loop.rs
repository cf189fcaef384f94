//! The search agent loop.
//!
//! Each iteration asks the evaluator model for a query, searches, appends
//! the hits to the evidence, and asks the evaluator how confident it is
//! that the evidence answers the question. The loop stops early on high
//! confidence or when confidence stops improving.

use std::sync::Arc;

use localchat_config::AgentConfig;
use localchat_core::error::ProviderError;
use localchat_core::provider::{Provider, ProviderRequest};
use localchat_core::search::{SearchProvider, SearchResult};
use localchat_search::format_results;
use tracing::{debug, info, warn};

use crate::confidence::Evaluation;
use crate::error::{AgentError, IterationError};
use crate::progress::{ProgressListener, notify_progress};
use crate::prompts;

/// One completed search attempt.
#[derive(Debug, Clone)]
pub struct SearchIteration {
    pub query: String,
    /// Hits kept for this attempt, in rank order.
    pub results: Vec<SearchResult>,
    /// The evaluator's raw response.
    pub evaluation: String,
    /// Parsed confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Everything a loop run produced.
#[derive(Debug, Clone, Default)]
pub struct AgentResult {
    /// Completed attempts (searches with zero hits are not recorded).
    pub iterations: Vec<SearchIteration>,
    /// Formatted evidence from every successful search.
    pub accumulated_context: String,
    /// Human-readable log of the run.
    pub reasoning_trace: String,
    /// Every query issued, including ones that found nothing.
    pub search_queries: Vec<String>,
}

impl AgentResult {
    /// Per-attempt metadata for display under the answer.
    pub fn summary(&self) -> String {
        self.iterations
            .iter()
            .enumerate()
            .map(|(i, it)| {
                format!(
                    "Search {}: \"{}\"\nResults: {} found\nConfidence: {:.0}%",
                    i + 1,
                    it.query,
                    it.results.len(),
                    it.confidence * 100.0
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Confidence of the last completed attempt.
    pub fn final_confidence(&self) -> Option<f32> {
        self.iterations.last().map(|it| it.confidence)
    }
}

/// State owned by a single run.
struct LoopState<'a> {
    result: AgentResult,
    listener: &'a dyn ProgressListener,
}

impl<'a> LoopState<'a> {
    fn new(listener: &'a dyn ProgressListener) -> Self {
        Self {
            result: AgentResult::default(),
            listener,
        }
    }

    /// Append to the trace and notify.
    fn log(&mut self, line: &str) {
        self.result.reasoning_trace.push_str(line);
        notify_progress(
            self.listener,
            &self.result.reasoning_trace,
            &self.result.search_queries,
        );
    }

    fn last_two_confidences(&self) -> Option<(f32, f32)> {
        match self.result.iterations.as_slice() {
            [.., prev, last] => Some((prev.confidence, last.confidence)),
            _ => None,
        }
    }
}

/// What a single search attempt amounted to.
enum Attempt {
    NoResults,
    Evaluated(f32),
}

/// Runs the query → search → evaluate loop.
pub struct SearchAgent {
    provider: Arc<dyn Provider>,
    search: Arc<dyn SearchProvider>,
    max_iterations: u32,
    confidence_threshold: f32,
    max_results: usize,
    temperature: f32,
}

impl SearchAgent {
    pub fn new(provider: Arc<dyn Provider>, search: Arc<dyn SearchProvider>) -> Self {
        let defaults = AgentConfig::default();
        Self {
            provider,
            search,
            max_iterations: defaults.max_iterations,
            confidence_threshold: defaults.confidence_threshold,
            max_results: defaults.max_results,
            temperature: 0.7,
        }
    }

    /// Apply limits from the `[agent]` config section.
    pub fn with_config(mut self, config: &AgentConfig) -> Self {
        self.max_iterations = config.max_iterations;
        self.confidence_threshold = config.confidence_threshold;
        self.max_results = config.max_results;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Run the loop for one question.
    ///
    /// Search and evaluation failures end the loop early and are recorded in
    /// the trace; the partial result is still returned. Only a failure to
    /// generate a query is returned as an error.
    pub async fn run(
        &self,
        evaluator_model: &str,
        user_query: &str,
        listener: &dyn ProgressListener,
    ) -> Result<AgentResult, AgentError> {
        let mut state = LoopState::new(listener);
        info!(model = %evaluator_model, "Search agent: starting");

        for i in 0..self.max_iterations {
            let query = self
                .generate_query(evaluator_model, user_query, i, &state)
                .await
                .map_err(AgentError::QueryGeneration)?;

            state.result.search_queries.push(query.clone());
            state.log(&format!("🔍 Search {}: {}\n", i + 1, query));

            let confidence = match self
                .attempt(evaluator_model, user_query, &query, &mut state)
                .await
            {
                Ok(Attempt::NoResults) => continue,
                Ok(Attempt::Evaluated(confidence)) => confidence,
                Err(e) => {
                    warn!(iteration = i + 1, error = %e, "Search iteration failed");
                    state.log(&format!("\n❌ Search error: {e}\n"));
                    break;
                }
            };

            if confidence >= self.confidence_threshold {
                state.log("\n✅ Confidence threshold reached! Generating final answer...\n");
                break;
            }

            if let Some((previous, current)) = state.last_two_confidences()
                && current <= previous
            {
                state.log("\n⚠️ No significant progress. Stopping search...\n");
                break;
            }

            if i + 1 < self.max_iterations {
                state.log("\n🔄 Refining search...\n");
            }
        }

        state.log("\n✅ Search complete. Ready for final answer generation.\n");

        let result = state.result;
        info!(
            queries = result.search_queries.len(),
            iterations = result.iterations.len(),
            confidence = ?result.final_confidence(),
            "Search agent: finished"
        );
        Ok(result)
    }

    async fn generate_query(
        &self,
        model: &str,
        user_query: &str,
        iteration: u32,
        state: &LoopState<'_>,
    ) -> Result<String, ProviderError> {
        let prompt = if iteration == 0 {
            prompts::initial_query(user_query)
        } else {
            match state.result.iterations.last() {
                Some(prev) => prompts::refined_query(user_query, &prev.query, &prev.evaluation),
                None => {
                    let previous = state
                        .result
                        .search_queries
                        .last()
                        .map(String::as_str)
                        .unwrap_or(user_query);
                    prompts::refined_query(user_query, previous, "No results found.")
                }
            }
        };

        let text = self.ask(model, prompt).await?;
        let query = prompts::clean_query(&text);
        debug!(iteration = iteration + 1, query = %query, "Generated search query");

        if query.is_empty() {
            return Ok(user_query.trim().to_string());
        }
        Ok(query)
    }

    async fn attempt(
        &self,
        model: &str,
        user_query: &str,
        query: &str,
        state: &mut LoopState<'_>,
    ) -> Result<Attempt, IterationError> {
        let mut response = self.search.search(query).await?;
        response.results.truncate(self.max_results);
        let results = response.results;

        if results.is_empty() {
            state.log("❌ No results found\n");
            return Ok(Attempt::NoResults);
        }

        state.log(&format!("✅ Found {} results\n", results.len()));

        let formatted = format_results(&results, self.max_results);
        state
            .result
            .accumulated_context
            .push_str(&format!("\n\n--- Search Results for: {query} ---\n{formatted}"));

        let prompt = prompts::evaluation(user_query, &formatted, &state.result.accumulated_context);
        let evaluation = self.ask(model, prompt).await?;
        let evaluation = evaluation.trim().to_string();

        state.log(&format!("📊 {evaluation}\n"));

        let confidence = Evaluation::parse(&evaluation).confidence();
        debug!(query = %query, confidence, "Evaluated search results");

        state.result.iterations.push(SearchIteration {
            query: query.to_string(),
            results,
            evaluation,
            confidence,
        });

        Ok(Attempt::Evaluated(confidence))
    }

    async fn ask(&self, model: &str, prompt: String) -> Result<String, ProviderError> {
        let request = ProviderRequest::prompt(model, prompt).with_temperature(self.temperature);
        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }
}
