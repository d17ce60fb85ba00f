//! AI summarization of search results

use crate::llm::{ChatMessage, CompletionRequest, LlmService};
use crate::results::SearchResult;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const SYSTEM_PROMPT: &str = "You are a research assistant. Answer the user's question using only \
the numbered search results provided. Cite sources with their bracketed number, for example [1] \
or [2][3], matching the order the results are listed in. Be concise and say so when the results \
do not answer the question.";

/// Concatenate results into numbered blocks, 1-based
pub fn combine_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut block = format!("[{}] {}\n{}\n{}", i + 1, r.title, r.link, r.snippet);
            if let Some(ref content) = r.content {
                block.push('\n');
                block.push_str(content);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Plain listing used when no synthesis is available
pub fn format_listing(query: &str, results: &[SearchResult]) -> String {
    let mut listing = format!("Found {} results for \"{}\".", results.len(), query);
    for (i, r) in results.iter().enumerate() {
        listing.push_str(&format!("\n{}. {} - {}", i + 1, r.title, r.link));
    }
    listing
}

pub struct Summarizer {
    llm: Arc<dyn LlmService>,
    temperature: f32,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Cited synthesis of `results`, or the listing when the LLM fails
    pub async fn summarize(&self, query: &str, results: &[SearchResult]) -> String {
        match self.summarize_results(query, results).await {
            Some(text) => text,
            None => format_listing(query, results),
        }
    }

    /// Cited synthesis of `results`; `None` when there is nothing to summarize or the LLM fails
    pub async fn summarize_results(&self, query: &str, results: &[SearchResult]) -> Option<String> {
        if results.is_empty() {
            return None;
        }
        self.summarize_text(query, &combine_results(results)).await
    }

    /// Ask the LLM about pre-combined result text; `None` on any failure
    pub async fn summarize_text(&self, query: &str, combined: &str) -> Option<String> {
        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::user(format!(
                "Question: {}\n\nSearch results:\n{}",
                query, combined
            ))],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.llm.complete(request).await {
            Ok(completion) if !completion.text.trim().is_empty() => {
                debug!("Summary of {} chars", completion.text.len());
                Some(completion.text.trim().to_string())
            }
            Ok(_) => {
                warn!("LLM returned an empty summary");
                None
            }
            Err(e) => {
                warn!("Summarization failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Completion;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedLlm {
        reply: Result<String, String>,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    #[async_trait]
    impl LlmService for FixedLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
            *self.last_request.lock().unwrap() = Some(request);
            match &self.reply {
                Ok(text) => Ok(Completion { text: text.clone() }),
                Err(e) => Err(anyhow!(e.clone())),
            }
        }
    }

    fn llm(reply: Result<&str, &str>) -> Arc<FixedLlm> {
        Arc::new(FixedLlm {
            reply: reply.map(String::from).map_err(String::from),
            last_request: Mutex::new(None),
        })
    }

    fn results() -> Vec<SearchResult> {
        vec![
            SearchResult::new("https://a.com", "Alpha", 1).with_snippet("first"),
            SearchResult::new("https://b.com", "Beta", 2),
        ]
    }

    #[test]
    fn test_combine_results() {
        let mut items = results();
        items[1].content = Some("page body".to_string());
        let combined = combine_results(&items);
        assert_eq!(
            combined,
            "[1] Alpha\nhttps://a.com\nfirst\n\n[2] Beta\nhttps://b.com\n\npage body"
        );
    }

    #[test]
    fn test_format_listing() {
        let listing = format_listing("rust", &results());
        assert!(listing.starts_with("Found 2 results for \"rust\"."));
        assert!(listing.contains("2. Beta - https://b.com"));
    }

    #[tokio::test]
    async fn test_summary_passes_through() {
        let service = llm(Ok("Rust is fast [1]."));
        let summarizer = Summarizer::new(service.clone());

        assert_eq!(summarizer.summarize("rust", &results()).await, "Rust is fast [1].");
        let request = service.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert!(request.messages[0].content.contains("[2] Beta"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_without_error_text() {
        let summarizer = Summarizer::new(llm(Err("upstream 503 secret-token")));
        let analysis = summarizer.summarize("rust", &results()).await;

        assert!(analysis.starts_with("Found 2 results"));
        assert!(!analysis.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_empty_reply_is_failure() {
        let summarizer = Summarizer::new(llm(Ok("   ")));
        assert!(summarizer.summarize_text("rust", "[1] x").await.is_none());
    }
}
