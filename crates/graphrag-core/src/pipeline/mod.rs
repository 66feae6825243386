//! The GraphRAG pipeline: extraction, summarization and community
//! detection over a shared LLM and graph store.

pub mod community;
pub mod extract;
pub mod main;
pub mod merge;
pub mod parser;
pub mod prompts;
mod rows;
pub mod summarize;

pub use community::CommunityEngine;
pub use extract::ExtractionEngine;
pub use main::GraphRag;
pub use summarize::SummarizationEngine;

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted doubles for the engine tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{GraphRagError, GraphRagResult};
    use crate::traits::{GenerationOptions, GraphStore, Llm, LlmResponse, QueryParams, Row};
    use crate::types::Message;

    /// An [`Llm`] whose answers are scripted by substring match against the
    /// request messages. Unmatched requests produce an empty completion.
    pub struct ScriptedLlm {
        scripts: Vec<(String, String)>,
        failures: Vec<String>,
    }

    impl ScriptedLlm {
        pub fn new(scripts: Vec<(String, String)>) -> Self {
            Self {
                scripts,
                failures: Vec::new(),
            }
        }

        /// Fail any request whose messages contain `pattern`.
        pub fn fail_on(mut self, pattern: &str) -> Self {
            self.failures.push(pattern.to_string());
            self
        }
    }

    #[async_trait]
    impl Llm for ScriptedLlm {
        async fn generate(
            &self,
            messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> GraphRagResult<LlmResponse> {
            let text: String = messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");

            if let Some(pattern) = self.failures.iter().find(|p| text.contains(p.as_str())) {
                return Err(GraphRagError::llm(format!(
                    "scripted failure for pattern {pattern:?}"
                )));
            }

            let content = self
                .scripts
                .iter()
                .find(|(pattern, _)| text.contains(pattern.as_str()))
                .map(|(_, response)| response.clone())
                .unwrap_or_default();
            Ok(LlmResponse {
                content: Some(content),
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    /// A [`GraphStore`] that records `run` and `fetch` calls and replays
    /// scripted `fetch` results in FIFO order.
    pub struct RecordingStore {
        runs: Mutex<Vec<(String, QueryParams)>>,
        fetches: Mutex<VecDeque<Vec<Row>>>,
        fetch_calls: Mutex<Vec<(String, QueryParams)>>,
        closed: Mutex<bool>,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self {
                runs: Mutex::new(Vec::new()),
                fetches: Mutex::new(VecDeque::new()),
                fetch_calls: Mutex::new(Vec::new()),
                closed: Mutex::new(false),
            }
        }

        /// Queue the result set for the next unanswered `fetch`.
        pub fn script_fetch(&self, rows: Vec<Row>) {
            self.fetches.lock().unwrap().push_back(rows);
        }

        /// All `run` invocations recorded so far.
        pub fn queries(&self) -> Vec<(String, QueryParams)> {
            self.runs.lock().unwrap().clone()
        }

        /// All `fetch` invocations recorded so far.
        pub fn fetch_queries(&self) -> Vec<(String, QueryParams)> {
            self.fetch_calls.lock().unwrap().clone()
        }

        pub fn closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    #[async_trait]
    impl GraphStore for RecordingStore {
        async fn run(&self, query: &str, params: QueryParams) -> GraphRagResult<()> {
            self.runs.lock().unwrap().push((query.to_string(), params));
            Ok(())
        }

        async fn fetch(&self, query: &str, params: QueryParams) -> GraphRagResult<Vec<Row>> {
            self.fetch_calls
                .lock()
                .unwrap()
                .push((query.to_string(), params));
            Ok(self
                .fetches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }

        async fn close(&self) -> GraphRagResult<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }
}
