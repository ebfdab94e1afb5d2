use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::application::index::EmbeddingIndex;
use crate::application::prompt::{select_context, PromptBuilder, PromptTemplates};
use crate::domain::{
    ports::{GenerationOptions, LlmService},
    Chunk, ConversationMemory, ConversationTurn, DomainError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Ready,
    Answering,
    Cleared,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub top_k: usize,
    /// Number of most recent turns shown to the model.
    pub history_window: usize,
    pub max_context_chars: usize,
    pub condense_question: bool,
    pub generation: GenerationOptions,
    /// Bound on every embedding or generation call made while answering.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            history_window: 6,
            max_context_chars: 6000,
            condense_question: true,
            generation: GenerationOptions::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(DomainError::invalid_config("top_k must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.generation.temperature) {
            return Err(DomainError::invalid_config(format!(
                "temperature {} is outside [0, 1]",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Chunk>,
}

/// Retrieval-augmented question answering for one conversation.
///
/// The engine owns its memory; the index may be shared between engines.
/// Memory is written exactly once per successful `ask`, after every
/// external call has returned. A failed or cancelled `ask` leaves the
/// conversation untouched.
pub struct ConversationEngine {
    llm: Arc<dyn LlmService>,
    index: RwLock<Option<Arc<EmbeddingIndex>>>,
    memory: ConversationMemory,
    state: Mutex<EngineState>,
    config: EngineConfig,
    prompts: PromptTemplates,
}

impl ConversationEngine {
    pub fn new(llm: Arc<dyn LlmService>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            llm,
            index: RwLock::new(None),
            memory: ConversationMemory::new(),
            state: Mutex::new(EngineState::Uninitialized),
            config,
            prompts: PromptTemplates::default(),
        })
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    pub fn state(&self) -> Result<EngineState> {
        Ok(*self.lock_state()?)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state(), Ok(EngineState::Ready))
    }

    /// Attaches the index to answer from.
    pub fn initialize(&self, index: Arc<EmbeddingIndex>) -> Result<()> {
        let mut state = self.lock_state()?;
        if *state == EngineState::Answering {
            return Err(DomainError::busy("cannot swap the index while answering"));
        }

        *self
            .index
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))? = Some(index);
        *state = EngineState::Ready;
        info!("conversation engine ready");
        Ok(())
    }

    fn current_index(&self) -> Result<Option<Arc<EmbeddingIndex>>> {
        Ok(self
            .index
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .clone())
    }

    pub async fn ask_default(&self, question: &str) -> Result<Answer> {
        self.ask(question, self.config.top_k).await
    }

    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn ask(&self, question: &str, top_k: usize) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::invalid_input("question must not be empty"));
        }

        let _answering = AnsweringGuard::enter(&self.state)?;
        let index = self
            .current_index()?
            .ok_or_else(|| DomainError::not_ready("no documents have been processed"))?;
        if top_k == 0 {
            return Err(DomainError::invalid_config("top_k must be greater than 0"));
        }

        let history = self.memory.recent(self.config.history_window)?;
        let prompts = PromptBuilder::new(&self.prompts);

        let search_query = if self.config.condense_question && !history.is_empty() {
            let prompt = prompts.condense_prompt(&history, question);
            let standalone = self
                .bounded("condensing question", self.llm.complete(&prompt, &self.config.generation))
                .await?;
            let standalone = standalone.trim();
            debug!(standalone, "condensed question");
            if standalone.is_empty() {
                question.to_string()
            } else {
                standalone.to_string()
            }
        } else {
            question.to_string()
        };

        let results = self
            .bounded("retrieving context", index.query(&search_query, top_k))
            .await?;
        let context = select_context(results, self.config.max_context_chars);

        let prompt = prompts.answer_prompt(&history, &context, question);
        let answer = self
            .bounded(
                "generating answer",
                self.llm
                    .complete_with_system(prompts.system(), &prompt, &self.config.generation),
            )
            .await?;
        let answer = answer.trim().to_string();

        let sources: Vec<Chunk> = context.into_iter().map(|r| r.chunk).collect();
        self.memory.append_exchange(
            ConversationTurn::user(question),
            ConversationTurn::assistant(
                answer.clone(),
                sources.iter().map(Chunk::source_ref).collect(),
            ),
        )?;

        info!(sources = sources.len(), "question answered");
        Ok(Answer { answer, sources })
    }

    async fn bounded<T>(
        &self,
        step: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(step, error = %e, "service call failed");
                Err(e)
            }
            Err(_) => {
                warn!(step, timeout_ms = self.config.request_timeout.as_millis() as u64, "service call timed out");
                Err(DomainError::timeout(format!("{step} exceeded {:?}", self.config.request_timeout)))
            }
        }
    }

    /// Forgets the conversation; the index stays attached.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        match *state {
            EngineState::Answering => {
                return Err(DomainError::busy("cannot clear while answering"));
            }
            EngineState::Uninitialized => {
                self.memory.clear()?;
                return Ok(());
            }
            EngineState::Ready | EngineState::Cleared => {}
        }

        *state = EngineState::Cleared;
        self.memory.clear()?;
        debug!("conversation cleared");
        *state = EngineState::Ready;
        Ok(())
    }

    pub fn history(&self) -> Result<Vec<ConversationTurn>> {
        self.memory.history()
    }

    pub fn transcript(&self) -> Result<String> {
        self.memory.transcript()
    }
}

/// Holds the engine in `Answering`; dropping it (including when the `ask`
/// future is cancelled) puts the engine back to `Ready`.
struct AnsweringGuard<'a> {
    state: &'a Mutex<EngineState>,
}

impl<'a> AnsweringGuard<'a> {
    fn enter(state: &'a Mutex<EngineState>) -> Result<Self> {
        let mut current = state
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        match *current {
            EngineState::Uninitialized => {
                Err(DomainError::not_ready("no documents have been processed"))
            }
            EngineState::Answering => Err(DomainError::busy("a question is already being answered")),
            EngineState::Ready | EngineState::Cleared => {
                *current = EngineState::Answering;
                Ok(Self { state })
            }
        }
    }
}

impl Drop for AnsweringGuard<'_> {
    fn drop(&mut self) {
        match self.state.lock() {
            Ok(mut state) => *state = EngineState::Ready,
            Err(poisoned) => *poisoned.into_inner() = EngineState::Ready,
        }
    }
}
