use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::application::{ConversationEngine, EngineConfig, EngineState, IngestionService};
use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub llm: Arc<dyn LlmService>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(ingestion: Arc<IngestionService>, llm: Arc<dyn LlmService>, config: AppConfig) -> Self {
        Self {
            ingestion,
            llm,
            sessions: Arc::new(SessionRegistry::default()),
            config: Arc::new(config),
        }
    }

    /// Creates a session, attaching the shared index when one exists.
    pub fn create_session(&self) -> Result<(Uuid, Arc<ConversationEngine>), DomainError> {
        let engine = ConversationEngine::new(self.llm.clone(), EngineConfig::from(&self.config.config))?
            .with_prompts(self.config.prompts.clone());
        if let Some(index) = self.ingestion.index()? {
            engine.initialize(index)?;
        }

        let engine = Arc::new(engine);
        let id = self.sessions.insert(engine.clone())?;
        info!(session_id = %id, "session created");
        Ok((id, engine))
    }

    /// Looks up a session for answering, attaching the index if it was
    /// created before anything was ingested.
    pub fn ready_session(&self, id: Uuid) -> Result<Arc<ConversationEngine>, DomainError> {
        let engine = self.sessions.get(id)?;
        if engine.state()? == EngineState::Uninitialized {
            let index = self
                .ingestion
                .index()?
                .ok_or_else(|| DomainError::not_ready("no documents have been ingested"))?;
            engine.initialize(index)?;
        }
        Ok(engine)
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<ConversationEngine>>>,
}

impl SessionRegistry {
    pub fn insert(&self, engine: Arc<ConversationEngine>) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();
        self.sessions
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .insert(id, engine);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<ConversationEngine>, DomainError> {
        self.sessions
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("session {id}")))
    }

    pub fn len(&self) -> Result<usize, DomainError> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }
}
