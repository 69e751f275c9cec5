use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::api::middleware::AppError;
use crate::models::{ConnectionParams, ConnectionView, Conversation, SessionView, Turn};
use crate::services::database::DatabaseGateway;
use crate::services::query_pipeline::{QueryPipeline, TurnError, TurnOutcome};

/// Explicit session context: the conversation, the live database handle and
/// the parameters that opened it
pub struct ChatSession {
    id: String,
    params: ConnectionParams,
    gateway: Box<dyn DatabaseGateway>,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(id: String, params: ConnectionParams, gateway: Box<dyn DatabaseGateway>) -> Self {
        Self {
            id,
            params,
            gateway,
            conversation: Conversation::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn gateway(&self) -> &dyn DatabaseGateway {
        self.gateway.as_ref()
    }

    /// Swap in a gateway built from re-submitted parameters. History is kept.
    pub fn reconnect(&mut self, params: ConnectionParams, gateway: Box<dyn DatabaseGateway>) {
        self.params = params;
        self.gateway = gateway;
    }

    /// Run one user turn.
    ///
    /// The pipeline sees only the turns before this question. Afterwards the
    /// question and the reply (the answer, or the error text when the turn
    /// failed) are appended, in that order.
    pub async fn ask(
        &mut self,
        question: &str,
        pipeline: &QueryPipeline,
    ) -> Result<Result<TurnOutcome, TurnError>, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question cannot be empty".to_string()));
        }

        let outcome = pipeline
            .answer(question, self.conversation.turns(), self.gateway.as_ref())
            .await;

        let reply = match &outcome {
            Ok(turn) => turn.answer.clone(),
            Err(e) => {
                tracing::warn!("Turn failed in session {}: {}", self.id, e);
                e.to_string()
            }
        };

        self.conversation.push(Turn::human(question));
        self.conversation.push(Turn::assistant(reply));

        Ok(outcome)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id.clone(),
            connection: ConnectionView::from(&self.params),
            history: self.conversation.turns().to_vec(),
        }
    }
}

/// In-memory registry of independent chat sessions.
///
/// Each session sits behind its own mutex, so turns within a session run one
/// at a time while separate sessions never contend.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ChatSession) -> Arc<Mutex<ChatSession>> {
        let id = session.id().to_string();
        let session = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, session.clone());
        session
    }

    pub async fn get(&self, id: &str) -> Result<Arc<Mutex<ChatSession>>, AppError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatabaseType, Role, GREETING};
    use crate::services::testing::{StubCompletion, StubGateway};

    fn params() -> ConnectionParams {
        ConnectionParams {
            host: "localhost".to_string(),
            port: "3306".to_string(),
            user: "root".to_string(),
            password: "admin".to_string(),
            database: "Chinook".to_string(),
            database_type: DatabaseType::MySQL,
        }
    }

    fn session(result: Result<String, AppError>) -> ChatSession {
        ChatSession::new(
            "s-1".to_string(),
            params(),
            Box::new(StubGateway::new("CREATE TABLE Artist (ArtistId INT)", result)),
        )
    }

    #[tokio::test]
    async fn test_successful_turn_appends_two_turns() {
        let mut session = session(Ok("42".to_string()));
        let completion = Arc::new(StubCompletion::new(vec![
            Ok("SELECT COUNT(*) FROM Artist;".to_string()),
            Ok("There are 42 artists.".to_string()),
        ]));
        let pipeline = QueryPipeline::new(completion.clone());

        let outcome = session
            .ask("How many artists are there?", &pipeline)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.answer, "There are 42 artists.");
        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].text(), GREETING);
        assert_eq!(turns[1].role(), Role::Human);
        assert_eq!(turns[1].text(), "How many artists are there?");
        assert_eq!(turns[2].role(), Role::Assistant);
        assert_eq!(turns[2].text(), "There are 42 artists.");
    }

    #[tokio::test]
    async fn test_current_question_is_not_in_its_own_history() {
        let mut session = session(Ok("42".to_string()));
        let completion = Arc::new(StubCompletion::new(vec![
            Ok("SELECT 1;".to_string()),
            Ok("ok".to_string()),
        ]));
        let pipeline = QueryPipeline::new(completion.clone());

        session.ask("What is the newest album?", &pipeline).await.unwrap().unwrap();

        for prompt in completion.prompts() {
            assert!(!prompt.contains("Human: What is the newest album?"));
            assert!(prompt.contains(&format!("AI: {}", GREETING)));
        }
    }

    #[tokio::test]
    async fn test_failed_turn_records_error_as_assistant_reply() {
        let mut session = session(Err(AppError::Execution("unknown table".to_string())));
        let completion = Arc::new(StubCompletion::new(vec![Ok("SELECT * FROM Singer;".to_string())]));
        let pipeline = QueryPipeline::new(completion.clone());

        let outcome = session.ask("List singers", &pipeline).await.unwrap();
        assert!(outcome.is_err());

        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].text(), "List singers");
        assert_eq!(turns[2].role(), Role::Assistant);
        assert!(turns[2].text().contains("unknown table"));
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_without_appending() {
        let mut session = session(Ok("1".to_string()));
        let pipeline = QueryPipeline::new(Arc::new(StubCompletion::new(vec![])));

        let result = session.ask("   ", &pipeline).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(session.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_keeps_history() {
        let mut session = session(Ok("42".to_string()));
        let pipeline = QueryPipeline::new(Arc::new(StubCompletion::new(vec![
            Ok("SELECT 1;".to_string()),
            Ok("one".to_string()),
        ])));
        session.ask("one?", &pipeline).await.unwrap().unwrap();

        let mut new_params = params();
        new_params.database = "Sakila".to_string();
        session.reconnect(new_params, Box::new(StubGateway::new("", Ok("0".to_string()))));

        assert_eq!(session.params().database, "Sakila");
        assert_eq!(session.conversation().len(), 3);
        assert_eq!(session.view().connection.database, "Sakila");
    }

    #[test]
    fn test_store_insert_get_remove() {
        tokio_test::block_on(async {
            let store = SessionStore::new();
            store.insert(session(Ok("1".to_string()))).await;
            assert_eq!(store.len().await, 1);

            let found = store.get("s-1").await.unwrap();
            assert_eq!(found.lock().await.id(), "s-1");

            assert!(store.remove("s-1").await);
            assert!(!store.remove("s-1").await);
            assert!(matches!(store.get("s-1").await, Err(AppError::NotFound(_))));
        });
    }
}
