use std::sync::Arc;
use thiserror::Error;

use crate::api::middleware::AppError;
use crate::models::Turn;
use crate::services::database::DatabaseGateway;
use crate::services::llm_service::CompletionClient;
use crate::services::prompt_builder::PromptBuilder;

/// Everything one successful turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub sql: String,
    pub result: String,
    pub answer: String,
}

/// A failed turn, with the SQL the model produced if it got that far
#[derive(Debug, Error)]
#[error("{source}")]
pub struct TurnError {
    pub sql: Option<String>,
    pub source: AppError,
}

impl TurnError {
    fn before_sql(source: AppError) -> Self {
        Self { sql: None, source }
    }

    fn after_sql(sql: &str, source: AppError) -> Self {
        Self {
            sql: Some(sql.to_string()),
            source,
        }
    }
}

/// Question -> SQL -> execution -> answer, for a single user turn.
///
/// Steps run strictly in sequence. The first failure ends the turn: nothing is
/// retried and nothing is cached between turns.
#[derive(Clone)]
pub struct QueryPipeline {
    completion: Arc<dyn CompletionClient>,
}

impl QueryPipeline {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// `history` holds the turns before this question, never the question itself
    pub async fn answer(
        &self,
        question: &str,
        history: &[Turn],
        gateway: &dyn DatabaseGateway,
    ) -> Result<TurnOutcome, TurnError> {
        // One snapshot serves both prompts of the turn
        let schema = gateway.schema_info().await.map_err(TurnError::before_sql)?;
        tracing::debug!("Fetched schema snapshot ({} bytes)", schema.len());

        let sql_prompt = PromptBuilder::build_sql_prompt(&schema, history, question);
        let sql = self
            .completion
            .complete(&sql_prompt)
            .await
            .map_err(TurnError::before_sql)?
            .trim()
            .to_string();
        tracing::info!("Generated {} SQL from natural language: {}", gateway.database_type().as_str(), sql);

        let result = gateway
            .execute(&sql)
            .await
            .map_err(|e| TurnError::after_sql(&sql, e))?;
        tracing::debug!("SQL returned {} bytes", result.len());

        let answer_prompt = PromptBuilder::build_answer_prompt(&schema, history, question, &sql, &result);
        let answer = self
            .completion
            .complete(&answer_prompt)
            .await
            .map_err(|e| TurnError::after_sql(&sql, e))?;

        Ok(TurnOutcome { sql, result, answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Conversation;
    use crate::services::testing::{StubCompletion, StubGateway};

    #[tokio::test]
    async fn test_artist_count_scenario() {
        let completion = Arc::new(StubCompletion::new(vec![
            Ok("SELECT COUNT(*) FROM Artist;".to_string()),
            Ok("There are 42 artists.".to_string()),
        ]));
        let gateway = StubGateway::new("CREATE TABLE Artist (ArtistId INT)", Ok("42".to_string()));
        let pipeline = QueryPipeline::new(completion.clone());
        let history = Conversation::new();

        let outcome = pipeline
            .answer("How many artists are there?", history.turns(), &gateway)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "There are 42 artists.");
        assert_eq!(outcome.sql, "SELECT COUNT(*) FROM Artist;");
        assert_eq!(outcome.result, "42");
        assert_eq!(gateway.executed(), vec!["SELECT COUNT(*) FROM Artist;".to_string()]);
        assert_eq!(completion.call_count(), 2);
    }

    #[tokio::test]
    async fn test_prompts_carry_schema_sql_and_result() {
        let completion = Arc::new(StubCompletion::new(vec![
            Ok("SELECT Name FROM Genre LIMIT 3;".to_string()),
            Ok("Rock, Jazz and Metal.".to_string()),
        ]));
        let gateway = StubGateway::new("CREATE TABLE Genre (Name VARCHAR)", Ok(r#"[["Rock"],["Jazz"],["Metal"]]"#.to_string()));
        let pipeline = QueryPipeline::new(completion.clone());

        pipeline.answer("Name 3 genres", &[], &gateway).await.unwrap();

        let prompts = completion.prompts();
        assert!(prompts[0].contains("CREATE TABLE Genre (Name VARCHAR)"));
        assert!(prompts[0].contains("Name 3 genres"));
        assert!(prompts[1].contains("SELECT Name FROM Genre LIMIT 3;"));
        assert!(prompts[1].contains(r#"[["Rock"],["Jazz"],["Metal"]]"#));
    }

    #[tokio::test]
    async fn test_generated_sql_is_trimmed_before_execution() {
        let completion = Arc::new(StubCompletion::new(vec![
            Ok("\n  SELECT 1;  \n".to_string()),
            Ok("One.".to_string()),
        ]));
        let gateway = StubGateway::new("", Ok("1".to_string()));

        QueryPipeline::new(completion).answer("one?", &[], &gateway).await.unwrap();
        assert_eq!(gateway.executed(), vec!["SELECT 1;".to_string()]);
    }

    #[tokio::test]
    async fn test_execution_error_skips_answer_call() {
        let completion = Arc::new(StubCompletion::new(vec![
            Ok("SELECT * FROM Singer;".to_string()),
            Ok("unused".to_string()),
        ]));
        let gateway = StubGateway::new("", Err(AppError::Execution("unknown table".to_string())));
        let pipeline = QueryPipeline::new(completion.clone());

        let err = pipeline.answer("List singers", &[], &gateway).await.unwrap_err();

        assert!(matches!(err.source, AppError::Execution(ref msg) if msg == "unknown table"));
        assert_eq!(err.sql.as_deref(), Some("SELECT * FROM Singer;"));
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_skips_execution() {
        let completion = Arc::new(StubCompletion::new(vec![Err(AppError::LlmService(
            "quota exceeded".to_string(),
        ))]));
        let gateway = StubGateway::new("", Ok("unused".to_string()));
        let pipeline = QueryPipeline::new(completion.clone());

        let err = pipeline.answer("How many tracks?", &[], &gateway).await.unwrap_err();

        assert!(matches!(err.source, AppError::LlmService(_)));
        assert!(err.sql.is_none());
        assert!(gateway.executed().is_empty());
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn test_history_is_passed_to_both_prompts() {
        let completion = Arc::new(StubCompletion::new(vec![
            Ok("SELECT 1;".to_string()),
            Ok("done".to_string()),
        ]));
        let gateway = StubGateway::new("", Ok("1".to_string()));
        let history = vec![Turn::assistant("Hello!"), Turn::human("Name 10 artists"), Turn::assistant("AC/DC, ...")];

        QueryPipeline::new(completion.clone())
            .answer("and their albums?", &history, &gateway)
            .await
            .unwrap();

        for prompt in completion.prompts() {
            assert!(prompt.contains("AI: Hello!\nHuman: Name 10 artists\nAI: AC/DC, ..."));
        }
    }
}
