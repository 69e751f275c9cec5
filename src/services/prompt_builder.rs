use crate::models::Turn;

/// Reference statements shown to the model as extra few-shot guidance
const REFERENCE_QUERIES: &str = include_str!("prompts/reference_queries.sql");

/// Question/SQL exemplars written against the Chinook music-store schema
const EXAMPLES: &[(&str, &str)] = &[
    (
        "which 3 artists have the most tracks?",
        "SELECT ArtistId, COUNT(*) as track_count FROM Track GROUP BY ArtistId ORDER BY track_count DESC LIMIT 3;",
    ),
    ("Name 10 artists", "SELECT Name FROM Artist LIMIT 10;"),
];

const ROLE_INTRO: &str = "You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.";

const IDENTIFIER_HINT: &str = r#"Avoid using variables with illegal characters, like "album\_count", maybe do "album_count" instead."#;

/// Renders the two prompts of a chat turn. Both are pure functions of their
/// arguments.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt asking the model for the SQL that answers `question`
    pub fn build_sql_prompt(schema: &str, history: &[Turn], question: &str) -> String {
        let examples = EXAMPLES
            .iter()
            .map(|(q, sql)| format!("Question: {}\nSQL Query: {}", q, sql))
            .collect::<Vec<_>>()
            .join("\n");

        let references = REFERENCE_QUERIES
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("  {}", line.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"{role_intro}
Based on the table schema below, write a SQL query that would answer the user's question. Take the conversation history into account.
{identifier_hint}

<SCHEMA>{schema}</SCHEMA>

Conversation History:
{history}

Write only the SQL query and nothing else. Do not wrap the SQL query in any other text, not even backticks.

For example:
{examples}

Some SQL statements for your reference:
{references}

Your turn:

Question: {question}
SQL Query:"#,
            role_intro = ROLE_INTRO,
            identifier_hint = IDENTIFIER_HINT,
            schema = schema,
            history = Self::render_history(history),
            examples = examples,
            references = references,
            question = question,
        )
    }

    /// Prompt asking the model to phrase the query result as an answer
    pub fn build_answer_prompt(
        schema: &str,
        history: &[Turn],
        question: &str,
        sql: &str,
        sql_result: &str,
    ) -> String {
        format!(
            r#"{role_intro}
Based on the table schema below, question, sql query, and sql response, write a natural language response.
{identifier_hint}

<SCHEMA>{schema}</SCHEMA>

Conversation History:
{history}
SQL Query: <SQL>{sql}</SQL>
User question: {question}
SQL Response: {sql_result}"#,
            role_intro = ROLE_INTRO,
            identifier_hint = IDENTIFIER_HINT,
            schema = schema,
            history = Self::render_history(history),
            sql = sql,
            question = question,
            sql_result = sql_result,
        )
    }

    /// One `Speaker: text` line per turn
    pub fn render_history(history: &[Turn]) -> String {
        if history.is_empty() {
            return "(none)".to_string();
        }

        history
            .iter()
            .map(|turn| format!("{}: {}", turn.role().label(), turn.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
