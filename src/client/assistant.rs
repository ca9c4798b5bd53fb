//! Help assistant backed by a third-party text-generation endpoint.
//!
//! One stateless request per question, no retry, no streaming. Anything
//! other than a well-formed answer turns into [`FALLBACK_REPLY`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::AssistantConfig;

pub const SYSTEM_PROMPT: &str = "\
You are TaskFlow's virtual assistant. TaskFlow is a web platform for managing personal and team tasks with:
- To-do list creation, editing, and deletion
- Feedback collection and management
- A dashboard with task and feedback counts
Answer as a friendly and helpful assistant. Address questions about creating, editing or deleting tasks,
leaving feedback, how data is stored, and general information about TaskFlow.
If a question is outside TaskFlow's scope, politely redirect to the features TaskFlow provides.";

pub const FALLBACK_REPLY: &str = "Sorry, there was an error processing your request.";
pub const EMPTY_REPLY: &str = "No response";

/// Questions answered locally, without a request.
pub const FAQ: &[(&str, &str)] = &[
    ("How do I add a new task?", "Type your task in the input on the Todos page and press Enter. It appears at the top of your list."),
    ("Can I edit or delete tasks?", "Yes. Press e to edit the selected task, or d to delete it after confirming."),
    ("How do I leave feedback?", "Switch to the Feedback page, type your feedback and press Enter."),
    ("Is my data saved permanently?", "Your tasks and feedback are stored in the backend database and are there whenever you come back."),
    ("Do I need an account to use TaskFlow?", "No. TaskFlow does not require an account; everyone sees the same tasks and feedback."),
    ("Can I see how many tasks I have?", "Yes. The header shows how many tasks and feedback entries exist."),
    ("Can I use TaskFlow from my phone?", "Any terminal works, including one on a phone connected to a machine running TaskFlow."),
    ("Can I categorize tasks?", "Not yet. Tasks carry a text and a done flag; categories are planned."),
    ("Can I download my tasks?", "There is no export yet. The backend keeps everything in its SQLite database file."),
    ("How do I get support?", "Ask here, or leave a note on the Feedback page and the team will read it."),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender { User, Bot }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Plain text generated for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
pub fn extract_reply(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// Collapses line breaks and runs of whitespace into single spaces.
pub fn normalize_reply(text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }

pub struct GenerativeTextClient {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl GenerativeTextClient {
    pub fn new(config: AssistantConfig) -> Self { Self { client: reqwest::Client::new(), config } }
}

#[async_trait]
impl TextGenerator for GenerativeTextClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let res = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let value: Value = res.json().await?;
        extract_reply(&value).ok_or_else(|| anyhow!("unexpected response shape"))
    }
}

/// Chat transcript plus the generator answering free-form questions.
pub struct Assistant<G> {
    generator: G,
    messages: Vec<ChatMessage>,
}

impl<G: TextGenerator> Assistant<G> {
    pub fn new(generator: G) -> Self { Self { generator, messages: Vec::new() } }

    pub fn messages(&self) -> &[ChatMessage] { &self.messages }

    /// Answers one of the [`FAQ`] entries from the canned text.
    pub fn ask_faq(&mut self, index: usize) -> Option<&str> {
        let &(question, answer) = FAQ.get(index)?;
        self.push(Sender::User, question);
        self.push(Sender::Bot, answer);
        Some(answer)
    }

    /// Sends a free-form question. Blank questions are ignored.
    pub async fn ask(&mut self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }
        self.push(Sender::User, query);
        let prompt = format!("{SYSTEM_PROMPT}\nUser: {query}");
        let reply = match self.generator.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(text) => normalize_reply(&text),
            Err(err) => {
                tracing::warn!(error = %err, "assistant request failed");
                FALLBACK_REPLY.to_string()
            }
        };
        self.push(Sender::Bot, &reply);
        Some(reply)
    }

    fn push(&mut self, sender: Sender, text: &str) { self.messages.push(ChatMessage { sender, text: text.to_string() }); }
}
