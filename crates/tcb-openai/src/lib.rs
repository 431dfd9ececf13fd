//! OpenAI adapter (chat completions).
//!
//! Implements the core `CompletionPort` over the `chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use tcb_core::{
    errors::Error,
    ports::{ChatTurn, CompletionPort},
    Result,
};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::External(format!("openai client build error: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn request_body(model: &str, turns: &[ChatTurn]) -> Value {
    let messages: Vec<Value> = turns
        .iter()
        .map(|t| json!({ "role": t.role.as_str(), "content": t.content }))
        .collect();
    json!({ "model": model, "messages": messages })
}

fn extract_content(v: &Value) -> Result<String> {
    let text = v
        .pointer("/choices/0/message/content")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(Error::External(
            "openai completion returned empty text".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl CompletionPort for OpenAiClient {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String> {
        let resp = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body(&self.model, turns))
            .send()
            .await
            .map_err(|e| Error::External(format!("openai request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "openai completion failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("openai json error: {e}")))?;

        let text = extract_content(&v)?;
        tracing::debug!(model = %self.model, chars = text.chars().count(), "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_maps_roles() {
        let body = request_body(
            "gpt-3.5-turbo",
            &[ChatTurn::system("be nice"), ChatTurn::user("hi")],
        );
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn extracts_first_choice() {
        let v = json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "  Welcome!  " } }]
        });
        assert_eq!(extract_content(&v).unwrap(), "Welcome!");
    }

    #[test]
    fn empty_choices_are_an_error() {
        assert!(extract_content(&json!({ "choices": [] })).is_err());
    }
}
