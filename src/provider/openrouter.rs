//! OpenRouter chat-completions client
//!
//! Speaks the OpenAI-compatible wire format: POST {base_url}/chat/completions
//! with a bearer credential, a system instruction constraining the model to
//! executable Python, and a user instruction embedding the dataset schema.

use super::{strip_code_fences, CodeGenerator, GenerationError, GenerationRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "You are a Python code generator. Return only executable Python code, no explanations.";

/// OpenRouter-compatible generation client
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            api_key: api_key.into(),
            max_tokens,
            temperature,
        }
    }

    fn build_user_prompt(request: &GenerationRequest) -> String {
        format!(
            "Create a Python visualization for this request: {}\n\n\
             DataFrame 'df' has columns: {}\n\
             Sample data:\n{}\n\n\
             Requirements:\n\
             - Use matplotlib, seaborn, or plotly\n\
             - Include plt.show() or fig.show()\n\
             - Return only Python code\n\
             - Use pandas for data manipulation",
            request.prompt_text,
            request.dataset_columns.join(", "),
            request.dataset_sample,
        )
    }
}

/// OpenAI-compatible chat request
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI-compatible chat response
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Pull the candidate source out of a parsed response: first choice,
/// fence-stripped. An empty choice list or empty stripped code is an
/// `EmptyGeneration`.
fn extract_candidate(response: ChatResponse) -> Result<String, GenerationError> {
    let content = response
        .choices
        .first()
        .map(|c| c.message.content.as_str())
        .ok_or(GenerationError::EmptyGeneration)?;

    let code = strip_code_fences(content);
    if code.trim().is_empty() {
        return Err(GenerationError::EmptyGeneration);
    }
    Ok(code)
}

#[async_trait]
impl CodeGenerator for OpenRouterClient {
    async fn generate(
        &self,
        model_id: &str,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);

        let chat_request = ChatRequest {
            model: model_id.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::build_user_prompt(request),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "https://github.com/ra90x/PromptVix")
            .header("X-Title", "PromptViz")
            .json(&chat_request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::Api {
                status: response.status().as_u16(),
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        let code = extract_candidate(chat_response)?;
        debug!(model = model_id, code_len = code.len(), "Extracted candidate code");
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(content: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessageResponse {
                    content: content.to_string(),
                },
            }],
        }
    }

    #[test]
    fn empty_choice_list_is_empty_generation() {
        let response = ChatResponse { choices: vec![] };
        assert!(matches!(
            extract_candidate(response),
            Err(GenerationError::EmptyGeneration)
        ));
    }

    #[test]
    fn blank_code_after_stripping_is_empty_generation() {
        assert!(matches!(
            extract_candidate(response_with("```python\n\n```")),
            Err(GenerationError::EmptyGeneration)
        ));
    }

    #[test]
    fn fenced_code_is_stripped() {
        let code = extract_candidate(response_with("```python\ndf.plot()\n```")).unwrap();
        assert_eq!(code, "df.plot()");
    }

    #[test]
    fn user_prompt_embeds_schema_and_sample() {
        let request = GenerationRequest {
            prompt_text: "Sales by region using Pie chart".to_string(),
            dataset_columns: vec!["Region".to_string(), "Sales".to_string()],
            dataset_sample: "Region Sales\nWest   100".to_string(),
        };
        let prompt = OpenRouterClient::build_user_prompt(&request);
        assert!(prompt.contains("Sales by region using Pie chart"));
        assert!(prompt.contains("columns: Region, Sales"));
        assert!(prompt.contains("West   100"));
    }
}
