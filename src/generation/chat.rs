//! OpenAI-compatible chat-completions client (Groq by default)
//!
//! Requires the `ai` feature to be enabled:
//! ```toml
//! textgauge = { version = "0.3", features = ["ai"] }
//! ```

use super::{GenerationError, GenerationParams, ResponseGenerator};

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Chat-completions client
#[allow(dead_code)]
pub struct ChatCompletionsClient {
    api_key: String,
    model: String,
    endpoint: String,
}

impl ChatCompletionsClient {
    /// Create a client reading the key from `GROQ_API_KEY`
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::from_env_var(DEFAULT_API_KEY_ENV)
    }

    /// Create a client reading the key from the named variable
    pub fn from_env_var(var: &str) -> Result<Self, GenerationError> {
        let api_key = std::env::var(var).map_err(|_| GenerationError::NoApiKey(var.to_string()))?;
        Ok(Self::with_key(api_key))
    }

    /// Create a client with a specific API key
    pub fn with_key(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Set the model to use
    pub fn model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set the chat-completions URL
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    #[cfg(feature = "ai")]
    fn send_request(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        use serde_json::json;

        let client = reqwest::blocking::Client::new();

        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": params.temperature,
            "top_p": params.top_p,
            "max_tokens": params.max_tokens
        });

        tracing::debug!(model = %self.model, temperature = params.temperature, "sending chat completion request");

        let response = client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(GenerationError::Api(format!("{}: {}", status, error_text)));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        extract_content(&json)
    }

    #[cfg(not(feature = "ai"))]
    fn send_request(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable)
    }
}

impl ResponseGenerator for ChatCompletionsClient {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        self.send_request(prompt, params)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body
pub fn extract_content(json: &serde_json::Value) -> Result<String, GenerationError> {
    json["choices"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| GenerationError::InvalidResponse("No content in response".to_string()))
}

/// Check if the HTTP generation feature is compiled in
pub fn is_generation_available() -> bool {
    cfg!(feature = "ai")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_variable() {
        let result = ChatCompletionsClient::from_env_var("TEXTGAUGE_TEST_UNSET_KEY_VAR");
        assert!(matches!(result, Err(GenerationError::NoApiKey(ref v)) if v == "TEXTGAUGE_TEST_UNSET_KEY_VAR"));
    }

    #[test]
    fn extract_content_from_choices() {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hello there." } }]
        });
        assert_eq!(extract_content(&body).unwrap(), "Hello there.");
    }

    #[test]
    fn extract_content_rejects_empty_choices() {
        let body = serde_json::json!({ "choices": [] });
        assert!(matches!(
            extract_content(&body),
            Err(GenerationError::InvalidResponse(_))
        ));
        assert!(extract_content(&serde_json::json!({})).is_err());
    }

    #[cfg(not(feature = "ai"))]
    #[test]
    fn generate_without_feature_is_unavailable() {
        let client = ChatCompletionsClient::with_key("k".into());
        let r = client.generate("hi", &GenerationParams::new(0.5, 0.9, 10));
        assert!(matches!(r, Err(GenerationError::Unavailable)));
        assert!(!is_generation_available());
    }
}
