//! Hosted chat completion tier using the `async-openai` crate.
//!
//! Works against any `OpenAI`-compatible API via the base URL override in
//! [`OrchestratorConfig`].

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_trait::async_trait;

use super::{GenerationBackend, GenerationRequest};
use crate::config::OrchestratorConfig;
use crate::error::GenerationError;

const TIER: &str = "hosted";

/// `OpenAI`-compatible hosted model.
pub struct HostedBackend {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl HostedBackend {
    /// Creates the tier from configuration. Without an API key every call
    /// fails with [`GenerationError::NotConfigured`].
    #[must_use]
    pub fn new(config: &OrchestratorConfig) -> Self {
        let client = config.hosted_api_key.as_ref().map(|key| {
            let mut openai_config = OpenAIConfig::new().with_api_key(key);
            if let Some(ref base_url) = config.hosted_base_url {
                openai_config = openai_config.with_api_base(base_url);
            }
            Client::with_config(openai_config)
        });

        Self {
            client,
            model: config.hosted_model.clone(),
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> CreateChatCompletionRequest {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(request.system.clone()),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.prompt.clone()),
                name: None,
            }),
        ];

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(request.temperature),
            top_p: Some(request.top_p),
            max_completion_tokens: Some(request.max_tokens),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for HostedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedBackend")
            .field("client", &self.client.as_ref().map(|_| "<async-openai::Client>"))
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl GenerationBackend for HostedBackend {
    fn name(&self) -> &'static str {
        TIER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let Some(client) = &self.client else {
            return Err(GenerationError::NotConfigured { tier: TIER });
        };

        tracing::debug!(model = %self.model, prompt_chars = request.prompt.len(), "hosted completion request");
        let response = client
            .chat()
            .create(self.build_request(request))
            .await
            .map_err(|e| GenerationError::Request {
                tier: TIER,
                message: e.to_string(),
                status: None,
            })?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse { tier: TIER })
    }
}
