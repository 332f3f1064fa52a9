//! services/api/src/adapters/analysis_llm.rs
//!
//! This module contains the adapter for the real text-generation model.
//! It implements the `TextGenerationProvider` port from the `core` crate
//! using an OpenAI-compatible chat-completions API (OpenAI or DeepSeek,
//! depending on which credential was configured at startup).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use diagnostic_core::domain::{ChatMessage, ChatRole, Report};
use diagnostic_core::ports::{PortError, PortResult, TextGenerationProvider};
use diagnostic_core::prompt;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationProvider` using an
/// OpenAI-compatible LLM. One model handles the structured analysis call,
/// another (usually cheaper) one handles advisory chat.
#[derive(Clone)]
pub struct OpenAiTextAdapter {
    client: Client<OpenAIConfig>,
    analysis_model: String,
    chat_model: String,
}

impl OpenAiTextAdapter {
    /// Creates a new `OpenAiTextAdapter`.
    pub fn new(client: Client<OpenAIConfig>, analysis_model: String, chat_model: String) -> Self {
        Self {
            client,
            analysis_model,
            chat_model,
        }
    }

    fn first_choice_content(
        response: async_openai::types::chat::CreateChatCompletionResponse,
    ) -> PortResult<String> {
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::MalformedResponse(
                    "model response contained no text content".to_string(),
                ))
            }
        } else {
            Err(PortError::MalformedResponse(
                "model returned no choices in its response".to_string(),
            ))
        }
    }
}

//=========================================================================================
// `TextGenerationProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationProvider for OpenAiTextAdapter {
    /// Runs the structured analysis call. The returned text is raw model
    /// output; the core's schema boundary decides whether it is usable.
    async fn generate_report(&self, answers_prompt: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt::ANALYSIS_SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::ExternalService(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(answers_prompt)
                .build()
                .map_err(|e| PortError::ExternalService(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.analysis_model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.7)
            .build()
            .map_err(|e| PortError::ExternalService(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::ExternalService(e.to_string()))?;

        Self::first_choice_content(response)
    }

    /// Replays the conversation behind a grounding system message built
    /// from the company's latest report.
    async fn generate_chat_reply(
        &self,
        report: &Report,
        conversation: &[ChatMessage],
    ) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt::advisor_system_prompt(report))
                .build()
                .map_err(|e| PortError::ExternalService(e.to_string()))?
                .into(),
        ];

        for turn in conversation {
            let message = match turn.role {
                ChatRole::User | ChatRole::System => {
                    // Caller-supplied system turns are demoted: the grounding
                    // context above is the only system instruction.
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.content.as_str())
                        .build()
                        .map_err(|e| PortError::ExternalService(e.to_string()))?
                        .into()
                }
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.as_str())
                    .build()
                    .map_err(|e| PortError::ExternalService(e.to_string()))?
                    .into(),
            };
            messages.push(message);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| PortError::ExternalService(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::ExternalService(e.to_string()))?;

        Self::first_choice_content(response)
    }
}
