use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{CONVERSATION_WINDOW, MAX_TOKENS, TEMPERATURE};
use crate::error::{ChatError, MESSAGE_REQUIRED};
use crate::model::{ChatCompletion, CompletionRequest};
use crate::web::models::{ChatResponse, Message, Role};

pub const NO_RESPONSE: &str = "No response generated";

/// Bridges a chat request to the completion provider.
///
/// Holds no per-request state; one instance serves every request.
pub struct ChatRelay {
    llm: Arc<dyn ChatCompletion>,
    model: String,
    persona: String,
}

impl ChatRelay {
    pub fn new(
        llm: Arc<dyn ChatCompletion>,
        model: impl Into<String>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            persona: persona.into(),
        }
    }

    /// Runs one chat turn for a parsed JSON body.
    pub async fn handle(&self, body: &Value) -> Result<ChatResponse, ChatError> {
        let request_id = Uuid::new_v4();

        let message = match body
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
        {
            Some(message) => message,
            None => {
                warn!("Chat request {} rejected: missing message", request_id);
                return Err(ChatError::InvalidInput(MESSAGE_REQUIRED));
            }
        };

        let window = recent_window(sanitize_conversation(body.get("conversation")));
        info!(
            "Chat request {}: {} characters, {} history messages",
            request_id,
            message.chars().count(),
            window.len()
        );

        let user_message = Message::new(Role::User, message);
        let prompt = self.build_prompt(&window, &user_message);

        let completion = self
            .llm
            .complete(&CompletionRequest {
                model: &self.model,
                messages: &prompt,
                max_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
            })
            .await
            .map_err(|e| {
                error!("Chat request {} failed: {}", request_id, e);
                ChatError::from(e)
            })?;

        let response = completion
            .content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| {
                warn!("Chat request {}: provider returned no content", request_id);
                NO_RESPONSE.to_string()
            });
        debug!("Chat request {} answered", request_id);

        // Client-supplied system entries reach the prompt but never the transcript.
        let mut conversation: Vec<Message> = window
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();
        conversation.push(user_message);
        conversation.push(Message::new(Role::Assistant, response.clone()));

        Ok(ChatResponse {
            response,
            conversation,
            usage: completion.usage,
        })
    }

    fn build_prompt(&self, window: &[Message], user_message: &Message) -> Vec<Message> {
        let mut prompt = Vec::with_capacity(window.len() + 2);
        prompt.push(Message::new(Role::System, self.persona.as_str()));
        prompt.extend_from_slice(window);
        prompt.push(user_message.clone());
        prompt
    }
}

/// Keeps the well-formed entries of a client-supplied conversation.
/// Anything that is not an array yields an empty history.
fn sanitize_conversation(conversation: Option<&Value>) -> Vec<Message> {
    let Some(entries) = conversation.and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_object()?;
            let role = entry.get("role")?.as_str().and_then(Role::from_tag)?;
            let content = entry.get("content")?.as_str()?;
            Some(Message::new(role, content))
        })
        .collect()
}

fn recent_window(mut messages: Vec<Message>) -> Vec<Message> {
    if messages.len() > CONVERSATION_WINDOW {
        messages.drain(..messages.len() - CONVERSATION_WINDOW);
    }
    messages
}
