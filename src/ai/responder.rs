//! AI response generation with multi-backend fallback.

use crate::ai::backend::{
    ChatBackend, ChatParams, Message, OllamaBackend, OpenAiCompatBackend,
};
use crate::ai::context::ConversationContext;
use crate::ai::prompts::{self, Persona};
use crate::config::Settings;
use async_trait::async_trait;
use std::sync::Mutex;

const CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Spoken when no backend could be registered at startup.
pub const NO_BACKEND_MSG: &str =
    "My AI brain is offline. Set CEREBRAS_API_KEY or OPENAI_API_KEY in .env, or start Ollama.";

/// Spoken when every registered backend failed for one request.
pub const ALL_FAILED_MSG: &str = "My circuits are fried. Try again in a moment.";

/// Anything that can turn user input into a reply. The command router only
/// sees this trait, so tests can substitute a scripted responder.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    /// Always returns speakable text; infrastructure failures surface as
    /// in-character fallback messages, never as errors.
    async fn get_response(
        &self,
        user_input: &str,
        honesty: f32,
        humor: f32,
        target_language: &str,
    ) -> String;
}

pub struct AiResponder {
    backends: Vec<Box<dyn ChatBackend>>,
    history: Mutex<ConversationContext>,
    persona: Persona,
    params: ChatParams,
}

impl AiResponder {
    /// Build the backend registry from configuration. Each candidate is
    /// included only if usable (key present, or local server reachable);
    /// order follows the configured priority list.
    pub async fn initialize(settings: &Settings) -> Self {
        let mut backends: Vec<Box<dyn ChatBackend>> = Vec::new();

        for name in &settings.backend_order {
            match name.as_str() {
                "cerebras" => {
                    if let Some(key) = settings.cerebras_key() {
                        backends.push(Box::new(OpenAiCompatBackend::new(
                            "cerebras",
                            CEREBRAS_BASE_URL,
                            key,
                            &settings.cerebras_model,
                            settings.timings.cloud_timeout,
                        )));
                    }
                }
                "openai" => {
                    if let Some(key) = settings.openai_key() {
                        backends.push(Box::new(OpenAiCompatBackend::new(
                            "openai",
                            OPENAI_BASE_URL,
                            key,
                            &settings.openai_model,
                            settings.timings.cloud_timeout,
                        )));
                    }
                }
                "ollama" => {
                    let ollama = OllamaBackend::new(
                        &settings.ollama_url,
                        &settings.ollama_model,
                        settings.timings.local_timeout,
                    );
                    if ollama.probe(settings.timings.ollama_probe_timeout).await {
                        backends.push(Box::new(ollama));
                    }
                }
                other => log::warn!("Unknown AI backend '{}' in priority list, skipping", other),
            }
        }

        if backends.is_empty() {
            log::warn!("No AI backend available, responses will be canned");
        } else {
            let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
            log::info!("AI backends ready: {}", names.join(" -> "));
        }

        Self {
            backends,
            history: Mutex::new(ConversationContext::new(settings.history_capacity)),
            persona: settings.persona,
            params: ChatParams {
                max_tokens: settings.ai_max_tokens,
                temperature: settings.ai_temperature,
            },
        }
    }

    /// Test seam: a responder over an explicit backend list.
    pub fn with_backends(
        backends: Vec<Box<dyn ChatBackend>>,
        persona: Persona,
        history_capacity: usize,
    ) -> Self {
        Self {
            backends,
            history: Mutex::new(ConversationContext::new(history_capacity)),
            persona,
            params: ChatParams::default(),
        }
    }

    pub fn has_backends(&self) -> bool {
        !self.backends.is_empty()
    }

    pub fn clear_history(&self) {
        self.history.lock().unwrap().clear();
    }

    fn build_messages(
        &self,
        user_input: &str,
        honesty: f32,
        humor: f32,
        language: &str,
    ) -> Vec<Message> {
        let mut messages = vec![Message::system(prompts::system_prompt(
            self.persona,
            honesty,
            humor,
            language,
        ))];
        messages.extend(self.history.lock().unwrap().messages().cloned());
        messages.push(Message::user(user_input));
        messages
    }
}

#[async_trait]
impl ChatResponder for AiResponder {
    async fn get_response(
        &self,
        user_input: &str,
        honesty: f32,
        humor: f32,
        target_language: &str,
    ) -> String {
        if self.backends.is_empty() {
            return NO_BACKEND_MSG.to_string();
        }

        let messages = self.build_messages(user_input, honesty, humor, target_language);

        for backend in &self.backends {
            let attempt = tokio::time::timeout(
                backend.timeout(),
                backend.invoke(&messages, &self.params),
            )
            .await;

            match attempt {
                Ok(Ok(reply)) => {
                    self.history.lock().unwrap().add_exchange(user_input, &reply);
                    return reply;
                }
                Ok(Err(e)) => {
                    log::warn!("Backend '{}' failed: {}", backend.name(), e);
                }
                Err(_) => {
                    log::warn!(
                        "Backend '{}' timed out after {:?}",
                        backend.name(),
                        backend.timeout()
                    );
                }
            }
        }

        ALL_FAILED_MSG.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::backend::BackendError;
    use std::time::Duration;

    struct CannedBackend {
        reply: &'static str,
    }

    #[async_trait]
    impl ChatBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }
        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
        async fn invoke(
            &self,
            _messages: &[Message],
            _params: &ChatParams,
        ) -> Result<String, BackendError> {
            Ok(self.reply.to_string())
        }
    }

    #[tokio::test]
    async fn empty_registry_yields_offline_message() {
        let responder = AiResponder::with_backends(Vec::new(), Persona::Assistant, 20);
        let reply = responder.get_response("hi", 0.5, 0.5, "english").await;
        assert_eq!(reply, NO_BACKEND_MSG);
    }

    #[tokio::test]
    async fn successful_reply_lands_in_history() {
        let responder = AiResponder::with_backends(
            vec![Box::new(CannedBackend { reply: "pong" })],
            Persona::Assistant,
            20,
        );
        let reply = responder.get_response("ping", 0.5, 0.5, "english").await;
        assert_eq!(reply, "pong");

        // History now precedes the new user turn in the next request.
        let messages = responder.build_messages("again", 0.5, 0.5, "english");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "ping");
        assert_eq!(messages[2].content, "pong");
    }

    #[test]
    fn system_prompt_is_always_first() {
        let responder = AiResponder::with_backends(Vec::new(), Persona::Tars, 20);
        let messages = responder.build_messages("hello", 0.9, 0.1, "french");
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Respond in french."));
        assert_eq!(messages.last().unwrap().role, "user");
    }
}
