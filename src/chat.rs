use thiserror::Error;
use tracing::{info, warn};

use crate::conversation::{Conversation, Message};
use crate::formatter;
use crate::gemini::{AnswerGenerator, GenerateError};
use crate::section::Section;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// A successful answer: the stored message and its formatted sections.
#[derive(Debug, Clone)]
pub struct Reply {
    pub message: Message,
    pub sections: Vec<Section>,
}

/// One chat transcript bound to an answer generator.
///
/// `submit` borrows the session mutably, so a second prompt cannot be sent
/// while an answer is still outstanding.
pub struct ChatSession<G> {
    generator: G,
    conversation: Conversation,
}

impl<G: AnswerGenerator> ChatSession<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Send a prompt and record the exchange.
    ///
    /// The user message is recorded even if generation fails; the assistant
    /// message only on success.
    pub async fn submit(&mut self, input: &str) -> Result<Reply, ChatError> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        self.conversation.push_user(prompt);
        info!(generator = self.generator.name(), turn = self.conversation.len(), "submitting prompt");

        let answer = match self.generator.generate(prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "failed to generate answer");
                return Err(e.into());
            }
        };

        let sections = formatter::format(&answer);
        let message = self.conversation.push_assistant(answer).clone();
        Ok(Reply { message, sections })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::conversation::Role;

    /// Pops one scripted outcome per call and records the prompts it saw.
    struct ScriptedGenerator {
        outcomes: Mutex<VecDeque<Result<String, GenerateError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(outcomes: Vec<Result<String, GenerateError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AnswerGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerateError::EmptyReply))
        }
    }

    #[tokio::test]
    async fn successful_turn_records_both_messages() {
        let generator = ScriptedGenerator::new(vec![Ok("# Answer\n- a\n- b".to_string())]);
        let mut session = ChatSession::new(generator);

        let reply = session.submit("  what?  ").await.unwrap();

        assert_eq!(reply.message.role, Role::Assistant);
        assert_eq!(reply.message.content, "# Answer\n- a\n- b");
        assert_eq!(reply.sections.len(), 2);
        assert_eq!(reply.sections[1].items(), ["a", "b"]);

        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "what?");
        assert_eq!(*session.generator().prompts.lock().unwrap(), vec!["what?"]);
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_without_a_request() {
        let mut session = ChatSession::new(ScriptedGenerator::new(vec![]));

        let err = session.submit(" \n\t ").await.unwrap_err();

        assert!(matches!(err, ChatError::EmptyPrompt));
        assert!(session.conversation().is_empty());
        assert!(session.generator().prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_generation_keeps_only_the_user_message() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerateError::MissingApiKey),
            Ok("second try".to_string()),
        ]);
        let mut session = ChatSession::new(generator);

        let err = session.submit("first").await.unwrap_err();
        assert!(matches!(err, ChatError::Generate(GenerateError::MissingApiKey)));
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation().messages()[0].role, Role::User);

        let reply = session.submit("again").await.unwrap();
        assert_eq!(reply.sections, formatter::format("second try"));
        assert_eq!(session.conversation().len(), 3);
    }
}
