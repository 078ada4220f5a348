#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use llm_chat::async_trait;
use llm_chat::chat::{ChatMessage, ChatProvider, ChatResponse};
use llm_chat::error::LLMError;

#[derive(Debug)]
pub struct TextReply(pub String);

impl fmt::Display for TextReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ChatResponse for TextReply {
    fn text(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Provider that answers from a script and records what it was sent.
///
/// When the script runs out it echoes the last user message.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn echo() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(script: Vec<Result<&str, &str>>) -> Arc<Self> {
        let script = script
            .into_iter()
            .map(|step| step.map(str::to_string).map_err(str::to_string))
            .collect();
        Arc::new(Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Ok(reply)) => Ok(Box::new(TextReply(reply))),
            Some(Err(message)) => Err(LLMError::HttpError(message)),
            None => {
                let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
                Ok(Box::new(TextReply(format!("echo: {last}"))))
            }
        }
    }
}

/// A reply that carries no text, like a candidate stopped by a safety filter.
#[derive(Debug)]
pub struct NoTextReply;

impl fmt::Display for NoTextReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(no text)")
    }
}

impl ChatResponse for NoTextReply {
    fn text(&self) -> Option<String> {
        None
    }
}

/// Provider whose every reply is a [`NoTextReply`].
pub struct SilentProvider;

#[async_trait]
impl ChatProvider for SilentProvider {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        Ok(Box::new(NoTextReply))
    }
}
