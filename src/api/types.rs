use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::ChatMessage;

/// A session and its transcript so far
#[derive(Debug, Deserialize, Serialize)]
pub struct SessionView {
    /// Session identifier used in every later request
    pub id: Uuid,
    /// Transcript entries in conversation order
    pub messages: Vec<ChatMessage>,
}

/// Request payload for sending one user message
#[derive(Debug, Deserialize, Serialize)]
pub struct MessageRequest {
    /// Text typed by the user
    pub content: String,
}

/// Response payload for a successful turn
#[derive(Debug, Deserialize, Serialize)]
pub struct MessageResponse {
    /// The assistant's reply
    pub reply: String,
    /// Transcript entries after the turn
    pub messages: Vec<ChatMessage>,
}

/// Response payload once a session has been ended and saved
#[derive(Debug, Deserialize, Serialize)]
pub struct EndResponse {
    /// Path of the transcript file that was written
    pub saved_to: String,
}
