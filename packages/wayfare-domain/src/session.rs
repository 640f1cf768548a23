use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	User,
	Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
	pub role: ChatRole,
	pub content: String,
	pub created_at_ms: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTranscript {
	/// User-authored turns only.
	pub message_count: u64,
	pub messages: VecDeque<ChatMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
	pub session_id: String,
	/// The working trip-intake document. Always replaced whole.
	pub trip_yaml: String,
	pub chat: ChatTranscript,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_search_yaml: Option<String>,
	pub has_completed_search: bool,
}
impl SessionState {
	pub fn new(session_id: impl Into<String>, default_document: impl Into<String>) -> Self {
		Self {
			session_id: session_id.into(),
			trip_yaml: default_document.into(),
			chat: ChatTranscript::default(),
			last_search_yaml: None,
			has_completed_search: false,
		}
	}

	/// Appends to the transcript, dropping the oldest messages beyond `cap`.
	pub fn push_message(
		&mut self,
		role: ChatRole,
		content: impl Into<String>,
		created_at_ms: i64,
		cap: usize,
	) {
		if role == ChatRole::User {
			self.chat.message_count += 1;
		}

		self.chat.messages.push_back(ChatMessage { role, content: content.into(), created_at_ms });

		while self.chat.messages.len() > cap {
			self.chat.messages.pop_front();
		}
	}

	pub fn mark_search_completed(&mut self, search_document: impl Into<String>) {
		self.last_search_yaml = Some(search_document.into());
		self.has_completed_search = true;
	}

	pub fn reset_for_new_search(&mut self, default_document: impl Into<String>) {
		self.trip_yaml = default_document.into();
		self.has_completed_search = false;
	}
}

/// Outcome reported by the trip-description-filling collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
	Ready,
	NeedsMoreInfo,
	Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResponse {
	pub yaml: String,
	pub status: FillStatus,
	#[serde(default)]
	pub message: Option<String>,
}
