//! One chat turn: refine the session's trip-intake document and start a search once it is
//! complete.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, StartSearchRequest, WayfareService};
use wayfare_domain::{ChatRole, DEFAULT_TRIP_YAML, FillResponse, FillStatus, SessionState};

const READY_REPLY: &str = "Great! I have all the information I need. Generating your trip...";
const DUPLICATE_REPLY: &str = concat!(
	"It looks like you're searching for the same trip again. ",
	"Try changing some details like dates, destination, or number of travelers."
);
const FALLBACK_QUESTION: &str = "Could you tell me a bit more about the trip you have in mind?";
const FALLBACK_ERROR: &str = "Sorry, I could not process that. Could you rephrase it?";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub session_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatStatus {
	Complete,
	Incomplete,
	DuplicateSearch,
	Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
	pub message: String,
	pub status: ChatStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub search_id: Option<String>,
}

impl WayfareService {
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let message = required(req.message, "message is required.")?;
		let session_id = required(req.session_id, "sessionId is required.")?;
		let session = self.sessions.get_or_create_session(&session_id, DEFAULT_TRIP_YAML);
		let cfg = &self.cfg.providers.essentials;

		self.sessions.append_chat_message(&session_id, DEFAULT_TRIP_YAML, ChatRole::User, &message);

		let updated =
			self.providers.essentials.update_trip_yaml(cfg, &message, &session.trip_yaml).await?;

		if updated.status == FillStatus::Error {
			return Ok(self.error_reply(&session_id, &updated));
		}

		self.sessions.set_trip_yaml(&session_id, DEFAULT_TRIP_YAML, updated.yaml.clone());

		let question = self.providers.essentials.next_missing_question(cfg, &updated.yaml).await?;

		match question.status {
			FillStatus::Error => Ok(self.error_reply(&session_id, &question)),
			FillStatus::NeedsMoreInfo => {
				let reply = question
					.message
					.filter(|text| !text.trim().is_empty())
					.unwrap_or_else(|| FALLBACK_QUESTION.to_string());

				Ok(self.reply(&session_id, reply, ChatStatus::Incomplete, None))
			},
			FillStatus::Ready => self.ready_reply(&session_id, &session, updated.yaml),
		}
	}

	pub fn get_session(&self, session_id: &str) -> Result<SessionState> {
		self.sessions
			.get(session_id)
			.map(|record| record.value)
			.ok_or_else(|| Error::not_found("Session not found or expired."))
	}

	/// Puts the session back on the default document so the next turns plan a new trip. The last
	/// searched document is kept for duplicate detection.
	pub fn reset_session(&self, session_id: &str) -> Result<()> {
		if session_id.trim().is_empty() {
			return Err(Error::invalid_request("sessionId is required."));
		}

		self.sessions.reset_session_for_new_search(session_id, DEFAULT_TRIP_YAML);

		Ok(())
	}

	fn ready_reply(
		&self,
		session_id: &str,
		session: &SessionState,
		document: String,
	) -> Result<ChatResponse> {
		let duplicate = session
			.last_search_yaml
			.as_deref()
			.is_some_and(|last| wayfare_domain::is_same_search(&document, last));

		if duplicate {
			tracing::info!(session_id, "Duplicate search request ignored.");

			return Ok(self.reply(
				session_id,
				DUPLICATE_REPLY.to_string(),
				ChatStatus::DuplicateSearch,
				None,
			));
		}

		let started = self.start_search(StartSearchRequest { trip_yaml: document.clone() })?;

		self.sessions.mark_search_completed(session_id, DEFAULT_TRIP_YAML, &document);

		Ok(self.reply(
			session_id,
			READY_REPLY.to_string(),
			ChatStatus::Complete,
			Some(started.search_id),
		))
	}

	fn error_reply(&self, session_id: &str, fill: &FillResponse) -> ChatResponse {
		let reply = fill
			.message
			.clone()
			.filter(|text| !text.trim().is_empty())
			.unwrap_or_else(|| FALLBACK_ERROR.to_string());

		tracing::warn!(session_id, "Essentials collaborator reported an error.");

		self.reply(session_id, reply, ChatStatus::Error, None)
	}

	fn reply(
		&self,
		session_id: &str,
		message: String,
		status: ChatStatus,
		search_id: Option<String>,
	) -> ChatResponse {
		self.sessions.append_chat_message(
			session_id,
			DEFAULT_TRIP_YAML,
			ChatRole::Assistant,
			&message,
		);

		ChatResponse { message, status, search_id }
	}
}

fn required(value: Option<String>, message: &str) -> Result<String> {
	value.filter(|value| !value.trim().is_empty()).ok_or_else(|| Error::invalid_request(message))
}
