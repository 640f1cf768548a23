use std::sync::Arc;

use time::Duration;

use crate::{Clock, Expiry, Record, TtlStore, clock};
use wayfare_domain::{ChatRole, SessionState};

/// Chat sessions keyed by session id. Every operation counts as activity and pushes expiry
/// out; a session expires `ttl` after its last use.
///
/// Operations that take a `default_document` create the session from it when it does not exist
/// yet, so callers never have to order "create" before "write".
#[derive(Clone)]
pub struct SessionStore {
	sessions: TtlStore<String, SessionState>,
	max_messages: usize,
}
impl SessionStore {
	pub fn new(ttl: Duration, max_messages: usize, clock: Arc<dyn Clock>) -> Self {
		Self { sessions: TtlStore::new(ttl, Expiry::SinceUpdated, clock), max_messages }
	}

	pub fn get(&self, session_id: &str) -> Option<Record<SessionState>> {
		self.sessions.get(session_id)
	}

	pub fn get_or_create_session(&self, session_id: &str, default_document: &str) -> SessionState {
		self.with_session(session_id, default_document, |session| session.clone())
	}

	pub fn append_chat_message(
		&self,
		session_id: &str,
		default_document: &str,
		role: ChatRole,
		content: &str,
	) -> SessionState {
		let at_ms = clock::unix_ms(self.sessions.now());
		let cap = self.max_messages;

		self.with_session(session_id, default_document, |session| {
			session.push_message(role, content, at_ms, cap);

			session.clone()
		})
	}

	pub fn set_trip_yaml(
		&self,
		session_id: &str,
		default_document: &str,
		document: String,
	) -> SessionState {
		self.with_session(session_id, default_document, |session| {
			session.trip_yaml = document;

			session.clone()
		})
	}

	pub fn mark_search_completed(
		&self,
		session_id: &str,
		default_document: &str,
		search_document: &str,
	) {
		self.with_session(session_id, default_document, |session| {
			session.mark_search_completed(search_document)
		});
	}

	pub fn reset_session_for_new_search(&self, session_id: &str, default_document: &str) {
		self.with_session(session_id, default_document, |session| {
			session.reset_for_new_search(default_document)
		});
	}

	pub fn sweep(&self) -> usize {
		self.sessions.sweep().len()
	}

	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}

	fn with_session<R>(
		&self,
		session_id: &str,
		default_document: &str,
		f: impl FnOnce(&mut SessionState) -> R,
	) -> R {
		let (session, _) = self.sessions.upsert_with(
			session_id.to_string(),
			|| SessionState::new(session_id, default_document),
			f,
		);

		session
	}
}
