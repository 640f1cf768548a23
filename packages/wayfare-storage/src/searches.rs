use std::sync::Arc;

use time::Duration;
use uuid::Uuid;

use crate::{Clock, Expiry, Record, TtlStore};
use wayfare_domain::SearchEntry;

/// Search jobs keyed by search id. Age is measured from creation, so a job that keeps making
/// progress still disappears once the window closes.
#[derive(Clone)]
pub struct SearchStore {
	entries: TtlStore<String, SearchEntry>,
}
impl SearchStore {
	pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
		Self { entries: TtlStore::new(ttl, Expiry::SinceCreated, clock) }
	}

	/// Stores a fresh `PENDING` entry under a newly minted id and returns the id.
	pub fn create(&self) -> String {
		let search_id = format!("search_{}", Uuid::new_v4().simple());

		self.entries.set(search_id.clone(), SearchEntry::pending(search_id.clone()));

		search_id
	}

	pub fn get(&self, search_id: &str) -> Option<Record<SearchEntry>> {
		self.entries.get(search_id)
	}

	pub fn update<R>(&self, search_id: &str, f: impl FnOnce(&mut SearchEntry) -> R) -> Option<R> {
		self.entries.update(search_id, f)
	}

	pub fn sweep(&self) -> usize {
		self.entries.sweep().len()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
