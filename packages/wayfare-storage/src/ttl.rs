use std::{
	borrow::Borrow,
	collections::HashMap,
	hash::Hash,
	sync::{Arc, Mutex, MutexGuard},
};

use time::{Duration, OffsetDateTime};

use crate::Clock;

/// Which timestamp a record's age is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
	SinceCreated,
	/// Sliding window: every write pushes expiry out again.
	SinceUpdated,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record<V> {
	pub value: V,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// In-memory key/record map whose records stop existing once they outlive `ttl`.
///
/// Expiry is enforced twice: every read checks the record it touches and drops it when stale,
/// and [`TtlStore::sweep`] drops every stale record for keys nobody reads again. Clones share
/// the same map.
pub struct TtlStore<K, V> {
	records: Arc<Mutex<HashMap<K, Record<V>>>>,
	ttl: Duration,
	expiry: Expiry,
	clock: Arc<dyn Clock>,
}
impl<K, V> Clone for TtlStore<K, V> {
	fn clone(&self) -> Self {
		Self {
			records: Arc::clone(&self.records),
			ttl: self.ttl,
			expiry: self.expiry,
			clock: Arc::clone(&self.clock),
		}
	}
}
impl<K, V> TtlStore<K, V>
where
	K: Eq + Hash + Clone,
	V: Clone,
{
	pub fn new(ttl: Duration, expiry: Expiry, clock: Arc<dyn Clock>) -> Self {
		Self { records: Arc::new(Mutex::new(HashMap::new())), ttl, expiry, clock }
	}

	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	pub fn get<Q>(&self, key: &Q) -> Option<Record<V>>
	where
		K: Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		let now = self.now();
		let mut records = self.lock();

		if self.evict_if_expired(&mut records, key, now).is_some() {
			return None;
		}

		records.get(key).cloned()
	}

	/// Inserts or replaces the value. A live record keeps its `created_at`.
	pub fn set(&self, key: K, value: V) {
		let now = self.now();
		let mut records = self.lock();

		self.evict_if_expired(&mut records, &key, now);

		match records.get_mut(&key) {
			Some(record) => {
				record.value = value;
				record.updated_at = now;
			},
			None => {
				records.insert(key, Record { value, created_at: now, updated_at: now });
			},
		}
	}

	/// Runs `f` on the live value under the store lock, so no other writer can interleave
	/// between reading the current value and writing the next one.
	pub fn update<Q, R>(&self, key: &Q, f: impl FnOnce(&mut V) -> R) -> Option<R>
	where
		K: Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		let now = self.now();
		let mut records = self.lock();

		if self.evict_if_expired(&mut records, key, now).is_some() {
			return None;
		}

		let record = records.get_mut(key)?;
		let out = f(&mut record.value);

		record.updated_at = now;

		Some(out)
	}

	/// Like [`TtlStore::update`], creating the record from `default` first when it is missing or
	/// stale. A stale record replaced this way is handed back next to `f`'s output.
	pub fn upsert_with<R>(
		&self,
		key: K,
		default: impl FnOnce() -> V,
		f: impl FnOnce(&mut V) -> R,
	) -> (R, Option<Record<V>>) {
		let now = self.now();
		let mut records = self.lock();
		let stale = self.evict_if_expired(&mut records, &key, now);
		let record = records.entry(key).or_insert_with(|| Record {
			value: default(),
			created_at: now,
			updated_at: now,
		});
		let out = f(&mut record.value);

		record.updated_at = now;

		(out, stale)
	}

	/// Removes and returns the record only if it is stale, leaving live records alone.
	pub fn take_expired<Q>(&self, key: &Q) -> Option<Record<V>>
	where
		K: Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		let now = self.now();
		let mut records = self.lock();

		self.evict_if_expired(&mut records, key, now)
	}

	/// Drops every stale record and hands them back so callers can cascade.
	pub fn sweep(&self) -> Vec<(K, Record<V>)> {
		let now = self.now();
		let mut records = self.lock();
		let stale: Vec<K> = records
			.iter()
			.filter(|(_, record)| self.is_expired(record, now))
			.map(|(key, _)| key.clone())
			.collect();

		stale
			.into_iter()
			.filter_map(|key| records.remove(&key).map(|record| (key, record)))
			.collect()
	}

	/// Counts stored records, including stale ones not yet swept.
	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn is_expired(&self, record: &Record<V>, now: OffsetDateTime) -> bool {
		let anchor = match self.expiry {
			Expiry::SinceCreated => record.created_at,
			Expiry::SinceUpdated => record.updated_at,
		};

		now - anchor > self.ttl
	}

	fn evict_if_expired<Q>(
		&self,
		records: &mut HashMap<K, Record<V>>,
		key: &Q,
		now: OffsetDateTime,
	) -> Option<Record<V>>
	where
		K: Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		let stale = records.get(key).is_some_and(|record| self.is_expired(record, now));

		if stale { records.remove(key) } else { None }
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<K, Record<V>>> {
		// Critical sections never leave the map half-written, so a poisoned lock is still usable.
		self.records.lock().unwrap_or_else(|err| err.into_inner())
	}
}
