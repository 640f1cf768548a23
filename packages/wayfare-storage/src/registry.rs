use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

use time::Duration;
use uuid::Uuid;

use crate::{Clock, Expiry, TtlStore};
use wayfare_domain::Trip;

#[derive(Clone, Debug)]
struct RegisteredTrip {
	search_id: String,
	trip: Trip,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistrySweep {
	pub searches: usize,
	pub trips: usize,
}

/// Opaque per-trip ids for finished search results.
///
/// The per-search id list is the TTL anchor. Individual trips live exactly as long as the list
/// that owns them: they are dropped when it expires, whether that is noticed on read or by a
/// sweep.
#[derive(Clone)]
pub struct TripRegistry {
	index: TtlStore<String, Vec<String>>,
	trips: Arc<Mutex<HashMap<String, RegisteredTrip>>>,
}
impl TripRegistry {
	pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
		Self {
			index: TtlStore::new(ttl, Expiry::SinceCreated, clock),
			trips: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	/// Mints ids for the trips not registered yet and returns every id of the search, in result
	/// order. Calling it again with a longer result list only extends the list; the TTL anchor
	/// stays at the first registration. Once that list has expired, a call starts a fresh list
	/// and the old ids stop resolving.
	pub fn register_search_trips(&self, search_id: &str, trips: &[Trip]) -> Vec<String> {
		let (trip_ids, stale) = self.index.upsert_with(search_id.to_string(), Vec::new, |trip_ids| {
			let fresh: Vec<(String, RegisteredTrip)> = trips
				.iter()
				.skip(trip_ids.len())
				.map(|trip| {
					let trip_id = Uuid::new_v4().to_string();
					let registered =
						RegisteredTrip { search_id: search_id.to_string(), trip: trip.clone() };

					(trip_id, registered)
				})
				.collect();

			if !fresh.is_empty() {
				let mut registered = self.lock_trips();

				for (trip_id, trip) in fresh {
					trip_ids.push(trip_id.clone());
					registered.insert(trip_id, trip);
				}
			}

			trip_ids.clone()
		});

		if let Some(stale) = stale {
			self.forget(&stale.value);
		}

		trip_ids
	}

	pub fn get_trip_ids_for_search(&self, search_id: &str) -> Option<Vec<String>> {
		if let Some(expired) = self.index.take_expired(search_id) {
			self.forget(&expired.value);

			return None;
		}

		self.index.get(search_id).map(|record| record.value)
	}

	pub fn get_trip_by_id(&self, trip_id: &str) -> Option<Trip> {
		let registered = self.lock_trips().get(trip_id).cloned()?;

		if let Some(expired) = self.index.take_expired(&registered.search_id) {
			self.forget(&expired.value);

			return None;
		}

		let listed = self
			.index
			.get(&registered.search_id)
			.is_some_and(|record| record.value.iter().any(|listed_id| listed_id == trip_id));

		if !listed {
			self.lock_trips().remove(trip_id);

			return None;
		}

		Some(registered.trip)
	}

	pub fn sweep(&self) -> RegistrySweep {
		let swept = self.index.sweep();
		let mut report = RegistrySweep { searches: swept.len(), trips: 0 };

		for (_, record) in swept {
			report.trips += self.forget(&record.value);
		}

		report
	}

	/// Individually addressable trips currently held.
	pub fn trip_count(&self) -> usize {
		self.lock_trips().len()
	}

	fn forget(&self, trip_ids: &[String]) -> usize {
		let mut trips = self.lock_trips();

		trip_ids.iter().filter(|trip_id| trips.remove(trip_id.as_str()).is_some()).count()
	}

	fn lock_trips(&self) -> MutexGuard<'_, HashMap<String, RegisteredTrip>> {
		self.trips.lock().unwrap_or_else(|err| err.into_inner())
	}
}
