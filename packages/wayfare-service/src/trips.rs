use serde::{Deserialize, Serialize};

use crate::{Error, Result, WayfareService};
use wayfare_domain::Trip;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripIdsResponse {
	pub trip_ids: Vec<String>,
}

impl WayfareService {
	pub fn get_trip_ids(&self, search_id: &str) -> Result<TripIdsResponse> {
		let trip_ids = self
			.registry
			.get_trip_ids_for_search(search_id)
			.ok_or_else(|| Error::not_found("Search not found or expired."))?;

		Ok(TripIdsResponse { trip_ids })
	}

	pub fn get_trip(&self, trip_id: &str) -> Result<Trip> {
		self.registry.get_trip_by_id(trip_id).ok_or_else(|| Error::not_found("Trip not found."))
	}
}
