use std::time::Duration;

use serde::Serialize;
use tokio::time as tokio_time;

use crate::WayfareService;

/// Records removed by one sweep, per store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
	pub searches: usize,
	pub registered_searches: usize,
	pub registered_trips: usize,
	pub sessions: usize,
}
impl SweepReport {
	pub fn total(&self) -> usize {
		self.searches + self.registered_searches + self.registered_trips + self.sessions
	}
}

impl WayfareService {
	/// Drops every expired record from all three stores, including keys nobody reads again.
	pub fn sweep_expired(&self) -> SweepReport {
		let registry = self.registry.sweep();

		SweepReport {
			searches: self.searches.sweep(),
			registered_searches: registry.searches,
			registered_trips: registry.trips,
			sessions: self.sessions.sweep(),
		}
	}
}

/// Sweeps on a fixed interval until the task is dropped. Runs independently of request traffic.
pub async fn run_sweeper(service: WayfareService) {
	let interval = sweep_interval(&service);

	loop {
		tokio_time::sleep(interval).await;

		let report = service.sweep_expired();

		if report.total() > 0 {
			tracing::debug!(
				searches = report.searches,
				registered_searches = report.registered_searches,
				registered_trips = report.registered_trips,
				sessions = report.sessions,
				"Swept expired records."
			);
		}
	}
}

fn sweep_interval(service: &WayfareService) -> Duration {
	let seconds = service.cfg.lifecycle.sweep_interval_seconds.max(1);

	Duration::from_secs(seconds.unsigned_abs())
}
