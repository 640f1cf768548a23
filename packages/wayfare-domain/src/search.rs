use serde::{Deserialize, Serialize};

use crate::{Trip, TripPlan};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchStatus {
	Pending,
	InProgress,
	Completed,
	Error,
}
impl SearchStatus {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Error)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProgress {
	pub total_plans: usize,
	pub completed_plans: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub current_vibe: Option<String>,
}

/// The plans a job will work through, as decided by its plan step.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanSet {
	pub plans: Vec<TripPlan>,
	/// Indices into `plans` still to be built, in build order.
	pub to_build: Vec<usize>,
	/// Trips carried over from an earlier job, tagged with their plan index.
	pub carried: Vec<(usize, Trip)>,
}
impl PlanSet {
	pub fn all(plans: Vec<TripPlan>) -> Self {
		let to_build = (0..plans.len()).collect();

		Self { plans, to_build, carried: Vec::new() }
	}
}

/// State of one search job.
///
/// Every transition method returns `false` and leaves the entry untouched when the job already
/// reached a state the transition may not leave, so a pipeline can detect cancellation by the
/// return value alone.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
	pub search_id: String,
	pub status: SearchStatus,
	pub results: Vec<Trip>,
	pub progress: SearchProgress,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	pub failed_plan_labels: Vec<String>,
	#[serde(skip)]
	pub plans: Vec<TripPlan>,
	#[serde(skip)]
	result_plan_indices: Vec<usize>,
}
impl SearchEntry {
	pub fn pending(search_id: impl Into<String>) -> Self {
		Self {
			search_id: search_id.into(),
			status: SearchStatus::Pending,
			results: Vec::new(),
			progress: SearchProgress::default(),
			error: None,
			failed_plan_labels: Vec::new(),
			plans: Vec::new(),
			result_plan_indices: Vec::new(),
		}
	}

	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}

	/// Results whose plan index is not in `exclude`, in their current order.
	pub fn results_except(&self, exclude: &[usize]) -> Vec<(usize, Trip)> {
		self.result_plan_indices
			.iter()
			.zip(&self.results)
			.filter(|(index, _)| !exclude.contains(index))
			.map(|(index, trip)| (*index, trip.clone()))
			.collect()
	}

	pub fn record_plans(&mut self, plan_set: PlanSet) -> bool {
		if self.is_terminal() {
			return false;
		}

		let total = plan_set.plans.len();
		let already_done = total.saturating_sub(plan_set.to_build.len());

		self.status = SearchStatus::InProgress;
		self.progress.total_plans = total;
		self.progress.completed_plans = already_done;
		self.progress.current_vibe = None;

		for (index, trip) in plan_set.carried.into_iter().take(already_done) {
			self.result_plan_indices.push(index);
			self.results.push(trip);
		}

		self.plans = plan_set.plans;

		true
	}

	pub fn begin_plan(&mut self, label: &str) -> bool {
		if self.is_terminal() {
			return false;
		}

		self.progress.current_vibe = Some(label.to_string());

		true
	}

	pub fn record_built(&mut self, plan_index: usize, trip: Trip) -> bool {
		if self.is_terminal() {
			return false;
		}

		self.result_plan_indices.push(plan_index);
		self.results.push(trip);
		self.advance();

		true
	}

	pub fn record_failed(&mut self, label: &str) -> bool {
		if self.is_terminal() {
			return false;
		}

		self.failed_plan_labels.push(label.to_string());
		self.advance();

		true
	}

	pub fn fail(&mut self, message: impl Into<String>) -> bool {
		if self.is_terminal() {
			return false;
		}

		self.status = SearchStatus::Error;
		self.error = Some(message.into());
		self.progress.current_vibe = None;

		true
	}

	pub fn complete(&mut self) -> bool {
		if self.is_terminal() {
			return false;
		}

		self.status = SearchStatus::Completed;
		self.progress.current_vibe = None;

		true
	}

	fn advance(&mut self) {
		self.progress.completed_plans =
			(self.progress.completed_plans + 1).min(self.progress.total_plans);
		self.progress.current_vibe = None;
	}
}
