//! Search jobs: start, poll, revise and cancel.
//!
//! A job runs as a detached tokio task that is the only writer of its entry. Every write goes
//! through a transition on [`SearchEntry`] that refuses to leave a terminal state, so an entry
//! marked `ERROR` from outside (cancellation, or the supervisor after a panic) stops the job at
//! its next write.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, WayfareService};
use wayfare_domain::{PlanEdit, PlanSet, SearchEntry, SearchStatus, Trip, TripPlan};

const CANCELLED: &str = "Search cancelled";
const ABORTED: &str = "Search pipeline aborted unexpectedly";
const NOT_FOUND: &str = "Search not found or expired.";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSearchRequest {
	pub trip_yaml: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSearchResponse {
	pub search_id: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
	#[serde(default)]
	pub search_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviseSearchRequest {
	pub user_text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CancelSearchResponse {
	pub status: SearchStatus,
}

/// Where a job gets its plans from.
enum PlanStep {
	Generate { trip_yaml: String },
	Revise { plans: Vec<TripPlan>, results: Vec<(usize, Trip)>, user_text: String },
}

impl WayfareService {
	/// Creates a `PENDING` job and returns its id without waiting for any collaborator.
	pub fn start_search(&self, req: StartSearchRequest) -> Result<StartSearchResponse> {
		if req.trip_yaml.trim().is_empty() {
			return Err(Error::invalid_request("tripYaml is required."));
		}

		let search_id = self.launch(PlanStep::Generate { trip_yaml: req.trip_yaml });

		Ok(StartSearchResponse { search_id })
	}

	pub fn get_search_entry(&self, search_id: &str) -> Result<SearchEntry> {
		self.searches
			.get(search_id)
			.map(|record| record.value)
			.ok_or_else(|| Error::not_found(NOT_FOUND))
	}

	/// Snapshot for a polling client. Results seen here are registered for id lookup as they
	/// appear, so trip ids are available before the job finishes.
	pub fn poll(&self, req: PollRequest) -> Result<SearchEntry> {
		let search_id = req
			.search_id
			.filter(|search_id| !search_id.trim().is_empty())
			.ok_or_else(|| Error::invalid_request("searchId is required."))?;
		let entry = self.get_search_entry(&search_id)?;

		if matches!(entry.status, SearchStatus::InProgress | SearchStatus::Completed)
			&& !entry.results.is_empty()
		{
			self.registry.register_search_trips(&search_id, &entry.results);
		}

		Ok(entry)
	}

	/// Starts a new job that asks the planner to rewrite a finished job's plans and rebuilds
	/// only the plans it changed. The finished job is left untouched.
	pub fn revise_search(
		&self,
		search_id: &str,
		req: ReviseSearchRequest,
	) -> Result<StartSearchResponse> {
		if req.user_text.trim().is_empty() {
			return Err(Error::invalid_request("userText is required."));
		}

		let source = self.get_search_entry(search_id)?;

		if source.status != SearchStatus::Completed || source.plans.is_empty() {
			return Err(Error::Conflict {
				message: "Only completed searches with plans can be revised.".to_string(),
			});
		}

		let results = source.results_except(&[]);
		let search_id = self.launch(PlanStep::Revise {
			plans: source.plans,
			results,
			user_text: req.user_text,
		});

		Ok(StartSearchResponse { search_id })
	}

	/// Marks a running job `ERROR`. The job notices at its next write; a build already in flight
	/// finishes but its result is dropped. Finished jobs are left as they are.
	pub fn cancel_search(&self, search_id: &str) -> Result<CancelSearchResponse> {
		let status = self
			.searches
			.update(search_id, |entry| {
				if entry.fail(CANCELLED) {
					tracing::info!(search_id, "Search cancelled.");
				}

				entry.status
			})
			.ok_or_else(|| Error::not_found(NOT_FOUND))?;

		Ok(CancelSearchResponse { status })
	}

	fn launch(&self, step: PlanStep) -> String {
		let search_id = self.searches.create();
		let pipeline = tokio::spawn(self.clone().run_pipeline(search_id.clone(), step));
		let searches = self.searches.clone();
		let supervised_id = search_id.clone();

		tracing::info!(search_id = %search_id, "Search started.");

		tokio::spawn(async move {
			let message = match pipeline.await {
				Ok(Ok(())) => return,
				Ok(Err(err)) => {
					tracing::error!(
						search_id = %supervised_id,
						error = %err,
						"Search pipeline failed."
					);

					err.to_string()
				},
				Err(err) => {
					tracing::error!(
						search_id = %supervised_id,
						error = %err,
						"Search pipeline panicked."
					);

					ABORTED.to_string()
				},
			};

			searches.update(&supervised_id, |entry| entry.fail(message));
		});

		search_id
	}

	async fn run_pipeline(self, search_id: String, step: PlanStep) -> Result<()> {
		let plan_set = match step {
			PlanStep::Generate { trip_yaml } => {
				let plans = self
					.providers
					.planner
					.generate_plans(&self.cfg.providers.planner, &trip_yaml)
					.await?;

				PlanSet::all(plans)
			},
			PlanStep::Revise { plans, results, user_text } => {
				let edit = self
					.providers
					.planner
					.edit_plans(&self.cfg.providers.planner, &plans, &user_text)
					.await?;

				revision_plan_set(edit, results)
			},
		};
		let plans = plan_set.plans.clone();
		let to_build = plan_set.to_build.clone();

		if !self.write(&search_id, |entry| entry.record_plans(plan_set)) {
			return Ok(());
		}

		tracing::info!(
			search_id = %search_id,
			total_plans = plans.len(),
			to_build = to_build.len(),
			"Plans generated."
		);

		for index in to_build {
			let plan = &plans[index];

			if !self.write(&search_id, |entry| entry.begin_plan(&plan.label)) {
				return Ok(());
			}

			tracing::info!(search_id = %search_id, vibe = %plan.label, "Plan build started.");

			let recorded = match self
				.providers
				.trip_builder
				.build_trip(&self.cfg.providers, plan)
				.await
			{
				Ok(layout) => {
					tracing::info!(
						search_id = %search_id,
						vibe = %plan.label,
						"Plan build finished."
					);

					let trip = Trip { vibe: plan.label.clone(), layout };

					self.write(&search_id, |entry| entry.record_built(index, trip))
				},
				Err(err) => {
					tracing::warn!(
						search_id = %search_id,
						vibe = %plan.label,
						error = %err,
						"Plan build failed."
					);

					self.write(&search_id, |entry| entry.record_failed(&plan.label))
				},
			};

			if !recorded {
				return Ok(());
			}
		}

		let finished = self
			.searches
			.update(&search_id, |entry| {
				entry.complete().then(|| (entry.results.clone(), entry.failed_plan_labels.len()))
			})
			.flatten();

		if let Some((results, failed)) = finished {
			self.registry.register_search_trips(&search_id, &results);

			tracing::info!(
				search_id = %search_id,
				results = results.len(),
				failed,
				"Search completed."
			);
		}

		Ok(())
	}

	/// Applies a transition and reports whether the job should keep going.
	fn write(&self, search_id: &str, transition: impl FnOnce(&mut SearchEntry) -> bool) -> bool {
		let applied = self.searches.update(search_id, transition).unwrap_or(false);

		if !applied {
			tracing::info!(search_id, "Search stopped before finishing.");
		}

		applied
	}
}

/// Rebuild set for a revision: every in-range modified index once, in the planner's order.
/// Results of untouched plans are carried over in their source order.
fn revision_plan_set(edit: PlanEdit, results: Vec<(usize, Trip)>) -> PlanSet {
	let total = edit.plans.len();
	let mut to_build: Vec<usize> = Vec::new();

	for index in edit.modified_indices {
		if index < total && !to_build.contains(&index) {
			to_build.push(index);
		}
	}

	let carried = results
		.into_iter()
		.filter(|(index, _)| *index < total && !to_build.contains(index))
		.collect();

	PlanSet { plans: edit.plans, to_build, carried }
}
