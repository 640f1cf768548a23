use std::{sync::Arc, time::Duration as StdDuration};

use time::Duration;
use tokio::time as tokio_time;

use wayfare_domain::{PlanEdit, SearchStatus, TripPlan};
use wayfare_service::{
	Error, PollRequest, ReviseSearchRequest, StartSearchRequest, WayfareService,
};
use wayfare_testkit::{
	ManualClock, ScriptedBuilder, ScriptedEssentials, ScriptedPlanner, sample_plans,
	scripted_service, wait_for, wait_for_progress, wait_for_terminal,
};

struct Harness {
	service: WayfareService,
	planner: Arc<ScriptedPlanner>,
	builder: Arc<ScriptedBuilder>,
	clock: Arc<ManualClock>,
}

fn harness(planner: ScriptedPlanner, builder: ScriptedBuilder) -> Harness {
	let planner = Arc::new(planner);
	let builder = Arc::new(builder);
	let clock = ManualClock::new();
	let service = scripted_service(
		planner.clone(),
		builder.clone(),
		Arc::new(ScriptedEssentials::default()),
		clock.clone(),
	);

	Harness { service, planner, builder, clock }
}

fn three_plans() -> ScriptedPlanner {
	ScriptedPlanner::with_plans(sample_plans(&["beach", "city", "hike"]))
}

fn start(service: &WayfareService) -> String {
	service
		.start_search(StartSearchRequest { trip_yaml: "trip: {}".to_string() })
		.expect("Failed to start search.")
		.search_id
}

fn vibes(entry: &wayfare_domain::SearchEntry) -> Vec<&str> {
	entry.results.iter().map(|trip| trip.vibe.as_str()).collect()
}

#[tokio::test]
async fn all_plans_built_completes_with_every_result() {
	let h = harness(three_plans(), ScriptedBuilder::new());
	let search_id = start(&h.service);
	let entry = wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	assert_eq!(entry.status, SearchStatus::Completed);
	assert_eq!(entry.progress.total_plans, 3);
	assert_eq!(entry.progress.completed_plans, 3);
	assert_eq!(vibes(&entry), vec!["beach", "city", "hike"]);
	assert!(entry.error.is_none());
	assert!(entry.failed_plan_labels.is_empty());
	assert!(entry.progress.current_vibe.is_none());
	assert_eq!(h.planner.generate_calls(), 1);
}

#[tokio::test]
async fn failed_plan_is_counted_but_not_returned() {
	let h = harness(three_plans(), ScriptedBuilder::new().failing_on("city"));
	let search_id = start(&h.service);
	let entry = wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	assert_eq!(entry.status, SearchStatus::Completed);
	assert_eq!(entry.progress.total_plans, 3);
	assert_eq!(entry.progress.completed_plans, 3);
	assert_eq!(vibes(&entry), vec!["beach", "hike"]);
	assert_eq!(entry.failed_plan_labels, vec!["city".to_string()]);
	assert!(entry.error.is_none());
}

#[tokio::test]
async fn plan_generation_failure_is_fatal() {
	let h = harness(ScriptedPlanner::failing("planner offline"), ScriptedBuilder::new());
	let search_id = start(&h.service);
	let entry = wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	assert_eq!(entry.status, SearchStatus::Error);
	assert_eq!(entry.progress.total_plans, 0);
	assert!(entry.results.is_empty());
	assert!(entry.error.as_deref().is_some_and(|error| error.contains("planner offline")));
	assert!(h.builder.attempts().is_empty());
}

#[tokio::test]
async fn entry_is_pending_before_the_pipeline_runs() {
	let h = harness(three_plans(), ScriptedBuilder::new());
	let search_id = start(&h.service);
	let entry = h.service.get_search_entry(&search_id).expect("Entry must exist right away.");

	assert_eq!(entry.status, SearchStatus::Pending);
	assert_eq!(entry.progress.total_plans, 0);
	assert!(entry.results.is_empty());
}

#[tokio::test]
async fn expired_search_is_not_found_without_a_sweep() {
	let h = harness(three_plans(), ScriptedBuilder::new());
	let search_id = start(&h.service);

	wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");
	h.clock.advance(Duration::minutes(10));

	assert!(h.service.get_search_entry(&search_id).is_ok());

	h.clock.advance(Duration::milliseconds(1));

	assert!(matches!(h.service.get_search_entry(&search_id), Err(Error::NotFound { .. })));
	assert!(matches!(
		h.service.poll(PollRequest { search_id: Some(search_id) }),
		Err(Error::NotFound { .. })
	));
}

#[tokio::test]
async fn observed_progress_only_moves_forward() {
	let h = harness(three_plans(), ScriptedBuilder::new().failing_on("city").gated());
	let search_id = start(&h.service);
	let mut snapshots = vec![h.service.get_search_entry(&search_id).expect("entry")];

	for completed in 0..3 {
		let entry = wait_for_progress(&h.service, &search_id, completed)
			.await
			.expect("Build did not start.");

		snapshots.push(entry);
		h.builder.release(1);
	}

	let last = wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	snapshots.push(last);

	let rank = |status: SearchStatus| match status {
		SearchStatus::Pending => 0,
		SearchStatus::InProgress => 1,
		SearchStatus::Completed | SearchStatus::Error => 2,
	};

	for pair in snapshots.windows(2) {
		assert!(rank(pair[0].status) <= rank(pair[1].status));
		assert!(pair[0].progress.completed_plans <= pair[1].progress.completed_plans);
		assert!(pair[0].results.len() <= pair[1].results.len());
	}
	for entry in &snapshots {
		assert!(entry.progress.completed_plans <= entry.progress.total_plans);
		assert!(entry.results.len() <= entry.progress.completed_plans);
	}

	assert_eq!(snapshots[1].status, SearchStatus::InProgress);
	assert_eq!(snapshots[1].progress.current_vibe.as_deref(), Some("beach"));
}

#[tokio::test]
async fn repeated_reads_without_progress_are_identical() {
	let h = harness(three_plans(), ScriptedBuilder::new().gated());
	let search_id = start(&h.service);

	wait_for_progress(&h.service, &search_id, 0).await.expect("Build did not start.");

	let first = h.service.get_search_entry(&search_id).expect("entry");
	let second = h.service.get_search_entry(&search_id).expect("entry");

	assert_eq!(first, second);
	assert_eq!(
		serde_json::to_value(&first).expect("serialize"),
		serde_json::to_value(&second).expect("serialize")
	);

	h.builder.release(3);
}

#[tokio::test]
async fn completion_registers_one_id_per_result() {
	let h = harness(three_plans(), ScriptedBuilder::new().failing_on("hike"));
	let search_id = start(&h.service);
	let entry = wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");
	let trip_ids = h.service.get_trip_ids(&search_id).expect("Trip ids missing.").trip_ids;

	assert_eq!(trip_ids.len(), entry.results.len());

	for (trip_id, result) in trip_ids.iter().zip(&entry.results) {
		assert_eq!(&h.service.get_trip(trip_id).expect("Trip missing."), result);
	}

	assert!(matches!(h.service.get_trip("missing"), Err(Error::NotFound { .. })));
	assert!(matches!(h.service.get_trip_ids("search_missing"), Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn polling_registers_partial_results() {
	let h = harness(three_plans(), ScriptedBuilder::new().gated());
	let search_id = start(&h.service);

	h.builder.release(1);
	wait_for_progress(&h.service, &search_id, 1).await.expect("Second build did not start.");

	let entry = h
		.service
		.poll(PollRequest { search_id: Some(search_id.clone()) })
		.expect("Poll failed.");
	let trip_ids = h.service.get_trip_ids(&search_id).expect("Trip ids missing.").trip_ids;

	assert_eq!(entry.results.len(), 1);
	assert_eq!(trip_ids.len(), 1);

	h.builder.release(2);
	wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	let all = h.service.get_trip_ids(&search_id).expect("Trip ids missing.").trip_ids;

	assert_eq!(all.len(), 3);
	assert_eq!(all[0], trip_ids[0]);
}

#[tokio::test]
async fn poll_requires_a_search_id() {
	let h = harness(three_plans(), ScriptedBuilder::new());

	for search_id in [None, Some(String::new()), Some("  ".to_string())] {
		assert!(matches!(
			h.service.poll(PollRequest { search_id }),
			Err(Error::InvalidRequest { .. })
		));
	}

	assert!(matches!(
		h.service.start_search(StartSearchRequest { trip_yaml: " ".to_string() }),
		Err(Error::InvalidRequest { .. })
	));
}

#[tokio::test]
async fn cancellation_stops_the_job_and_drops_the_in_flight_result() {
	let h = harness(three_plans(), ScriptedBuilder::new().gated());
	let search_id = start(&h.service);

	wait_for_progress(&h.service, &search_id, 0).await.expect("Build did not start.");

	let cancelled = h.service.cancel_search(&search_id).expect("Cancel failed.");

	assert_eq!(cancelled.status, SearchStatus::Error);

	h.builder.release(3);
	tokio_time::sleep(StdDuration::from_millis(50)).await;

	let entry = h.service.get_search_entry(&search_id).expect("entry");

	assert_eq!(entry.status, SearchStatus::Error);
	assert_eq!(entry.error.as_deref(), Some("Search cancelled"));
	assert!(entry.results.is_empty());
	assert_eq!(entry.progress.completed_plans, 0);
	assert_eq!(h.builder.attempts(), vec!["beach".to_string()]);
	assert!(h.service.get_trip_ids(&search_id).is_err());
}

#[tokio::test]
async fn cancelling_a_finished_search_changes_nothing() {
	let h = harness(three_plans(), ScriptedBuilder::new());
	let search_id = start(&h.service);
	let before = wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");
	let cancelled = h.service.cancel_search(&search_id).expect("Cancel failed.");

	assert_eq!(cancelled.status, SearchStatus::Completed);
	assert_eq!(h.service.get_search_entry(&search_id).expect("entry"), before);
	assert!(matches!(h.service.cancel_search("search_missing"), Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn pipeline_panic_becomes_an_error_state() {
	let h = harness(three_plans(), ScriptedBuilder::new().panicking_on("city"));
	let search_id = start(&h.service);
	let entry = wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	assert_eq!(entry.status, SearchStatus::Error);
	assert_eq!(entry.error.as_deref(), Some("Search pipeline aborted unexpectedly"));
	assert_eq!(vibes(&entry), vec!["beach"]);
}

#[tokio::test]
async fn revision_rebuilds_only_modified_plans() {
	let mut edited = sample_plans(&["beach", "city", "hike"]);

	edited[1] = TripPlan::new("city at night", Vec::new());

	let planner =
		three_plans().with_edit(PlanEdit { plans: edited, modified_indices: vec![1, 9, 1] });
	let h = harness(planner, ScriptedBuilder::new());
	let source_id = start(&h.service);
	let source = wait_for_terminal(&h.service, &source_id).await.expect("Search did not finish.");
	let revised_id = h
		.service
		.revise_search(&source_id, ReviseSearchRequest { user_text: "More nightlife".to_string() })
		.expect("Revise failed.")
		.search_id;

	assert_ne!(revised_id, source_id);

	let revised =
		wait_for_terminal(&h.service, &revised_id).await.expect("Revision did not finish.");

	assert_eq!(revised.status, SearchStatus::Completed);
	assert_eq!(revised.progress.total_plans, 3);
	assert_eq!(revised.progress.completed_plans, 3);
	assert_eq!(vibes(&revised), vec!["beach", "hike", "city at night"]);
	assert_eq!(h.planner.edit_requests(), vec!["More nightlife".to_string()]);
	assert_eq!(h.builder.attempts().len(), 4);
	assert_eq!(h.service.get_search_entry(&source_id).expect("entry"), source);
	assert_eq!(h.service.get_trip_ids(&revised_id).expect("Trip ids missing.").trip_ids.len(), 3);
}

#[tokio::test]
async fn revision_starts_with_carried_results_counted() {
	let planner = three_plans().with_edit(PlanEdit {
		plans: sample_plans(&["beach", "city", "hike"]),
		modified_indices: vec![2],
	});
	let h = harness(planner, ScriptedBuilder::new().gated());
	let source_id = start(&h.service);

	h.builder.release(3);
	wait_for_terminal(&h.service, &source_id).await.expect("Search did not finish.");

	let revised_id = h
		.service
		.revise_search(&source_id, ReviseSearchRequest { user_text: "Longer hike".to_string() })
		.expect("Revise failed.")
		.search_id;
	let building = wait_for_progress(&h.service, &revised_id, 2)
		.await
		.expect("Revision build did not start.");

	assert_eq!(building.status, SearchStatus::InProgress);
	assert_eq!(building.progress.completed_plans, 2);
	assert_eq!(building.progress.current_vibe.as_deref(), Some("hike"));
	assert_eq!(vibes(&building), vec!["beach", "city"]);

	h.builder.release(1);

	let revised =
		wait_for_terminal(&h.service, &revised_id).await.expect("Revision did not finish.");

	assert_eq!(vibes(&revised), vec!["beach", "city", "hike"]);
}

#[tokio::test]
async fn revision_requires_a_completed_search() {
	let h = harness(three_plans(), ScriptedBuilder::new().gated());
	let search_id = start(&h.service);
	let request = || ReviseSearchRequest { user_text: "Cheaper".to_string() };

	wait_for_progress(&h.service, &search_id, 0).await.expect("Build did not start.");

	assert!(matches!(h.service.revise_search(&search_id, request()), Err(Error::Conflict { .. })));
	assert!(matches!(
		h.service.revise_search("search_missing", request()),
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		h.service.revise_search(&search_id, ReviseSearchRequest { user_text: String::new() }),
		Err(Error::InvalidRequest { .. })
	));

	h.builder.release(3);
}

#[tokio::test]
async fn failed_plan_edit_is_fatal_for_the_revision_only() {
	let h = harness(three_plans().with_edit_error("edit rejected"), ScriptedBuilder::new());
	let source_id = start(&h.service);

	wait_for_terminal(&h.service, &source_id).await.expect("Search did not finish.");

	let revised_id = h
		.service
		.revise_search(&source_id, ReviseSearchRequest { user_text: "Cheaper".to_string() })
		.expect("Revise failed.")
		.search_id;
	let revised =
		wait_for_terminal(&h.service, &revised_id).await.expect("Revision did not finish.");

	assert_eq!(revised.status, SearchStatus::Error);
	assert_eq!(revised.progress.total_plans, 0);
	assert!(revised.results.is_empty());
	assert_eq!(
		h.service.get_search_entry(&source_id).expect("entry").status,
		SearchStatus::Completed
	);
}

#[tokio::test]
async fn trips_expire_with_their_search_registration() {
	let h = harness(three_plans(), ScriptedBuilder::new());
	let search_id = start(&h.service);

	wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	let trip_ids = h.service.get_trip_ids(&search_id).expect("Trip ids missing.").trip_ids;

	h.clock.advance(Duration::minutes(5) + Duration::seconds(1));

	assert!(matches!(h.service.get_trip(&trip_ids[0]), Err(Error::NotFound { .. })));
	assert!(h.service.get_search_entry(&search_id).is_ok());
}

#[tokio::test]
async fn polling_after_registration_expiry_issues_fresh_trip_ids() {
	let h = harness(three_plans(), ScriptedBuilder::new());
	let search_id = start(&h.service);

	wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");

	let old_ids = h.service.get_trip_ids(&search_id).expect("Trip ids missing.").trip_ids;

	h.clock.advance(Duration::minutes(6));
	h.service.poll(PollRequest { search_id: Some(search_id.clone()) }).expect("Poll failed.");

	let new_ids = h.service.get_trip_ids(&search_id).expect("Trip ids missing.").trip_ids;

	assert_eq!(new_ids.len(), 3);
	assert_eq!(h.service.registry.trip_count(), 3);

	for trip_id in &old_ids {
		assert!(!new_ids.contains(trip_id));
		assert!(matches!(h.service.get_trip(trip_id), Err(Error::NotFound { .. })));
	}

	assert_eq!(h.service.get_trip(&new_ids[2]).expect("Trip missing.").vibe, "hike");
}

#[tokio::test]
async fn sweep_reclaims_records_nobody_reads() {
	let h = harness(three_plans(), ScriptedBuilder::new());
	let search_id = start(&h.service);

	wait_for_terminal(&h.service, &search_id).await.expect("Search did not finish.");
	h.service.sessions.get_or_create_session("sess", "trip: {}");

	assert_eq!(h.service.sweep_expired().total(), 0);

	h.clock.advance(Duration::hours(3));

	let report = h.service.sweep_expired();

	assert_eq!(report.searches, 1);
	assert_eq!(report.registered_searches, 1);
	assert_eq!(report.registered_trips, 3);
	assert_eq!(report.sessions, 1);
	assert!(h.service.searches.is_empty());
	assert!(h.service.registry.trip_count() == 0);
	assert!(h.service.sessions.is_empty());
}

#[tokio::test]
async fn concurrent_searches_progress_independently() {
	let h = harness(three_plans(), ScriptedBuilder::new().failing_on("beach"));
	let search_ids: Vec<_> = (0..4).map(|_| start(&h.service)).collect();
	let finished = wait_for(StdDuration::from_secs(5), || {
		let entries: Vec<_> =
			search_ids.iter().filter_map(|id| h.service.get_search_entry(id).ok()).collect();

		entries.iter().all(|entry| entry.is_terminal()).then_some(entries)
	})
	.await
	.expect("Searches did not finish.");

	assert_eq!(finished.len(), 4);

	for entry in finished {
		assert_eq!(entry.status, SearchStatus::Completed);
		assert_eq!(vibes(&entry), vec!["city", "hike"]);
	}
}
