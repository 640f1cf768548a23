//! Test doubles for the collaborators and the clock, plus polling helpers.

use std::{
	collections::{HashSet, VecDeque},
	sync::{
		Arc, Mutex, MutexGuard,
		atomic::{AtomicI64, AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};

use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::{
	sync::Semaphore,
	time::{self as tokio_time, Instant},
};

use wayfare_config::{
	Chat, Config, EssentialsProviderConfig, Lifecycle, PlannerProviderConfig,
	TripBuilderProviderConfig,
};
use wayfare_domain::{
	FillResponse, FillStatus, FinalTripLayout, PlanEdit, SearchEntry, TripPlan, TripSection,
};
use wayfare_service::{
	BoxFuture, EssentialsProvider, PlanProvider, Providers, TripBuilder, WayfareService,
};
use wayfare_storage::Clock;

/// A clock that only moves when told to.
pub struct ManualClock {
	base: OffsetDateTime,
	offset_ms: AtomicI64,
}
impl ManualClock {
	pub fn new() -> Arc<Self> {
		Arc::new(Self { base: datetime!(2025-06-01 09:00 UTC), offset_ms: AtomicI64::new(0) })
	}

	pub fn advance(&self, by: Duration) {
		self.offset_ms.fetch_add(by.whole_milliseconds() as i64, Ordering::SeqCst);
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		self.base + Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
	}
}

/// Configuration with unreachable collaborator endpoints and the stock lifetimes.
pub fn test_config() -> Config {
	Config {
		service: wayfare_config::Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		providers: wayfare_config::Providers {
			planner: PlannerProviderConfig {
				api_base: "http://127.0.0.1:9".to_string(),
				generate_plans_path: "/api/generate-plans".to_string(),
				build_trip_request_path: "/api/build-trip-request".to_string(),
				edit_plans_path: "/api/edit-plans".to_string(),
				timeout_ms: Some(1_000),
				default_headers: Map::new(),
			},
			trip_builder: TripBuilderProviderConfig {
				api_base: "http://127.0.0.1:9".to_string(),
				create_trip_path: "/api/create_trip".to_string(),
				timeout_ms: Some(1_000),
				default_headers: Map::new(),
			},
			essentials: EssentialsProviderConfig {
				api_base: "http://127.0.0.1:9".to_string(),
				update_path: "/api/update_trip_yaml".to_string(),
				question_path: "/api/get_single_missing_question".to_string(),
				timeout_ms: Some(1_000),
				default_headers: Map::new(),
			},
		},
		lifecycle: Lifecycle {
			search_ttl_seconds: 600,
			registry_ttl_seconds: 300,
			session_ttl_seconds: 7_200,
			sweep_interval_seconds: 60,
		},
		chat: Chat { max_messages: 50 },
	}
}

pub fn sample_plans(labels: &[&str]) -> Vec<TripPlan> {
	labels
		.iter()
		.map(|label| TripPlan::new(*label, vec![vec![Value::from("stay"), Value::from(*label)]]))
		.collect()
}

/// A small layout that records which plan it was built from.
pub fn sample_layout(label: &str) -> FinalTripLayout {
	FinalTripLayout {
		sections: vec![
			TripSection::Flight(serde_json::json!({ "built_for": label, "price": 420 })),
			TripSection::Transfer(serde_json::json!({ "mode": "taxi" })),
		],
	}
}

pub fn scripted_service(
	planner: Arc<ScriptedPlanner>,
	builder: Arc<ScriptedBuilder>,
	essentials: Arc<ScriptedEssentials>,
	clock: Arc<ManualClock>,
) -> WayfareService {
	WayfareService::with_clock(
		test_config(),
		Providers::new(planner, builder, essentials),
		clock,
	)
}

#[derive(Default)]
pub struct ScriptedPlanner {
	plans: Vec<TripPlan>,
	generate_error: Option<String>,
	edit: Mutex<Option<PlanEdit>>,
	edit_error: Option<String>,
	generate_calls: AtomicUsize,
	edit_requests: Mutex<Vec<String>>,
}
impl ScriptedPlanner {
	pub fn with_plans(plans: Vec<TripPlan>) -> Self {
		Self { plans, ..Default::default() }
	}

	pub fn failing(message: &str) -> Self {
		Self { generate_error: Some(message.to_string()), ..Default::default() }
	}

	/// Answer for the next edit request.
	pub fn with_edit(self, edit: PlanEdit) -> Self {
		*lock(&self.edit) = Some(edit);

		self
	}

	pub fn with_edit_error(self, message: &str) -> Self {
		Self { edit_error: Some(message.to_string()), ..self }
	}

	pub fn generate_calls(&self) -> usize {
		self.generate_calls.load(Ordering::SeqCst)
	}

	pub fn edit_requests(&self) -> Vec<String> {
		lock(&self.edit_requests).clone()
	}
}
impl PlanProvider for ScriptedPlanner {
	fn generate_plans<'a>(
		&'a self,
		_: &'a PlannerProviderConfig,
		_: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<Vec<TripPlan>>> {
		Box::pin(async move {
			self.generate_calls.fetch_add(1, Ordering::SeqCst);

			match &self.generate_error {
				Some(message) => Err(scripted_error(message)),
				None => Ok(self.plans.clone()),
			}
		})
	}

	fn edit_plans<'a>(
		&'a self,
		_: &'a PlannerProviderConfig,
		plans: &'a [TripPlan],
		user_text: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<PlanEdit>> {
		Box::pin(async move {
			lock(&self.edit_requests).push(user_text.to_string());

			if let Some(message) = &self.edit_error {
				return Err(scripted_error(message));
			}

			Ok(lock(&self.edit).take().unwrap_or_else(|| PlanEdit {
				plans: plans.to_vec(),
				modified_indices: Vec::new(),
			}))
		})
	}
}

/// Builds [`sample_layout`] for every plan except the scripted failures.
///
/// With a gate, every build first waits for a permit, so a test can hold a job mid-flight and
/// release builds one at a time with [`ScriptedBuilder::release`].
#[derive(Default)]
pub struct ScriptedBuilder {
	failing: HashSet<String>,
	panicking: HashSet<String>,
	gate: Option<Arc<Semaphore>>,
	built: Mutex<Vec<String>>,
}
impl ScriptedBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing_on(mut self, label: &str) -> Self {
		self.failing.insert(label.to_string());

		self
	}

	pub fn panicking_on(mut self, label: &str) -> Self {
		self.panicking.insert(label.to_string());

		self
	}

	pub fn gated(self) -> Self {
		Self { gate: Some(Arc::new(Semaphore::new(0))), ..self }
	}

	pub fn release(&self, builds: usize) {
		if let Some(gate) = &self.gate {
			gate.add_permits(builds);
		}
	}

	/// Labels of every build attempt, in call order.
	pub fn attempts(&self) -> Vec<String> {
		lock(&self.built).clone()
	}
}
impl TripBuilder for ScriptedBuilder {
	fn build_trip<'a>(
		&'a self,
		_: &'a wayfare_config::Providers,
		plan: &'a TripPlan,
	) -> BoxFuture<'a, wayfare_providers::Result<FinalTripLayout>> {
		Box::pin(async move {
			lock(&self.built).push(plan.label.clone());

			if let Some(gate) = &self.gate {
				gate.acquire()
					.await
					.map_err(|_| scripted_error("Build gate closed."))?
					.forget();
			}
			if self.panicking.contains(&plan.label) {
				panic!("Scripted builder panic for {}.", plan.label);
			}
			if self.failing.contains(&plan.label) {
				return Err(scripted_error(&format!("No availability for {}.", plan.label)));
			}

			Ok(sample_layout(&plan.label))
		})
	}
}

/// One chat turn as the essentials collaborator will answer it.
#[derive(Clone, Debug)]
pub struct EssentialsTurn {
	pub update: FillResponse,
	pub question: FillResponse,
}
impl EssentialsTurn {
	pub fn needs_more_info(document: &str, question: &str) -> Self {
		Self {
			update: fill(document, FillStatus::NeedsMoreInfo, None),
			question: fill(document, FillStatus::NeedsMoreInfo, Some(question)),
		}
	}

	pub fn ready(document: &str) -> Self {
		Self {
			update: fill(document, FillStatus::NeedsMoreInfo, None),
			question: fill(document, FillStatus::Ready, None),
		}
	}

	pub fn update_error(message: &str) -> Self {
		Self {
			update: fill("", FillStatus::Error, Some(message)),
			question: fill("", FillStatus::Error, Some(message)),
		}
	}
}

#[derive(Default)]
pub struct ScriptedEssentials {
	turns: Mutex<VecDeque<EssentialsTurn>>,
	current: Mutex<Option<EssentialsTurn>>,
	updates: Mutex<Vec<(String, String)>>,
}
impl ScriptedEssentials {
	pub fn with_turns(turns: impl IntoIterator<Item = EssentialsTurn>) -> Self {
		Self { turns: Mutex::new(turns.into_iter().collect()), ..Default::default() }
	}

	/// `(raw message, document it was applied to)` for every update call.
	pub fn updates(&self) -> Vec<(String, String)> {
		lock(&self.updates).clone()
	}
}
impl EssentialsProvider for ScriptedEssentials {
	fn update_trip_yaml<'a>(
		&'a self,
		_: &'a EssentialsProviderConfig,
		raw_user_message: &'a str,
		current_yaml: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<FillResponse>> {
		Box::pin(async move {
			lock(&self.updates).push((raw_user_message.to_string(), current_yaml.to_string()));

			let next = lock(&self.turns).pop_front();
			let Some(turn) = next else {
				return Err(scripted_error("No turns left."));
			};
			let update = turn.update.clone();

			*lock(&self.current) = Some(turn);

			Ok(update)
		})
	}

	fn next_missing_question<'a>(
		&'a self,
		_: &'a EssentialsProviderConfig,
		_: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<FillResponse>> {
		Box::pin(async move {
			lock(&self.current)
				.as_ref()
				.map(|turn| turn.question.clone())
				.ok_or_else(|| scripted_error("Question asked before any update."))
		})
	}
}

/// Polls `check` until it yields a value or `timeout` passes.
pub async fn wait_for<T>(timeout: StdDuration, mut check: impl FnMut() -> Option<T>) -> Option<T> {
	let deadline = Instant::now() + timeout;

	loop {
		if let Some(value) = check() {
			return Some(value);
		}
		if Instant::now() >= deadline {
			return None;
		}

		tokio_time::sleep(StdDuration::from_millis(5)).await;
	}
}

/// Waits for a search to reach `COMPLETED` or `ERROR`.
pub async fn wait_for_terminal(service: &WayfareService, search_id: &str) -> Option<SearchEntry> {
	wait_for(StdDuration::from_secs(5), || {
		service.get_search_entry(search_id).ok().filter(SearchEntry::is_terminal)
	})
	.await
}

/// Waits until the job is building its `completed`-th plan (zero-based) or later.
pub async fn wait_for_progress(
	service: &WayfareService,
	search_id: &str,
	completed: usize,
) -> Option<SearchEntry> {
	wait_for(StdDuration::from_secs(5), || {
		service.get_search_entry(search_id).ok().filter(|entry| {
			entry.progress.completed_plans >= completed && entry.progress.current_vibe.is_some()
		})
	})
	.await
}

fn fill(document: &str, status: FillStatus, message: Option<&str>) -> FillResponse {
	FillResponse { yaml: document.to_string(), status, message: message.map(str::to_string) }
}

fn scripted_error(message: &str) -> wayfare_providers::Error {
	wayfare_providers::Error::InvalidResponse { message: message.to_string() }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}
