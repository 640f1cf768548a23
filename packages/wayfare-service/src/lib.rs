pub mod chat;
pub mod search;
pub mod sweeper;
pub mod trips;

mod error;

pub use chat::{ChatRequest, ChatResponse, ChatStatus};
pub use error::{Error, Result};
pub use search::{
	CancelSearchResponse, PollRequest, ReviseSearchRequest, StartSearchRequest,
	StartSearchResponse,
};
pub use sweeper::{SweepReport, run_sweeper};
pub use trips::TripIdsResponse;

use std::{future::Future, pin::Pin, sync::Arc};

use time::Duration;

use wayfare_config::{Config, EssentialsProviderConfig, PlannerProviderConfig};
use wayfare_domain::{FillResponse, FinalTripLayout, PlanEdit, TripPlan};
use wayfare_providers::{essentials, planner, trip_builder};
use wayfare_storage::{Clock, SearchStore, SessionStore, SystemClock, TripRegistry};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait PlanProvider
where
	Self: Send + Sync,
{
	fn generate_plans<'a>(
		&'a self,
		cfg: &'a PlannerProviderConfig,
		trip_yaml: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<Vec<TripPlan>>>;

	fn edit_plans<'a>(
		&'a self,
		cfg: &'a PlannerProviderConfig,
		plans: &'a [TripPlan],
		user_text: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<PlanEdit>>;
}

/// Turns one plan into a built trip layout. Takes the whole provider section because the HTTP
/// implementation talks to both the planner and the trip builder.
pub trait TripBuilder
where
	Self: Send + Sync,
{
	fn build_trip<'a>(
		&'a self,
		cfg: &'a wayfare_config::Providers,
		plan: &'a TripPlan,
	) -> BoxFuture<'a, wayfare_providers::Result<FinalTripLayout>>;
}

pub trait EssentialsProvider
where
	Self: Send + Sync,
{
	fn update_trip_yaml<'a>(
		&'a self,
		cfg: &'a EssentialsProviderConfig,
		raw_user_message: &'a str,
		current_yaml: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<FillResponse>>;

	fn next_missing_question<'a>(
		&'a self,
		cfg: &'a EssentialsProviderConfig,
		current_yaml: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<FillResponse>>;
}

#[derive(Clone)]
pub struct Providers {
	pub planner: Arc<dyn PlanProvider>,
	pub trip_builder: Arc<dyn TripBuilder>,
	pub essentials: Arc<dyn EssentialsProvider>,
}
impl Providers {
	pub fn new(
		planner: Arc<dyn PlanProvider>,
		trip_builder: Arc<dyn TripBuilder>,
		essentials: Arc<dyn EssentialsProvider>,
	) -> Self {
		Self { planner, trip_builder, essentials }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { planner: provider.clone(), trip_builder: provider.clone(), essentials: provider }
	}
}

/// Owns the three in-memory stores and drives search jobs against the injected collaborators.
/// Cloning is cheap; clones share the same stores.
#[derive(Clone)]
pub struct WayfareService {
	pub cfg: Arc<Config>,
	pub providers: Providers,
	pub searches: SearchStore,
	pub registry: TripRegistry,
	pub sessions: SessionStore,
}
impl WayfareService {
	pub fn new(cfg: Config) -> Self {
		Self::with_providers(cfg, Providers::default())
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self::with_clock(cfg, providers, Arc::new(SystemClock))
	}

	pub fn with_clock(cfg: Config, providers: Providers, clock: Arc<dyn Clock>) -> Self {
		let lifecycle = &cfg.lifecycle;
		let searches =
			SearchStore::new(Duration::seconds(lifecycle.search_ttl_seconds), clock.clone());
		let registry =
			TripRegistry::new(Duration::seconds(lifecycle.registry_ttl_seconds), clock.clone());
		let sessions = SessionStore::new(
			Duration::seconds(lifecycle.session_ttl_seconds),
			cfg.chat.max_messages,
			clock,
		);

		Self { cfg: Arc::new(cfg), providers, searches, registry, sessions }
	}
}

struct DefaultProviders;

impl PlanProvider for DefaultProviders {
	fn generate_plans<'a>(
		&'a self,
		cfg: &'a PlannerProviderConfig,
		trip_yaml: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<Vec<TripPlan>>> {
		Box::pin(planner::generate_plans(cfg, trip_yaml))
	}

	fn edit_plans<'a>(
		&'a self,
		cfg: &'a PlannerProviderConfig,
		plans: &'a [TripPlan],
		user_text: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<PlanEdit>> {
		Box::pin(planner::edit_plans(cfg, plans, user_text))
	}
}

impl TripBuilder for DefaultProviders {
	fn build_trip<'a>(
		&'a self,
		cfg: &'a wayfare_config::Providers,
		plan: &'a TripPlan,
	) -> BoxFuture<'a, wayfare_providers::Result<FinalTripLayout>> {
		Box::pin(async move {
			let trip_request = planner::build_trip_request(&cfg.planner, plan).await?;

			trip_builder::create_trip(&cfg.trip_builder, &trip_request).await
		})
	}
}

impl EssentialsProvider for DefaultProviders {
	fn update_trip_yaml<'a>(
		&'a self,
		cfg: &'a EssentialsProviderConfig,
		raw_user_message: &'a str,
		current_yaml: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<FillResponse>> {
		Box::pin(essentials::update_trip_yaml(cfg, raw_user_message, current_yaml))
	}

	fn next_missing_question<'a>(
		&'a self,
		cfg: &'a EssentialsProviderConfig,
		current_yaml: &'a str,
	) -> BoxFuture<'a, wayfare_providers::Result<FillResponse>> {
		Box::pin(essentials::next_missing_question(cfg, current_yaml))
	}
}
