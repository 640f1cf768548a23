use std::sync::Arc;

use wayfare_service::WayfareService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<WayfareService>,
}
impl AppState {
	pub fn new(config: wayfare_config::Config) -> Self {
		Self::from_service(WayfareService::new(config))
	}

	pub fn from_service(service: WayfareService) -> Self {
		Self { service: Arc::new(service) }
	}
}
