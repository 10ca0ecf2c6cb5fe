/// Test helper functions and service builders
use fieldcrm_lib::modules::client_imports::{
    ClientImportRepository, ClientImportRepositoryImpl, ClientImportService, ImportJob,
};
use fieldcrm_lib::modules::records::{
    ChangeFeed, IdentityProvider, MemoryRecordStore, RecordStore, StaticIdentity,
};
use fieldcrm_lib::shared::{AppConfig, SimulationConfig};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct TestServices {
    /// Unscoped handle over the same data, for assertions
    pub root_store: MemoryRecordStore,
    pub owner: Uuid,
    pub service: ClientImportService,
    pub repository: Arc<dyn ClientImportRepository>,
}

/// Simulation bounds short enough for tests
pub fn fast_config() -> AppConfig {
    AppConfig {
        simulation: SimulationConfig {
            min_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(60),
            min_records: 10,
            max_records: 100,
        },
        ..AppConfig::default()
    }
}

/// Build a signed-in service over a fresh in-memory store
pub fn build_test_services() -> TestServices {
    build_test_services_with(fast_config())
}

pub fn build_test_services_with(config: AppConfig) -> TestServices {
    let root_store = MemoryRecordStore::new();
    let owner = Uuid::new_v4();
    let service = service_for(&root_store, owner, &config);
    let repository: Arc<dyn ClientImportRepository> = Arc::new(ClientImportRepositoryImpl::new(
        Arc::new(root_store.as_owner(owner)),
    ));

    TestServices {
        root_store,
        owner,
        service,
        repository,
    }
}

/// Another signed-in user sharing the same store
pub fn service_for(root_store: &MemoryRecordStore, owner: Uuid, config: &AppConfig) -> ClientImportService {
    build_service(
        Arc::new(root_store.as_owner(owner)),
        Arc::new(StaticIdentity::signed_in(owner)),
        config,
    )
}

pub fn build_service(
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityProvider>,
    config: &AppConfig,
) -> ClientImportService {
    ClientImportService::new(store, identity, Arc::new(ChangeFeed::default()), config)
}

/// Poll until the job is terminal or the timeout passes
pub async fn wait_for_terminal(
    service: &ClientImportService,
    job_id: Uuid,
    timeout: Duration,
) -> Option<ImportJob> {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if let Ok(Some(job)) = service.get_import(job_id).await {
            if job.status.is_terminal() {
                return Some(job);
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}
