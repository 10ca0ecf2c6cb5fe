pub mod commands;
pub mod modules;
pub mod shared;

use commands::{dispatch, Cli};
use modules::client_imports::ClientImportService;
use modules::records::{
    ChangeFeed, IdentityProvider, MemoryRecordStore, PostgrestRecordStore, RecordStore,
    StaticIdentity, SupabaseIdentity,
};
use shared::utils::init_logger;
use shared::{AppConfig, AppError, AppResult, StoreBackend};
use std::sync::Arc;

/// Wire the record store, identity and import service for a configuration
pub fn build_service(config: &AppConfig) -> AppResult<ClientImportService> {
    let store: Arc<dyn RecordStore>;
    let identity: Arc<dyn IdentityProvider>;

    match config.store {
        StoreBackend::Memory => {
            let memory = MemoryRecordStore::new();
            match config.local_user_id {
                Some(user_id) => {
                    log_info!("Using in-memory store as user {}", user_id);
                    store = Arc::new(memory.as_owner(user_id));
                    identity = Arc::new(StaticIdentity::signed_in(user_id));
                }
                None => {
                    log_warn!("FIELDCRM_USER_ID is not set; imports will be rejected");
                    store = Arc::new(memory);
                    identity = Arc::new(StaticIdentity::anonymous());
                }
            }
        }
        StoreBackend::Remote => {
            let remote = config.remote.as_ref().ok_or_else(|| {
                AppError::ConfigError("Remote store selected without SUPABASE_URL".to_string())
            })?;
            log_info!("Using hosted store at {}", remote.base_url);
            store = Arc::new(PostgrestRecordStore::new(remote)?);
            identity = Arc::new(SupabaseIdentity::new(remote)?);
        }
    }

    Ok(ClientImportService::new(
        store,
        identity,
        Arc::new(ChangeFeed::default()),
        config,
    ))
}

/// Run one CLI command and return its output
pub async fn run(cli: Cli) -> Result<String, String> {
    init_logger();

    let config = AppConfig::from_env().map_err(|e| e.to_string())?;
    let service = build_service(&config).map_err(|e| e.to_string())?;

    let output = dispatch(cli.command, &service).await;

    // Pending simulated jobs are marked failed, running imports are awaited
    service.shutdown().await;
    output
}
