/// Tests for the import service facade and its CLI handlers
///
/// Tests cover:
/// - Listing newest first, statistics per status
/// - Ownership checks on get / delete
/// - Reading uploads from disk and waiting on a job through the change feed
mod utils;

use fieldcrm_lib::modules::client_imports::commands::{
    import_file, read_upload, wait_for_import, ImportFileRequest, SubmitMode,
};
use fieldcrm_lib::modules::client_imports::{ImportStatus, ImportType};
use fieldcrm_lib::modules::records::{MemoryRecordStore, StaticIdentity};
use fieldcrm_lib::shared::AppError;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use std::time::Duration;
use utils::{factories, factories::CsvFactory, helpers};
use uuid::Uuid;

fn temp_csv(content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("fieldcrm-{}.csv", Uuid::new_v4()));
    std::fs::write(&path, content).unwrap();
    path
}

// ================================================================================================
// LISTING AND STATISTICS
// ================================================================================================

#[tokio::test]
async fn imports_are_listed_newest_first() {
    let services = helpers::build_test_services();

    for name in ["january", "february", "march"] {
        services
            .service
            .submit_import(
                factories::customers_upload("name\nAlice\n").with_import_name(name),
            )
            .await
            .unwrap();
    }

    let names: Vec<String> = services
        .service
        .list_imports()
        .await
        .unwrap()
        .into_iter()
        .map(|job| job.import_name)
        .collect();
    assert_eq!(names, vec!["march", "february", "january"]);
}

#[tokio::test]
async fn statistics_cover_every_status() {
    let services = helpers::build_test_services_with(fieldcrm_lib::shared::AppConfig {
        simulation: fieldcrm_lib::shared::SimulationConfig {
            min_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(30),
            min_records: 10,
            max_records: 10,
        },
        ..Default::default()
    });

    services
        .service
        .submit_import(factories::customers_upload("name,email\nAlice,a@x.com\n,b@x.com\n"))
        .await
        .unwrap();
    services
        .service
        .submit_simulated(factories::customers_upload("name\nAlice\n"))
        .await
        .unwrap();

    let stats = services.service.get_statistics().await.unwrap();
    assert_eq!(stats.total_count, 2);
    assert_eq!(stats.completed_count, 1);
    assert_eq!(stats.processing_count, 1);
    assert_eq!(stats.records_total, 2);
    assert_eq!(stats.records_successful, 1);
    assert_eq!(stats.records_failed, 1);

    services.service.shutdown().await;
    let stats = services.service.get_statistics().await.unwrap();
    assert_eq!(stats.failed_count, 1);
    assert_eq!(stats.processing_count, 0);
}

// ================================================================================================
// OWNERSHIP
// ================================================================================================

#[tokio::test]
async fn users_only_see_their_own_imports() {
    let root_store = MemoryRecordStore::new();
    let config = helpers::fast_config();
    let alice = helpers::service_for(&root_store, Uuid::new_v4(), &config);
    let bob = helpers::service_for(&root_store, Uuid::new_v4(), &config);

    let job = alice
        .submit_import(factories::customers_upload("name\nAlice\n"))
        .await
        .unwrap();

    assert!(bob.list_imports().await.unwrap().is_empty());
    assert!(bob.get_import(job.id).await.unwrap().is_none());
    assert_eq!(alice.list_imports().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_by_another_user_is_refused() {
    // Service-role store: every row is visible, so the service checks ownership itself
    let root_store = MemoryRecordStore::new();
    let owner = Uuid::new_v4();
    let config = helpers::fast_config();
    let owner_service = helpers::build_service(
        Arc::new(root_store.clone()),
        Arc::new(StaticIdentity::signed_in(owner)),
        &config,
    );
    let stranger = helpers::build_service(
        Arc::new(root_store.clone()),
        Arc::new(StaticIdentity::signed_in(Uuid::new_v4())),
        &config,
    );

    let job = owner_service
        .submit_import(factories::customers_upload("name\nAlice\n"))
        .await
        .unwrap();

    assert!(matches!(
        stranger.delete_import(job.id).await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(stranger.get_import(job.id).await.unwrap().is_none());
    assert_eq!(root_store.row_count("client_imports"), 1);

    owner_service.delete_import(job.id).await.unwrap();
    assert_eq!(root_store.row_count("client_imports"), 0);
    assert!(matches!(
        owner_service.delete_import(job.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_summary_keeps_imported_rows() {
    let services = helpers::build_test_services();
    let job = services
        .service
        .submit_import(factories::customers_upload(CsvFactory::new().clients(3).build()))
        .await
        .unwrap();

    assert_ok!(services.service.delete_import(job.id).await);

    assert_eq!(services.root_store.row_count("customers"), 3);
}

// ================================================================================================
// CLI HANDLERS
// ================================================================================================

#[tokio::test]
async fn upload_is_read_from_disk() {
    let path = temp_csv("name,phone\nAlice,555\n");

    let upload = read_upload(&path, ImportType::Leads, None).await.unwrap();

    assert!(upload.file_name.ends_with(".csv"));
    assert_eq!(upload.content, "name,phone\nAlice,555\n");
    assert_eq!(upload.import_type, ImportType::Leads);
    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn missing_file_is_reported() {
    let services = helpers::build_test_services();
    let result = import_file(
        ImportFileRequest {
            path: std::env::temp_dir().join("fieldcrm-does-not-exist.csv"),
            import_type: ImportType::Customers,
            import_name: None,
            mode: SubmitMode::Immediate,
        },
        &services.service,
    )
    .await;

    let message = assert_err!(result);
    assert!(message.contains("Failed to read"));
}

#[tokio::test]
async fn background_file_import_can_be_awaited() {
    let services = helpers::build_test_services();
    let path = temp_csv(&CsvFactory::new().clients(5).build());

    let job = import_file(
        ImportFileRequest {
            path: path.clone(),
            import_type: ImportType::Projects,
            import_name: Some("Q3 projects".to_string()),
            mode: SubmitMode::Background,
        },
        &services.service,
    )
    .await
    .unwrap();

    let finished = wait_for_import(job.id, Duration::from_secs(5), &services.service)
        .await
        .unwrap();

    assert_eq!(finished.status, ImportStatus::Completed);
    assert_eq!(finished.import_name, "Q3 projects");
    assert_eq!(finished.successful_imports, 5);
    assert_eq!(services.root_store.row_count("projects"), 5);
    std::fs::remove_file(path).ok();
}
