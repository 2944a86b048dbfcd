use chrono::Utc;
use scholaris_domain::{Backup, BackupId};

use crate::test_support::TestWorld;
use crate::{BackupService, FeatureCapabilities, PageRequest};

async fn seed_backup(world: &TestWorld, label: &str) {
    world.store.state.lock().await.backups.push(Backup {
        backup_id: BackupId::new(),
        label: label.to_owned(),
        size_bytes: 4096,
        created_at: Utc::now(),
    });
}

#[tokio::test]
async fn backups_are_listed_when_the_table_exists() {
    let world = TestWorld::new();
    seed_backup(&world, "nightly").await;
    let caller = world.super_admin().await;
    let service = BackupService::new(
        world.envelope(),
        world.store.clone(),
        FeatureCapabilities { backups: true },
    );

    let outcome = service
        .list_backups(Some(&caller), PageRequest::default())
        .await;

    assert_eq!(
        outcome
            .data
            .map(|rows| rows.into_iter().map(|row| row.label).collect::<Vec<_>>()),
        Some(vec!["nightly".to_owned()])
    );
}

#[tokio::test]
async fn missing_backup_table_lists_nothing() {
    let world = TestWorld::new();
    seed_backup(&world, "nightly").await;
    let caller = world.super_admin().await;
    let service = BackupService::new(
        world.envelope(),
        world.store.clone(),
        FeatureCapabilities::default(),
    );

    let outcome = service
        .list_backups(Some(&caller), PageRequest::default())
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.data, Some(Vec::new()));
}

#[tokio::test]
async fn backups_require_a_credential() {
    let world = TestWorld::new();
    let service = BackupService::new(
        world.envelope(),
        world.store.clone(),
        FeatureCapabilities { backups: true },
    );

    let outcome = service.list_backups(None, PageRequest::default()).await;

    assert_eq!(outcome.error.as_deref(), Some("Unauthorized"));
}
