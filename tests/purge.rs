//! Purge Integration Tests
//!
//! Generates libraries in a SQLite database, then deletes one and checks
//! that nothing of it is left while other libraries stay intact.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use libseed::adapters::{LibraryApi, LibraryPurger, SqliteStore};
use libseed::config::{GenerateConfig, TierConfig};
use libseed::core::{delete_library, GenerationReport, Generator, PurgeError};
use libseed::domain::{ContainerKey, ContainerType, EntityKey, RecordSet};

fn open_store(temp_dir: &TempDir) -> SqliteStore {
    let store = SqliteStore::open(temp_dir.path().join("libseed.db")).unwrap();
    store.add_user("edx@example.com", "edx").unwrap();
    store
}

fn plan(slug: &str) -> GenerateConfig {
    GenerateConfig {
        org_name: "PurgeOrg".to_string(),
        library_slug: slug.to_string(),
        library_title: format!("Library {}", slug),
        sections: 3,
        subsections: TierConfig::new(4, 0.5),
        units: TierConfig::new(4, 0.5),
        components: TierConfig::new(6, 0.5),
        ..Default::default()
    }
}

async fn generate(store: &SqliteStore, slug: &str, seed: u64) -> GenerationReport {
    Generator::new(store, plan(slug))
        .run(&mut StdRng::seed_from_u64(seed))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_generated_library_is_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let report = generate(&store, "lib_a", 43).await;
    assert_eq!(report.library_key.to_string(), "lib:PurgeOrg:lib_a");

    let stats = store.library_stats(&report.library_key.to_string()).unwrap();
    assert_eq!(stats.learning_packages, 1);
    assert_eq!(stats.content_libraries, 1);
    assert_eq!(stats.containers, 3 + 4 + 4);
    assert_eq!(stats.components, 6);
    assert_eq!(
        stats.entity_list_rows,
        report.subsection_links + report.unit_links + report.component_links
    );
    assert!(stats.side_effects > 0);

    // Sections hold subsections only, in the order they were planned
    let section = ContainerKey::new(report.library_key.clone(), ContainerType::Section, "section-1");
    for child in store.list_children(&section).unwrap() {
        match child {
            EntityKey::Container(key) => {
                assert_eq!(key.container_type(), ContainerType::Subsection)
            }
            EntityKey::Component(key) => panic!("component {} under a section", key),
        }
    }
}

#[tokio::test]
async fn test_purge_removes_library_and_keeps_others() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let doomed = generate(&store, "lib_a", 1).await;
    let kept = generate(&store, "lib_b", 2).await;
    let kept_key = kept.library_key.to_string();
    let kept_before = store.library_stats(&kept_key).unwrap();

    let report = delete_library(&store, &doomed.library_key.to_string())
        .await
        .unwrap();

    assert_eq!(report.deleted_in(RecordSet::ContentLibrary), 1);
    assert_eq!(report.deleted_in(RecordSet::LearningPackage), 1);
    assert_eq!(
        report.deleted_in(RecordSet::EntityListRows),
        doomed.subsection_links + doomed.unit_links + doomed.component_links
    );
    assert!(report.deleted_in(RecordSet::DraftSideEffects) > 0);

    let doomed_after = store
        .library_stats(&doomed.library_key.to_string())
        .unwrap();
    assert!(doomed_after.is_empty(), "left behind: {:?}", doomed_after);

    assert_eq!(store.library_stats(&kept_key).unwrap(), kept_before);

    // The organization outlives its libraries
    assert_eq!(store.count_organizations("PurgeOrg").unwrap(), 1);
}

#[tokio::test]
async fn test_next_purge_sweeps_orphaned_lists() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let first = generate(&store, "lib_a", 1).await;
    let second = generate(&store, "lib_b", 2).await;

    delete_library(&store, &first.library_key.to_string())
        .await
        .unwrap();
    // Lists of the deleted container versions are left unreferenced
    let orphaned = store.orphaned_entity_lists().unwrap();
    assert!(orphaned > 0);

    let report = delete_library(&store, &second.library_key.to_string())
        .await
        .unwrap();
    assert!(report.deleted_in(RecordSet::OrphanedEntityLists) >= orphaned);
}

#[tokio::test]
async fn test_purge_then_regenerate_same_slug() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let first = generate(&store, "lib_a", 1).await;
    delete_library(&store, &first.library_key.to_string())
        .await
        .unwrap();

    let again = generate(&store, "lib_a", 1).await;
    assert_eq!(again.library_key, first.library_key);
    assert!(!again.organization_created);
}

#[tokio::test]
async fn test_purge_unknown_library_deletes_nothing_scoped() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    let kept = generate(&store, "lib_b", 2).await;
    let kept_key = kept.library_key.to_string();
    let before = store.library_stats(&kept_key).unwrap();

    let report = delete_library(&store, "lib:PurgeOrg:missing").await.unwrap();

    assert_eq!(report.deleted_in(RecordSet::ContentLibrary), 0);
    assert_eq!(report.deleted_in(RecordSet::LearningPackage), 0);
    assert_eq!(store.library_stats(&kept_key).unwrap(), before);
}

#[tokio::test]
async fn test_empty_key_rejected_before_deleting() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    let kept = generate(&store, "lib_b", 2).await;
    let before = store.library_stats(&kept.library_key.to_string()).unwrap();

    let result = delete_library(&store, "").await;
    assert!(matches!(result, Err(PurgeError::EmptyLibraryKey)));
    assert_eq!(
        store.library_stats(&kept.library_key.to_string()).unwrap(),
        before
    );
}

#[tokio::test]
async fn test_package_cannot_skip_the_order() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    let library = generate(&store, "lib_a", 1).await;
    let key = library.library_key.to_string();

    // Dropping the library registration alone is not enough
    store.delete_records(RecordSet::ContentLibrary, &key).await.unwrap();
    assert!(store
        .delete_records(RecordSet::LearningPackage, &key)
        .await
        .is_err());
}

#[tokio::test]
async fn test_organization_get_or_create_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let (_, created_first) = store
        .get_or_create_organization("SampleLibraryOrg", "SampleLibraryOrg")
        .await
        .unwrap();
    let (_, created_second) = store
        .get_or_create_organization("SampleLibraryOrg", "SampleLibraryOrg")
        .await
        .unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(store.count_organizations("SampleLibraryOrg").unwrap(), 1);
}
