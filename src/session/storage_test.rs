use super::*;

/// Accepts writes but never keeps them, like storage that silently drops data.
struct BlackHole;

impl StorageBackend for BlackHole {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

struct Disabled;

impl StorageBackend for Disabled {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_set_get_remove() {
    let mem = MemoryStorage::new();
    assert_eq!(mem.get_item("role").unwrap(), None);
    mem.set_item("role", "staff").unwrap();
    assert_eq!(mem.get_item("role").unwrap().as_deref(), Some("staff"));
    mem.remove_item("role").unwrap();
    assert_eq!(mem.get_item("role").unwrap(), None);
    mem.remove_item("role").unwrap();
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_storage_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let files = FileStorage::new(dir.path().join("session"));
    assert_eq!(files.get_item("access_token").unwrap(), None);

    files.set_item("access_token", "tok").unwrap();
    assert_eq!(files.get_item("access_token").unwrap().as_deref(), Some("tok"));
    assert!(dir.path().join("session").join("access_token").exists());

    files.set_item("access_token", "tok2").unwrap();
    assert_eq!(files.get_item("access_token").unwrap().as_deref(), Some("tok2"));

    files.remove_item("access_token").unwrap();
    assert_eq!(files.get_item("access_token").unwrap(), None);
    files.remove_item("access_token").unwrap();
}

#[test]
fn file_storage_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let files = FileStorage::new(dir.path());
    assert!(matches!(files.set_item("../escape", "x"), Err(StorageError::Unavailable(_))));
    assert!(matches!(files.get_item(""), Err(StorageError::Unavailable(_))));
}

#[test]
fn file_storage_fails_when_dir_is_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let files = FileStorage::new(&blocker);
    assert!(files.set_item("user", "{}").is_err());
}

// =============================================================================
// probe
// =============================================================================

#[test]
fn probe_passes_for_working_backends() {
    let dir = tempfile::tempdir().unwrap();
    assert!(probe(&MemoryStorage::new()).is_ok());
    assert!(probe(&FileStorage::new(dir.path())).is_ok());
}

#[test]
fn probe_leaves_no_probe_key_behind() {
    let mem = MemoryStorage::new();
    probe(&mem).unwrap();
    assert_eq!(mem.get_item(PROBE_KEY).unwrap(), None);
}

#[test]
fn probe_detects_dropped_writes() {
    assert!(matches!(probe(&BlackHole), Err(StorageError::Mismatch { .. })));
}

#[test]
fn probe_detects_disabled_storage() {
    assert!(matches!(probe(&Disabled), Err(StorageError::Unavailable(_))));
}

#[test]
fn verify_write_reports_mismatch() {
    let mem = MemoryStorage::new();
    mem.set_item("role", "staff").unwrap();
    assert!(verify_write(&mem, "role", "staff").is_ok());
    assert!(matches!(verify_write(&mem, "role", "admin"), Err(StorageError::Mismatch { key }) if key == "role"));
}
