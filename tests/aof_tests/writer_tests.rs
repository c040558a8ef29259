//! Tests for AOF Writer
//!
//! These tests verify:
//! - Records are appended one per line, in order
//! - Existing content is preserved (append mode)
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Records containing a line feed are refused
//! - A torn final record is terminated before new appends
//! - Integration with reader

use std::fs;
use std::path::PathBuf;

use shardkv::aof::AofWriter;
use shardkv::config::AofSyncStrategy;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_aof() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let aof_path = temp_dir.path().join("AOF.txt");
    (temp_dir, aof_path)
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, aof_path) = setup_temp_aof();
    assert!(!aof_path.exists());

    let writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();

    assert!(aof_path.exists());
    assert_eq!(writer.path(), aof_path.as_path());
    assert_eq!(writer.records_written(), 0);
}

#[cfg(unix)]
#[test]
fn test_open_creates_file_with_0644() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, aof_path) = setup_temp_aof();
    AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();

    let mode = fs::metadata(&aof_path).unwrap().permissions().mode() & 0o777;
    // umask can only clear bits
    assert_eq!(mode & !0o644, 0);
    assert_eq!(mode & 0o600, 0o600);
}

#[test]
fn test_append_writes_lines() {
    let (_temp, aof_path) = setup_temp_aof();

    let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
    writer.append(b"SET a 1").unwrap();
    writer.append(b"SET b 2").unwrap();
    writer.append(b"DEL a").unwrap();

    assert_eq!(writer.records_written(), 3);
    assert_eq!(fs::read_to_string(&aof_path).unwrap(), "SET a 1\nSET b 2\nDEL a\n");
}

#[test]
fn test_reopen_appends_after_existing_records() {
    let (_temp, aof_path) = setup_temp_aof();

    {
        let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
        writer.append(b"SET a 1").unwrap();
    }
    {
        let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
        writer.append(b"SET b 2").unwrap();
    }

    assert_eq!(fs::read_to_string(&aof_path).unwrap(), "SET a 1\nSET b 2\n");
}

#[test]
fn test_append_rejects_line_feed() {
    let (_temp, aof_path) = setup_temp_aof();

    let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
    let result = writer.append(b"SET a 1\nDEL a");

    assert!(result.is_err());
    assert_eq!(writer.records_written(), 0);
    assert_eq!(fs::read(&aof_path).unwrap().len(), 0);
}

#[test]
fn test_open_in_missing_directory_fails() {
    let (temp, _) = setup_temp_aof();
    let bad_path = temp.path().join("no_such_dir").join("AOF.txt");

    assert!(AofWriter::open(&bad_path, AofSyncStrategy::EveryWrite).is_err());
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write_leaves_nothing_pending() {
    let (_temp, aof_path) = setup_temp_aof();

    let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
    for i in 0..5 {
        writer.append(format!("SET k{} v", i).as_bytes()).unwrap();
        assert_eq!(writer.unsynced(), 0);
    }
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, aof_path) = setup_temp_aof();

    let mut writer =
        AofWriter::open(&aof_path, AofSyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(b"SET a 1").unwrap();
    writer.append(b"SET b 2").unwrap();
    assert_eq!(writer.unsynced(), 2);

    writer.append(b"SET c 3").unwrap();
    assert_eq!(writer.unsynced(), 0);

    writer.append(b"SET d 4").unwrap();
    assert_eq!(writer.unsynced(), 1);

    writer.sync().unwrap();
    assert_eq!(writer.unsynced(), 0);
}

// =============================================================================
// Reader Integration
// =============================================================================

#[test]
fn test_reader_starts_at_beginning() {
    let (_temp, aof_path) = setup_temp_aof();

    let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
    writer.append(b"SET a 1").unwrap();
    writer.append(b"DEL a").unwrap();

    let records: Vec<Vec<u8>> = writer
        .reader()
        .unwrap()
        .records()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(records, vec![b"SET a 1".to_vec(), b"DEL a".to_vec()]);
}

#[test]
fn test_append_after_reading_still_goes_to_end() {
    let (_temp, aof_path) = setup_temp_aof();

    let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
    writer.append(b"SET a 1").unwrap();

    let count = writer.reader().unwrap().records().count();
    assert_eq!(count, 1);

    writer.append(b"SET b 2").unwrap();
    assert_eq!(fs::read_to_string(&aof_path).unwrap(), "SET a 1\nSET b 2\n");
}

#[test]
fn test_terminate_partial_tail_separates_next_record() {
    let (_temp_dir, aof_path) = setup_temp_aof();
    fs::write(&aof_path, "SET a 1\nSET tor").unwrap();

    let mut writer = AofWriter::open(&aof_path, AofSyncStrategy::EveryWrite).unwrap();
    writer.terminate_partial_tail().unwrap();
    writer.append(b"SET b 2").unwrap();

    assert_eq!(
        fs::read_to_string(&aof_path).unwrap(),
        "SET a 1\nSET tor\nSET b 2\n"
    );
    assert_eq!(writer.records_written(), 1);
    assert_eq!(writer.unsynced(), 0);
}
