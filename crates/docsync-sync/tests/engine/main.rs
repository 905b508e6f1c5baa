//! Engine tests for the tree walker, driven through in-memory ports


use std::sync::atomic::Ordering;
use std::time::Duration;

use docsync_core::domain::{ExtensionFilter, SyncRecord, SyncStatus};
use docsync_sync::{SyncError, WalkerOptions};

use fakes::{file_id, folder_id, ts, Harness, Reply};

const YESTERDAY: &str = "2026-10-13T15:00:00-04:00";
const LAST_WEEK: &str = "2026-10-07T15:00:00-04:00";

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn uppercase_pdf_in_recent_folder_is_uploaded() {
    let h = Harness::new();
    h.source.add_folder("root", "F", "Reports", YESTERDAY);
    h.source.add_file("F", "a", "a.PDF", Some(YESTERDAY));

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.source.downloads(), vec!["a"]);
    assert_eq!(h.index.uploads(), vec!["a.pdf"]);
    assert_eq!(
        *h.index.tags.lock().unwrap(),
        vec![("vs-a.pdf".to_string(), "a".to_string())]
    );

    let row = h.store.row("a").expect("record flushed");
    assert_eq!(row.file_name, "a.pdf");
    assert_eq!(row.status, SyncStatus::Uploaded);
    assert_eq!(row.run_timestamp, walker.clock().timestamp());

    assert_eq!(summary.total_processed, 1);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.records_flushed, 1);
    assert!(walker.pending_records().is_empty());
}

#[tokio::test]
async fn unsupported_extension_is_recorded_as_skipping() {
    let h = Harness::new();
    h.source.add_file("root", "b", "b.xyz", Some(YESTERDAY));

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert!(h.source.downloads().is_empty());
    assert!(h.index.uploads().is_empty());
    assert!(h.store.lookups.lock().unwrap().is_empty());
    let row = h.store.row("b").unwrap();
    assert_eq!(row.status, SyncStatus::Skipping);
    assert_eq!(row.status.to_string(), "skipping");
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.total_processed, 0);
}

#[tokio::test]
async fn rejected_upload_is_deleted_and_not_retried() {
    let h = Harness::new();
    h.source.add_file("root", "c", "c.pdf", None);
    h.index.script("c.pdf", vec![Reply::Reject("invalid_file")]);

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.index.uploads(), vec!["c.pdf"]);
    assert_eq!(*h.index.deletes.lock().unwrap(), vec!["vs-c.pdf".to_string()]);
    assert!(h.index.tags.lock().unwrap().is_empty());
    assert!(h.sleeper.waits().is_empty());
    assert_eq!(
        h.store.row("c").unwrap().status.to_string(),
        "failed: invalid_file"
    );
    assert_eq!(summary.invalid, 1);
    assert_eq!(summary.successful, 0);
}

#[tokio::test]
async fn transient_failures_back_off_then_succeed() {
    let h = Harness::new();
    h.source.add_file("root", "d", "d.pdf", None);
    h.index.script(
        "d.pdf",
        vec![
            Reply::Transport("connection reset by peer"),
            Reply::Transport("operation timed out"),
        ],
    );

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(
        h.sleeper.waits(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(h.index.uploads().len(), 3);
    assert_eq!(h.store.row("d").unwrap().status, SyncStatus::Uploaded);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.total_processed, 1);
}

#[tokio::test]
async fn exhausted_retries_record_unknown_failure_and_continue() {
    let h = Harness::new();
    h.source.add_file("root", "e", "e.pdf", None);
    h.source.add_file("root", "f", "f.pdf", None);
    h.index.script(
        "e.pdf",
        vec![
            Reply::Transport("502 Bad Gateway"),
            Reply::Transport("502 Bad Gateway"),
            Reply::Transport("502 Bad Gateway"),
        ],
    );

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.store.row("e").unwrap().status.to_string(), "failed: unknown");
    assert_eq!(h.store.row("f").unwrap().status, SyncStatus::Uploaded);
    assert_eq!(summary.total_processed, 2);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.invalid, 1);
}

// ============================================================================
// Folder pruning
// ============================================================================

#[tokio::test]
async fn folders_before_cutoff_are_pruned() {
    let h = Harness::new();
    h.source.add_folder("root", "old", "Archive", LAST_WEEK);
    h.source.add_folder("old", "nested", "Nested", YESTERDAY);
    h.source.add_file("old", "x", "x.pdf", Some(YESTERDAY));
    h.source.add_file("nested", "y", "y.pdf", Some(YESTERDAY));

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.source.listed_folders(), vec!["root"]);
    assert!(h.source.downloads().is_empty());
    assert!(h.index.uploads().is_empty());
    assert!(h.store.row("x").is_none());
    assert_eq!(summary.pruned_folders, 1);
}

#[tokio::test]
async fn folder_modified_on_cutoff_date_is_visited() {
    let h = Harness::new();
    // Cutoff is 2026-10-11 in New York
    h.source
        .add_folder("root", "edge", "Edge", "2026-10-11T00:05:00-04:00");
    h.source
        .add_folder("root", "utc", "Utc", "2026-10-11T03:00:00+00:00");
    h.source.add_file("edge", "x", "x.pdf", None);
    h.source.add_file("utc", "y", "y.pdf", None);

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    // 03:00 UTC on the 11th is still the 10th in New York
    assert_eq!(h.source.listed_folders(), vec!["root", "edge"]);
    assert_eq!(h.index.uploads(), vec!["x.pdf"]);
    assert_eq!(summary.pruned_folders, 1);
}

#[tokio::test]
async fn full_load_visits_old_folders() {
    let h = Harness::new();
    h.source.add_folder("root", "old", "Archive", LAST_WEEK);
    h.source.add_file("old", "x", "x.pdf", Some(LAST_WEEK));

    let mut walker = h.full_load();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.source.listed_folders(), vec!["root", "old"]);
    assert_eq!(h.index.uploads(), vec!["x.pdf"]);
    assert_eq!(summary.pruned_folders, 0);
}

// ============================================================================
// Change detection
// ============================================================================

fn seed_uploaded(h: &Harness, id: &str, name: &str, run_timestamp: &str) {
    h.store.seed(SyncRecord::new(
        file_id(id),
        name,
        ts(run_timestamp),
        SyncStatus::Uploaded,
    ));
}

#[tokio::test]
async fn unchanged_files_are_not_uploaded_or_rerecorded() {
    let h = Harness::new();
    h.source
        .add_file("root", "a", "a.pdf", Some("2026-10-12T10:00:00-04:00"));
    seed_uploaded(&h, "a", "a.pdf", "2026-10-13T09:00:00-04:00");

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert!(h.index.uploads().is_empty());
    assert!(h.source.downloads().is_empty());
    assert!(h.store.batches.lock().unwrap().is_empty());
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.records_flushed, 0);
}

#[tokio::test]
async fn file_modified_exactly_at_last_run_is_current() {
    let h = Harness::new();
    h.source
        .add_file("root", "a", "a.pdf", Some("2026-10-13T09:00:00-04:00"));
    seed_uploaded(&h, "a", "a.pdf", "2026-10-13T09:00:00-04:00");

    let mut walker = h.incremental();
    walker.sync(&folder_id("root")).await.unwrap();

    assert!(h.index.uploads().is_empty());
}

#[tokio::test]
async fn changed_files_are_uploaded_again() {
    let h = Harness::new();
    h.source
        .add_file("root", "a", "a.pdf", Some("2026-10-13T11:00:00-04:00"));
    seed_uploaded(&h, "a", "a.pdf", "2026-10-13T09:00:00-04:00");

    let mut walker = h.incremental();
    walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.index.uploads(), vec!["a.pdf"]);
    assert_eq!(
        h.store.row("a").unwrap().run_timestamp,
        ts("2026-10-14T09:00:00-04:00")
    );
}

#[tokio::test]
async fn stored_timestamp_is_read_as_civil_wall_clock() {
    let h = Harness::new();
    // 08:00 in New York
    h.source
        .add_file("root", "a", "a.pdf", Some("2026-10-13T12:00:00+00:00"));
    // Stored without a meaningful offset: 09:00 wall clock means 09:00 New York
    seed_uploaded(&h, "a", "a.pdf", "2026-10-13T09:00:00+00:00");

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert!(h.index.uploads().is_empty());
    assert_eq!(summary.unchanged, 1);
}

#[tokio::test]
async fn record_from_repeated_dst_hour_keeps_its_offset() {
    let h = Harness::new();
    // 06:15 UTC, before the run that wrote the record at 06:30 UTC
    h.source
        .add_file("root", "a", "a.pdf", Some("2026-11-01T01:15:00-05:00"));
    seed_uploaded(&h, "a", "a.pdf", "2026-11-01T01:30:00-05:00");

    let mut walker = h.incremental();
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert!(h.index.uploads().is_empty());
    assert_eq!(summary.unchanged, 1);
}

#[tokio::test]
async fn missing_content_modified_at_counts_as_changed() {
    let h = Harness::new();
    h.source.add_file("root", "a", "a.pdf", None);
    seed_uploaded(&h, "a", "a.pdf", "2026-10-13T09:00:00-04:00");

    let mut walker = h.incremental();
    walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.index.uploads(), vec!["a.pdf"]);
}

#[tokio::test]
async fn new_files_skip_metadata_lookup() {
    let h = Harness::new();
    h.source.add_file("root", "n", "n.txt", None);

    let mut walker = h.incremental();
    walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(*h.store.lookups.lock().unwrap(), vec!["n".to_string()]);
    assert!(h.source.file_lookups.lock().unwrap().is_empty());
    assert_eq!(h.index.uploads(), vec!["n.txt"]);
}

#[tokio::test]
async fn full_load_reuploads_recorded_files() {
    let h = Harness::new();
    h.source
        .add_file("root", "a", "a.pdf", Some("2026-10-01T10:00:00-04:00"));
    seed_uploaded(&h, "a", "a.pdf", "2026-10-13T09:00:00-04:00");

    let mut walker = h.full_load();
    walker.sync(&folder_id("root")).await.unwrap();

    assert!(h.store.lookups.lock().unwrap().is_empty());
    assert!(h.source.file_lookups.lock().unwrap().is_empty());
    assert_eq!(h.index.uploads(), vec!["a.pdf"]);
}

// ============================================================================
// Pagination
// ============================================================================

fn paged_options(page_size: u32) -> WalkerOptions {
    WalkerOptions {
        page_size,
        ..WalkerOptions::default()
    }
}

#[tokio::test]
async fn listing_pages_until_short_page() {
    let h = Harness::new();
    for i in 0..5 {
        h.source
            .add_file("root", &format!("s{i}"), &format!("s{i}.bin"), None);
    }

    let mut walker = h.walker(paged_options(2));
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    let offsets: Vec<u32> = h
        .source
        .list_calls
        .lock()
        .unwrap()
        .iter()
        .map(|(_, limit, offset)| {
            assert_eq!(*limit, 2);
            *offset
        })
        .collect();
    assert_eq!(offsets, vec![0, 2, 4]);
    assert_eq!(summary.skipped, 5);
}

#[tokio::test]
async fn full_last_page_requests_one_more_page() {
    let h = Harness::new();
    for i in 0..4 {
        h.source
            .add_file("root", &format!("s{i}"), &format!("s{i}.bin"), None);
    }

    let mut walker = h.walker(paged_options(2));
    walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.source.list_calls.lock().unwrap().len(), 3);
}

// ============================================================================
// Buffering
// ============================================================================

#[tokio::test]
async fn buffer_never_exceeds_bound() {
    let h = Harness::new();
    for i in 0..5 {
        h.source
            .add_file("root", &format!("s{i}"), &format!("s{i}.bin"), None);
    }

    let mut walker = h.walker(WalkerOptions {
        max_buffer_size: 2,
        ..WalkerOptions::default()
    });
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.store.batch_sizes(), vec![2, 2, 1]);
    assert_eq!(summary.records_flushed, 5);
}

#[tokio::test]
async fn subfolder_records_are_flushed_after_recursion() {
    let h = Harness::new();
    h.source.add_folder("root", "S", "Sub", YESTERDAY);
    h.source.add_file("S", "x", "x.pdf", None);
    h.source.add_file("root", "y", "y.pdf", None);

    let mut walker = h.incremental();
    walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.store.batch_ids(), vec![vec!["x"], vec!["y"]]);
}

#[tokio::test]
async fn failed_flush_keeps_records_for_retry() {
    let h = Harness::new();
    h.source.add_file("root", "a", "a.pdf", None);
    h.source.add_file("root", "b", "b.xyz", None);
    h.store.fail_upsert.store(true, Ordering::SeqCst);

    let mut walker = h.incremental();
    let err = walker.sync(&folder_id("root")).await.unwrap_err();
    assert!(matches!(err, SyncError::StateStore { .. }));

    let pending: Vec<&str> = walker
        .pending_records()
        .iter()
        .map(|r| r.file_id.as_str())
        .collect();
    assert_eq!(pending, vec!["a", "b"]);

    h.store.fail_upsert.store(false, Ordering::SeqCst);
    assert_eq!(walker.flush().await.unwrap(), 2);
    assert!(walker.pending_records().is_empty());
    assert_eq!(h.store.row("b").unwrap().status, SyncStatus::Skipping);
}

// ============================================================================
// Failures and repeated runs
// ============================================================================

#[tokio::test]
async fn listing_error_aborts_run() {
    let h = Harness::new();
    h.source.add_file("root", "a", "a.pdf", None);
    h.source.fail_listing.store(true, Ordering::SeqCst);

    let mut walker = h.incremental();
    let err = walker.sync(&folder_id("root")).await.unwrap_err();

    match err {
        SyncError::Source { context, source } => {
            assert!(context.contains("root"));
            assert!(source.to_string().contains("429"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.index.uploads().is_empty());
}

#[tokio::test]
async fn counters_reset_between_runs() {
    let h = Harness::new();
    h.source.add_file("root", "a", "a.pdf", None);

    let mut walker = h.full_load();
    let first = walker.sync(&folder_id("root")).await.unwrap();
    let second = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(first.total_processed, 1);
    assert_eq!(second.total_processed, 1);
    assert_eq!(second.successful, 1);
    assert_eq!(second.records_flushed, 1);
}

#[tokio::test]
async fn custom_extension_filter_is_honoured() {
    let h = Harness::new();
    h.source.add_file("root", "m", "notes.MD", None);
    h.source.add_file("root", "p", "report.pdf", None);

    let mut walker = h.walker(WalkerOptions {
        filter: ExtensionFilter::new([".md"]),
        ..WalkerOptions::default()
    });
    let summary = walker.sync(&folder_id("root")).await.unwrap();

    assert_eq!(h.index.uploads(), vec!["notes.md"]);
    assert_eq!(h.store.row("p").unwrap().status, SyncStatus::Skipping);
    assert_eq!(summary.skipped, 1);
}
