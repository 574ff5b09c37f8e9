//! Integration tests for the `daq-db` truth ledger.
//!
//! Each test opens a fresh `SQLite` file in a temporary directory, so no
//! external services are required.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};
use daq_db::{CategoryTotals, LedgerConfig, TruthLedger};
use daq_types::{Category, TruthRecord};
use futures::TryStreamExt as _;

async fn open_ledger(dir: &tempfile::TempDir) -> TruthLedger {
    let config = LedgerConfig::new(&dir.path().join("truth.db"));
    TruthLedger::open(&config)
        .await
        .expect("Failed to open ledger")
}

fn make_record(n: i64, is_signal: bool) -> TruthRecord {
    let base = Utc.with_ymd_and_hms(2023, 10, 23, 12, 0, 0).unwrap();
    TruthRecord {
        timestamp: base + Duration::seconds(n),
        source_path: PathBuf::from(format!("/tmp/original/NR/{n}.png")),
        object_name: format!("cygno-{n:064x}.jpg"),
        is_signal,
    }
}

async fn collect(ledger: &TruthLedger) -> Vec<TruthRecord> {
    ledger
        .all()
        .await
        .expect("Failed to open stream")
        .try_collect()
        .await
        .expect("Failed to read rows")
}

#[tokio::test]
async fn fresh_ledger_is_empty_and_has_no_table() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;

    assert!(!ledger.table_exists().await.unwrap());
    assert!(collect(&ledger).await.is_empty());
}

#[tokio::test]
async fn first_record_creates_table() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;

    ledger.record(&make_record(0, true)).await.unwrap();

    assert!(ledger.table_exists().await.unwrap());
    let rows = collect(&ledger).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], make_record(0, true));
}

#[tokio::test]
async fn record_appends_after_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;

    for n in 0..5 {
        ledger.record(&make_record(n, n % 2 == 0)).await.unwrap();
    }
    let newest = make_record(99, false);
    ledger.record(&newest).await.unwrap();

    let rows = collect(&ledger).await;
    assert_eq!(rows.len(), 6);
    assert_eq!(rows.iter().filter(|r| **r == newest).count(), 1);
    assert_eq!(rows.last(), Some(&newest));
    for (n, row) in (0_i64..).zip(rows.iter().take(5)) {
        assert_eq!(row.object_name, make_record(n, true).object_name);
    }
}

#[tokio::test]
async fn category_flag_survives_storage() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;

    ledger.record(&make_record(1, true)).await.unwrap();
    ledger.record(&make_record(2, false)).await.unwrap();

    let categories: Vec<Category> = collect(&ledger)
        .await
        .iter()
        .map(TruthRecord::category)
        .collect();
    assert_eq!(categories, vec![Category::Signal, Category::Background]);
}

#[tokio::test]
async fn reopened_ledger_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ledger = open_ledger(&dir).await;
        ledger.record(&make_record(7, true)).await.unwrap();
    }

    let ledger = open_ledger(&dir).await;
    ledger.record(&make_record(8, false)).await.unwrap();

    let names: Vec<String> = collect(&ledger)
        .await
        .into_iter()
        .map(|r| r.object_name)
        .collect();
    assert_eq!(
        names,
        vec![make_record(7, true).object_name, make_record(8, false).object_name]
    );
}

#[tokio::test]
async fn audit_reads_while_writer_appends() {
    let dir = tempfile::tempdir().unwrap();
    let writer = open_ledger(&dir).await;
    for n in 0..20 {
        writer.record(&make_record(n, false)).await.unwrap();
    }

    let reader = open_ledger(&dir).await;
    let write_more = async {
        for n in 20..40 {
            writer.record(&make_record(n, true)).await.unwrap();
        }
    };
    let read_all = collect(&reader);
    let ((), seen) = tokio::join!(write_more, read_all);

    assert!(seen.len() >= 20);
    for pair in seen.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
    assert_eq!(collect(&reader).await.len(), 40);
}

#[tokio::test]
async fn category_totals_match_recorded_rows() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;
    assert_eq!(ledger.category_totals().await.unwrap(), CategoryTotals::default());

    let flags = [true, false, false, true, false, false, false];
    for (n, is_signal) in (0_i64..).zip(flags) {
        ledger.record(&make_record(n, is_signal)).await.unwrap();
    }

    let totals = ledger.category_totals().await.unwrap();
    assert_eq!(totals.signal, 2);
    assert_eq!(totals.background, 5);
    assert_eq!(totals.total(), 7);

    let rows = collect(&ledger).await;
    let expected: Vec<TruthRecord> = (0_i64..)
        .zip(flags)
        .map(|(n, is_signal)| make_record(n, is_signal))
        .collect();
    assert_eq!(rows, expected);
}

#[tokio::test]
async fn closed_ledger_rejects_writes_and_reopens_intact() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir).await;
    ledger.record(&make_record(1, true)).await.unwrap();
    ledger.record(&make_record(2, false)).await.unwrap();

    let clone = ledger.clone();
    ledger.close().await;
    assert!(clone.record(&make_record(3, true)).await.is_err());

    let reopened = open_ledger(&dir).await;
    assert_eq!(
        collect(&reopened).await,
        vec![make_record(1, true), make_record(2, false)]
    );
}
