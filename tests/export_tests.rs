//! End-to-end exporter tests over real temporary SQLite databases.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chromedump::errors::{ChromeDumpError, Result};
use chromedump::export::{EventSink, ExportEvent, Exporter, NullSink};
use chromedump::keysource::{KeySource, MasterKey, StaticKeySource};
use regex::Regex;
use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Key source that always fails, for exercising the fallback path.
struct NoKeySource;

impl KeySource for NoKeySource {
    fn describe(&self) -> String {
        "test source with no key".to_string()
    }

    fn fetch(&self) -> Result<MasterKey> {
        Err(ChromeDumpError::KeySource("no key in tests".to_string()))
    }
}

/// Sink collecting every event for later assertions.
fn collecting_sink() -> (Arc<Mutex<Vec<ExportEvent>>>, Box<dyn EventSink>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let handle = events.clone();
    let sink = Box::new(move |event: &ExportEvent| {
        handle.lock().unwrap().push(event.clone());
    });
    (events, sink)
}

/// Build an AES-256-GCM cell envelope around `plaintext`.
fn seal_envelope(key: &[u8; 32], plaintext: &[u8]) -> Vec<u8> {
    let nonce_bytes = [0x11u8; 12];
    let cipher = Aes256Gcm::new_from_slice(key).unwrap();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .unwrap();

    // "v11" so the sync-metadata check does not swallow it.
    let mut envelope = b"v11".to_vec();
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    envelope
}

fn read_table_json(dir: &Path, table: &str) -> serde_json::Value {
    let raw = std::fs::read_to_string(dir.join(format!("{table}.json"))).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn create_cookies_db(path: &Path, value_blob: &[u8]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE cookies (name TEXT, value BLOB, expires_utc INTEGER);",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO cookies VALUES (?1, ?2, ?3)",
        params!["sid", value_blob, 13_300_000_000_000_000i64],
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// The cookies scenario
// ---------------------------------------------------------------------------

#[test]
fn cookies_scenario_produces_the_documented_shape() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("Cookies.db");
    let out = tmp.path().join("out");

    // A short, undecodable blob: skips the cipher, lands in base64.
    let blob = [0xFFu8; 8];
    create_cookies_db(&db, &blob);

    let mut exporter = Exporter::new(&NoKeySource, Box::new(NullSink));
    let run = exporter.export(&db, &out).unwrap();
    let progress: Vec<f64> = run.collect();
    assert_eq!(progress, vec![100.0]);

    let json = read_table_json(&out, "cookies");
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);

    let row = rows[0].as_object().unwrap();
    let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["expires_utc", "name", "value"]);

    assert_eq!(row["name"], "sid");
    assert_eq!(row["value"], BASE64.encode(blob));
    assert_eq!(row["expires_utc"], "2022-06-18T04:26:40+00:00");
}

#[test]
fn key_unavailable_is_reported_and_nonfatal() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("Cookies.db");
    create_cookies_db(&db, b"some opaque bytes here");

    let (events, sink) = collecting_sink();
    let mut exporter = Exporter::new(&NoKeySource, sink);
    assert!(!exporter.has_key());

    let run = exporter.export(&db, &tmp.path().join("out")).unwrap();
    run.for_each(drop);

    let events = events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, ExportEvent::KeyUnavailable { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ExportEvent::TableSucceeded { .. })));
}

// ---------------------------------------------------------------------------
// Decryption through the pipeline
// ---------------------------------------------------------------------------

#[test]
fn encrypted_cells_decrypt_with_a_static_key() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("Login Data.db");
    let out = tmp.path().join("out");

    let key = [0x42u8; 32];
    let envelope = seal_envelope(&key, b"hunter2-password");

    let conn = Connection::open(&db).unwrap();
    conn.execute_batch("CREATE TABLE logins (origin TEXT, password_value BLOB);")
        .unwrap();
    conn.execute(
        "INSERT INTO logins VALUES (?1, ?2)",
        params!["https://example.com", envelope],
    )
    .unwrap();
    drop(conn);

    let source = StaticKeySource::new(BASE64.encode(key));
    let mut exporter = Exporter::new(&source, Box::new(NullSink));
    assert!(exporter.has_key());

    let run = exporter.export(&db, &out).unwrap();
    run.for_each(drop);

    let json = read_table_json(&out, "logins");
    assert_eq!(json[0]["password_value"], "hunter2-password");
}

#[test]
fn sync_metadata_stays_opaque_even_with_a_key() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("Cookies.db");
    let out = tmp.path().join("out");

    let blob = b"v10 sync metadata that must not be decrypted".to_vec();
    create_cookies_db(&db, &blob);

    let source = StaticKeySource::new(BASE64.encode([0x42u8; 32]));
    let mut exporter = Exporter::new(&source, Box::new(NullSink));
    let run = exporter.export(&db, &out).unwrap();
    run.for_each(drop);

    let json = read_table_json(&out, "cookies");
    assert_eq!(json[0]["value"], BASE64.encode(&blob));
}

// ---------------------------------------------------------------------------
// Walk mechanics: progress, isolation, laziness
// ---------------------------------------------------------------------------

fn create_numbered_tables(path: &Path, count: usize) {
    let conn = Connection::open(path).unwrap();
    for i in 0..count {
        conn.execute_batch(&format!(
            "CREATE TABLE t_{i} (x INTEGER); INSERT INTO t_{i} VALUES ({i});"
        ))
        .unwrap();
    }
}

#[test]
fn progress_advances_once_per_table_to_one_hundred() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("History.db");
    create_numbered_tables(&db, 4);

    let mut exporter = Exporter::new(&NoKeySource, Box::new(NullSink));
    let run = exporter.export(&db, &tmp.path().join("out")).unwrap();

    let progress: Vec<f64> = run.collect();
    assert_eq!(progress, vec![25.0, 50.0, 75.0, 100.0]);
}

#[test]
fn failed_table_is_isolated_and_still_advances_progress() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("History.db");
    create_numbered_tables(&db, 3);

    let (events, sink) = collecting_sink();
    let mut exporter = Exporter::new(&NoKeySource, sink);
    let out = tmp.path().join("out");
    let mut run = exporter.export(&db, &out).unwrap();

    // First table exports normally.
    let first = run.next().unwrap();
    assert!((first - 100.0 / 3.0).abs() < 1e-6, "got {first}");

    // Sabotage a later table while the run is suspended: the walk is
    // lazy, so t_2 only fails when its turn comes.
    let saboteur = Connection::open(&db).unwrap();
    saboteur.execute_batch("DROP TABLE t_2;").unwrap();
    drop(saboteur);

    let rest: Vec<f64> = run.by_ref().collect();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[1], 100.0);

    let summary = run.summary().unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    assert!(out.join("t_0.json").exists());
    assert!(out.join("t_1.json").exists());
    assert!(!out.join("t_2.json").exists());

    let events = events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, ExportEvent::TableFailed { table, .. } if table == "t_2")));
}

#[test]
fn abandoned_run_leaves_partial_output_only() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("History.db");
    create_numbered_tables(&db, 3);

    let out = tmp.path().join("out");
    let mut exporter = Exporter::new(&NoKeySource, Box::new(NullSink));
    {
        let mut run = exporter.export(&db, &out).unwrap();
        assert!(run.next().is_some());
        assert!(run.summary().is_none(), "no summary before exhaustion");
        // Dropped here: connection released, no summary emitted.
    }

    let exported: Vec<PathBuf> = std::fs::read_dir(&out)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(exported.len(), 1);
    assert!(out.join("t_0.json").exists());
}

#[test]
fn zero_row_table_exports_an_empty_array_and_succeeds() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("Web Data.db");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch("CREATE TABLE autofill (name TEXT, value TEXT);")
        .unwrap();
    drop(conn);

    let out = tmp.path().join("out");
    let mut exporter = Exporter::new(&NoKeySource, Box::new(NullSink));
    let mut run = exporter.export(&db, &out).unwrap();
    assert_eq!(run.next(), Some(100.0));
    assert_eq!(run.next(), None);

    let json = read_table_json(&out, "autofill");
    assert_eq!(json, serde_json::json!([]));

    let summary = run.summary().unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
}

#[test]
fn empty_database_still_produces_a_summary() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("empty.db");
    let conn = Connection::open(&db).unwrap();
    // Initialize the file, but leave the schema empty.
    conn.execute_batch("CREATE TABLE scratch (x); DROP TABLE scratch;")
        .unwrap();
    drop(conn);

    let (events, sink) = collecting_sink();
    let mut exporter = Exporter::new(&NoKeySource, sink);
    let mut run = exporter.export(&db, &tmp.path().join("out")).unwrap();

    assert_eq!(run.next(), None);
    let summary = run.summary().unwrap();
    assert_eq!(summary.total, 0);

    let events = events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(e, ExportEvent::Summary(_))));
}

#[test]
fn table_filter_limits_the_walk() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("History.db");
    create_numbered_tables(&db, 3);

    let out = tmp.path().join("out");
    let mut exporter = Exporter::new(&NoKeySource, Box::new(NullSink))
        .with_table_filter(Regex::new("^t_1$").unwrap());
    let run = exporter.export(&db, &out).unwrap();
    assert_eq!(run.table_count(), 1);
    run.for_each(drop);

    assert!(out.join("t_1.json").exists());
    assert!(!out.join("t_0.json").exists());
}

#[test]
fn missing_database_is_a_run_level_error() {
    let tmp = TempDir::new().unwrap();
    let mut exporter = Exporter::new(&NoKeySource, Box::new(NullSink));
    let result = exporter.export(&tmp.path().join("nope.db"), &tmp.path().join("out"));
    assert!(matches!(result, Err(ChromeDumpError::DatabaseNotFound(_))));
}

#[test]
fn row_progress_events_follow_the_interval() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("History.db");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch("CREATE TABLE visits (id INTEGER);").unwrap();
    for i in 0..25 {
        conn.execute("INSERT INTO visits VALUES (?1)", params![i]).unwrap();
    }
    drop(conn);

    let (events, sink) = collecting_sink();
    let mut exporter =
        Exporter::new(&NoKeySource, sink).with_row_progress_interval(10);
    let run = exporter.export(&db, &tmp.path().join("out")).unwrap();
    run.for_each(drop);

    let events = events.lock().unwrap();
    let progress_marks: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::RowProgress { processed, .. } => Some(*processed),
            _ => None,
        })
        .collect();
    // Initial count announcement, then every 10 rows.
    assert_eq!(progress_marks, vec![0, 10, 20]);
}
