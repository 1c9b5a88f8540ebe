//! wiremock-backed integration tests for the full search-and-archive
//! session workflow.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zenodo_archiver_core::session::RECORDS_FILE_NAME;
use zenodo_archiver_core::{HttpClient, SearchClient, SessionCounter, run_session};

/// Builds a small zip archive in memory.
fn test_zip_bytes() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("paper/readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"extracted content").unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

fn search_client_for(server: &MockServer) -> SearchClient {
    SearchClient::with_endpoint("tok".to_string(), format!("{}/api/records", server.uri()))
}

/// The single directory created under the results root.
fn session_dir(results_root: &Path) -> PathBuf {
    let mut entries: Vec<_> = std::fs::read_dir(results_root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "Expected exactly one session folder");
    entries.remove(0)
}

/// The summary file is the only json file in the session folder besides
/// `records.json`.
fn summary_file(session_path: &Path) -> PathBuf {
    let summaries: Vec<_> = std::fs::read_dir(session_path)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.is_file()
                && p.extension().is_some_and(|ext| ext == "json")
                && p.file_name().is_some_and(|name| name != RECORDS_FILE_NAME)
        })
        .collect();
    assert_eq!(summaries.len(), 1, "Expected exactly one summary file");
    summaries.into_iter().next().unwrap()
}

#[tokio::test]
async fn test_full_session_downloads_and_extracts_record_archive() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let results_root = root.path().join("resultsSearch");

    let file_url = format!("{}/files/42/file.zip", mock_server.uri());
    let search_body = serde_json::json!({
        "hits": {
            "hits": [{
                "id": 42,
                "metadata": {
                    "title": "Test: One",
                    "publication_date": "2024-01-01",
                    "doi": "10.5281/zenodo.42",
                    "creators": [{"name": "Lovelace, Ada"}]
                },
                "files": [{"links": {"self": file_url}}]
            }]
        }
    });

    Mock::given(method("GET"))
        .and(path("/api/records"))
        .and(query_param("access_token", "tok"))
        .and(query_param(
            "q",
            "metadata.creators.person_or_org.name:\"Ada Lovelace\"",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/42/file.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(test_zip_bytes()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut counter = SessionCounter::new();
    let outcome = run_session(
        &mut counter,
        &search_client_for(&mock_server),
        &HttpClient::new(),
        Some("Ada Lovelace"),
        None,
        "tester",
        &results_root,
    )
    .await
    .unwrap();

    assert_eq!(outcome.records_processed, 1);
    assert_eq!(outcome.archives_downloaded, 1);

    let session_path = session_dir(&results_root);
    let record_root = session_path.join("Results/theZenodo_42");

    // Raw archive saved under the sanitized title
    let archive = record_root.join("Content/Zip_Test__One.zip");
    assert!(archive.is_file(), "missing archive at {}", archive.display());

    // Extraction completed before the session closed
    let extracted = record_root.join("Decompressed/paper/readme.txt");
    assert_eq!(std::fs::read(&extracted).unwrap(), b"extracted content");

    // Metadata file matches the input fields
    let metadata: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(record_root.join("metadataFile/metadata.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(metadata["title"], "Test: One");
    assert_eq!(metadata["doi"], "10.5281/zenodo.42");
    assert_eq!(metadata["creators"][0]["name"], "Lovelace, Ada");

    // Summary: criteria has the record twice (metadata + downloaded archive)
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary_file(&session_path)).unwrap())
            .unwrap();
    assert_eq!(summary["searchId"], 1);
    assert_eq!(summary["authorName"], "Ada Lovelace");
    assert_eq!(summary["userName"], "tester");
    assert_eq!(summary["criteria"].as_array().unwrap().len(), 2);

    // Consolidated records file mirrors the criteria list
    let records: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(session_path.join(RECORDS_FILE_NAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(records.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_zero_record_session_writes_summary_without_records_file() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let results_root = root.path().join("resultsSearch");

    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"hits": {"hits": []}})),
        )
        .mount(&mock_server)
        .await;

    let mut counter = SessionCounter::new();
    let outcome = run_session(
        &mut counter,
        &search_client_for(&mock_server),
        &HttpClient::new(),
        Some("Nobody"),
        Some("ghost-town"),
        "tester",
        &results_root,
    )
    .await
    .unwrap();

    assert_eq!(outcome.records_processed, 0);

    let session_path = session_dir(&results_root);
    assert!(
        !session_path.join(RECORDS_FILE_NAME).exists(),
        "records.json must not be written for an empty search"
    );

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary_file(&session_path)).unwrap())
            .unwrap();
    assert_eq!(summary["criteria"], serde_json::json!([]));
    assert_eq!(summary["communityName"], "ghost-town");
}

#[tokio::test]
async fn test_record_without_files_is_listed_once_and_not_downloaded() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let results_root = root.path().join("resultsSearch");

    let search_body = serde_json::json!({
        "hits": {
            "hits": [{
                "id": 7,
                "metadata": {"title": "Metadata Only"}
            }]
        }
    });

    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body))
        .mount(&mock_server)
        .await;

    let mut counter = SessionCounter::new();
    let outcome = run_session(
        &mut counter,
        &search_client_for(&mock_server),
        &HttpClient::new(),
        Some("Ada Lovelace"),
        None,
        "tester",
        &results_root,
    )
    .await
    .unwrap();

    assert_eq!(outcome.records_processed, 1);
    assert_eq!(outcome.archives_downloaded, 0);

    let session_path = session_dir(&results_root);
    let record_root = session_path.join("Results/theZenodo_7");

    // Tree exists, but nothing was downloaded or extracted
    let content_entries = std::fs::read_dir(record_root.join("Content")).unwrap().count();
    let decompressed_entries = std::fs::read_dir(record_root.join("Decompressed"))
        .unwrap()
        .count();
    assert_eq!(content_entries, 0);
    assert_eq!(decompressed_entries, 0);
    assert!(record_root.join("metadataFile/metadata.json").is_file());

    // Exactly one accumulated entry for a record without files
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary_file(&session_path)).unwrap())
            .unwrap();
    assert_eq!(summary["criteria"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_counter_numbers_consecutive_sessions() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let results_root = root.path().join("resultsSearch");

    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"hits": {"hits": []}})),
        )
        .mount(&mock_server)
        .await;

    let search = search_client_for(&mock_server);
    let http = HttpClient::new();
    let mut counter = SessionCounter::new();

    for _ in 0..2 {
        run_session(
            &mut counter,
            &search,
            &http,
            Some("Ada Lovelace"),
            None,
            "tester",
            &results_root,
        )
        .await
        .unwrap();
    }

    let mut folders: Vec<_> = std::fs::read_dir(&results_root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    folders.sort();
    assert_eq!(folders.len(), 2);
    assert!(folders[0].starts_with("Search_1_"), "got: {folders:?}");
    assert!(folders[1].starts_with("Search_2_"), "got: {folders:?}");
}

#[tokio::test]
async fn test_search_failure_aborts_session_without_summary() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let results_root = root.path().join("resultsSearch");

    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut counter = SessionCounter::new();
    let result = run_session(
        &mut counter,
        &search_client_for(&mock_server),
        &HttpClient::new(),
        Some("Ada Lovelace"),
        None,
        "tester",
        &results_root,
    )
    .await;

    assert!(result.is_err(), "search failure must abort the session");

    // The session folder was created before the failure and is left in
    // place, but no summary was written.
    let session_path = session_dir(&results_root);
    let file_count = std::fs::read_dir(&session_path).unwrap().count();
    assert_eq!(file_count, 0, "aborted session must not write summary files");
}
