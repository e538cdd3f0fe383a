//! Integration tests for the load, match, record and persist cycle

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use reel::serializers::{JsonSerializer, Serializer};
use reel::{
    Cassette, CassetteOptions, MatcherRegistry, ReelError, RecordMode, Request, Response,
    SerializerRegistry,
};

const SAMPLE: &str = r#"{
  "http_interactions": [
    {
      "request": {
        "method": "GET",
        "uri": "https://api.example.com/users",
        "headers": {},
        "body": {"encoding": "utf-8", "string": ""}
      },
      "response": {
        "status": {"code": 200, "message": "OK"},
        "url": "https://api.example.com/users",
        "headers": {"Content-Type": ["application/json"]},
        "body": {"encoding": "utf-8", "string": "{\"id\":1}"}
      },
      "recorded_at": "2020-01-01T00:00:00Z"
    }
  ],
  "recorded_with": "reel/0.1.0"
}"#;

fn write_sample(dir: &Path) {
    std::fs::write(dir.join("sample.json"), SAMPLE).unwrap();
}

fn open(dir: &Path, record_mode: RecordMode) -> Cassette {
    open_named(dir, "sample", record_mode)
}

fn open_named(dir: &Path, name: &str, record_mode: RecordMode) -> Cassette {
    let options = CassetteOptions {
        record_mode,
        ..CassetteOptions::default()
    };
    Cassette::new(
        name,
        dir,
        options,
        Arc::new(MatcherRegistry::with_defaults()),
        &SerializerRegistry::with_defaults(),
    )
    .unwrap()
}

#[test]
fn test_sample_scenario() {
    let temp_dir = TempDir::new().unwrap();
    write_sample(temp_dir.path());

    let mut cassette = open(temp_dir.path(), RecordMode::Once);
    assert!(!cassette.is_empty());
    assert!(!cassette.is_recording());

    {
        let found = cassette
            .find_match(&Request::new("GET", "https://api.example.com/users"))
            .expect("GET /users should match");
        let response = found.to_response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"id":1}"#);
    }

    assert!(cassette
        .find_match(&Request::new("POST", "https://api.example.com/users"))
        .is_none());

    let expected: DateTime<Utc> = "2020-01-01T00:00:00Z".parse().unwrap();
    assert_eq!(cassette.earliest_recorded_date(), expected);
}

#[test]
fn test_clear_persists_empty_cassette() {
    let temp_dir = TempDir::new().unwrap();
    write_sample(temp_dir.path());

    let mut cassette = open(temp_dir.path(), RecordMode::Once);
    cassette.clear().unwrap();
    assert!(cassette.interactions().is_empty());

    let reloaded = open(temp_dir.path(), RecordMode::Once);
    assert!(reloaded.interactions().is_empty());
    assert!(reloaded.is_empty());
    assert!(reloaded.is_recording());
}

#[test]
fn test_record_on_first_run_replay_on_second() {
    let temp_dir = TempDir::new().unwrap();
    let request = Request::new("GET", "https://api.example.com/repos?page=1&per_page=5")
        .with_header("Accept", "application/json");

    // First run: nothing stored, so the cassette records
    {
        let mut cassette = open(temp_dir.path(), RecordMode::Once);
        assert!(cassette.is_recording());
        assert!(cassette.find_match(&request).is_none());

        let response = Response::new(200)
            .with_url("https://api.example.com/repos?page=1&per_page=5")
            .with_header("Content-Type", "application/json")
            .with_body(r#"[{"name":"reel"}]"#);
        cassette.record(&request, &response);
        cassette.eject().unwrap();
    }

    // Second run: replay only
    {
        let mut cassette = open(temp_dir.path(), RecordMode::Once);
        assert!(!cassette.is_recording());

        let reordered = Request::new("get", "https://api.example.com/repos?per_page=5&page=1");
        let found = cassette.find_match(&reordered).expect("replayed");
        assert_eq!(found.response.body.string.as_deref(), Some(r#"[{"name":"reel"}]"#));
    }
}

#[test]
fn test_all_mode_replaces_interaction() {
    let temp_dir = TempDir::new().unwrap();
    write_sample(temp_dir.path());
    let request = Request::new("GET", "https://api.example.com/users");

    {
        let mut cassette = open(temp_dir.path(), RecordMode::All);
        let stale = cassette.find_match(&request).map(|found| found.into_owned());
        assert!(stale.is_some());
        assert!(cassette.find_match(&request).is_none());

        cassette.record(&request, &Response::new(200).with_body(r#"{"id":2}"#));
        cassette.eject().unwrap();
    }

    let text = std::fs::read_to_string(temp_dir.path().join("sample.json")).unwrap();
    let data = JsonSerializer.deserialize(&text).unwrap();
    assert_eq!(data.http_interactions.len(), 1);
    assert_eq!(
        data.http_interactions[0].response.body.string.as_deref(),
        Some(r#"{"id":2}"#)
    );
    assert!(data.recorded_with.starts_with("reel/"));
}

#[test]
fn test_new_episodes_appends_after_existing() {
    let temp_dir = TempDir::new().unwrap();
    write_sample(temp_dir.path());

    let mut cassette = open(temp_dir.path(), RecordMode::NewEpisodes);
    let create = Request::new("POST", "https://api.example.com/users").with_body(r#"{"n":1}"#);
    assert!(cassette.find_match(&create).is_none());
    cassette.record(&create, &Response::new(201));
    cassette.eject().unwrap();

    let reloaded = open(temp_dir.path(), RecordMode::None);
    let methods: Vec<&str> = reloaded
        .interactions()
        .iter()
        .map(|interaction| interaction.request.method.as_str())
        .collect();
    assert_eq!(methods, vec!["GET", "POST"]);
}

#[test]
fn test_corrupt_store_surfaces_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("sample.json"), "{\"http_interactions\": 5}").unwrap();

    let result = Cassette::new(
        "sample",
        temp_dir.path(),
        CassetteOptions::default(),
        Arc::new(MatcherRegistry::with_defaults()),
        &SerializerRegistry::with_defaults(),
    );
    assert!(result.is_err());
}

#[test]
fn test_loads_timestamps_without_offset() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = SAMPLE
        .replace("2020-01-01T00:00:00Z", "2020-01-01T00:00:00")
        .replace("reel/0.1.0", "betamax/0.8.1");
    std::fs::write(temp_dir.path().join("sample.json"), legacy).unwrap();

    let mut cassette = open(temp_dir.path(), RecordMode::None);
    let expected: DateTime<Utc> = "2020-01-01T00:00:00Z".parse().unwrap();
    assert_eq!(cassette.earliest_recorded_date(), expected);
    assert!(cassette
        .find_match(&Request::new("GET", "https://api.example.com/users"))
        .is_some());
}

#[test]
fn test_unwritable_library_surfaces_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let request = Request::new("GET", "https://api.example.com/users");

    let mut cleared = open_named(temp_dir.path(), "blocked/cleared", RecordMode::Once);
    let mut ejected = open_named(temp_dir.path(), "blocked/ejected", RecordMode::Once);
    ejected.record(&request, &Response::new(200));

    // A regular file where the cassette directory should be created
    std::fs::write(temp_dir.path().join("blocked"), "").unwrap();

    assert!(matches!(cleared.clear(), Err(ReelError::Io(_))));
    assert!(matches!(ejected.eject(), Err(ReelError::Io(_))));
}

#[test]
fn test_unreadable_store_surfaces_io_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir(temp_dir.path().join("sample.json")).unwrap();

    let result = Cassette::new(
        "sample",
        temp_dir.path(),
        CassetteOptions::default(),
        Arc::new(MatcherRegistry::with_defaults()),
        &SerializerRegistry::with_defaults(),
    );
    assert!(matches!(result, Err(ReelError::Io(_))));
}
