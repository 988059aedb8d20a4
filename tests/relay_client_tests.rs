mod common;

use std::time::Duration;

use formrelay::db::MemorySubmissionStore;
use formrelay::files::FileStore;
use formrelay::models::TrackingParams;
use formrelay::relay::{payload, HttpRelayClient, RelayClient, RelayError, RelayOutcome};

fn client_for(url: &str, files: FileStore) -> HttpRelayClient {
    HttpRelayClient::new(url, Duration::from_secs(5), files)
}

// ── Classification ──────────────────────────────────────────────

#[test]
fn only_200_and_302_count_as_success() {
    assert!(RelayOutcome::from_status(200).is_success());
    assert!(RelayOutcome::from_status(302).is_success());
    for code in [201, 204, 301, 303, 400, 403, 404, 500, 503] {
        assert_eq!(
            RelayOutcome::from_status(code),
            RelayOutcome::Failure { status_code: code },
            "status {code}"
        );
    }
}

#[tokio::test]
async fn redirect_response_is_success() {
    let target = common::spawn_stub_target(302).await;
    let store = MemorySubmissionStore::new();
    let record = common::pending_record(&store, common::fields("A", "B", "a@b.com"), None).await;

    let client = client_for(&target.url(), FileStore::new(common::temp_dir("formrelay_files")));
    let outcome = client.send(&record, &TrackingParams::new()).await.unwrap();

    assert_eq!(outcome, RelayOutcome::Success { status_code: 302 });
    assert_eq!(target.received().len(), 1);
}

#[tokio::test]
async fn ok_response_is_success() {
    let target = common::spawn_stub_target(200).await;
    let store = MemorySubmissionStore::new();
    let record = common::pending_record(&store, common::fields("A", "B", "a@b.com"), None).await;

    let client = client_for(&target.url(), FileStore::new(common::temp_dir("formrelay_files")));
    let outcome = client.send(&record, &TrackingParams::new()).await.unwrap();

    assert_eq!(outcome, RelayOutcome::Success { status_code: 200 });
}

#[tokio::test]
async fn server_error_is_failure() {
    let target = common::spawn_stub_target(500).await;
    let store = MemorySubmissionStore::new();
    let record = common::pending_record(&store, common::fields("A", "B", "a@b.com"), None).await;

    let client = client_for(&target.url(), FileStore::new(common::temp_dir("formrelay_files")));
    let outcome = client.send(&record, &TrackingParams::new()).await.unwrap();

    assert_eq!(outcome, RelayOutcome::Failure { status_code: 500 });
    assert!(matches!(outcome.error(), Some(RelayError::EndpointRejected(500))));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let url = common::unreachable_url().await;
    let store = MemorySubmissionStore::new();
    let record = common::pending_record(&store, common::fields("A", "B", "a@b.com"), None).await;

    let client = client_for(&url, FileStore::new(common::temp_dir("formrelay_files")));
    let outcome = client.send(&record, &TrackingParams::new()).await.unwrap();

    assert!(matches!(outcome, RelayOutcome::TransportError { .. }));
}

// ── Request body ────────────────────────────────────────────────

#[tokio::test]
async fn fields_without_file_are_form_encoded() {
    let target = common::spawn_stub_target(302).await;
    let store = MemorySubmissionStore::new();
    let record = common::pending_record(&store, common::fields("A", "B", "a@b.com"), None).await;
    let tracking: TrackingParams = [("utm_source", "jobs board")].into_iter().collect();

    let client = client_for(&target.url(), FileStore::new(common::temp_dir("formrelay_files")));
    client.send(&record, &tracking).await.unwrap();

    let received = target.received();
    assert_eq!(received.len(), 1);
    assert!(received[0]
        .content_type
        .starts_with("application/x-www-form-urlencoded"));

    let pairs: Vec<(String, String)> = form_urlencoded::parse(received[0].body.as_bytes())
        .into_owned()
        .collect();
    assert!(pairs.contains(&("first_name".to_string(), "A".to_string())));
    assert!(pairs.contains(&("last_name".to_string(), "B".to_string())));
    assert!(pairs.contains(&("email".to_string(), "a@b.com".to_string())));
    assert!(pairs.contains(&("utm_source".to_string(), "jobs board".to_string())));
}

#[tokio::test]
async fn file_is_sent_as_multipart() {
    let target = common::spawn_stub_target(302).await;
    let files = FileStore::new(common::temp_dir("formrelay_files"));
    let reference = files.save("My CV.pdf", b"%PDF-1.4 resume body").await.unwrap();

    let store = MemorySubmissionStore::new();
    let record =
        common::pending_record(&store, common::fields("A", "B", "a@b.com"), Some(reference)).await;

    let client = client_for(&target.url(), files.clone());
    let outcome = client.send(&record, &TrackingParams::new()).await.unwrap();
    assert!(outcome.is_success());

    let received = target.received();
    assert!(received[0].content_type.starts_with("multipart/form-data"));
    assert!(received[0].body.contains("name=\"resume\""));
    assert!(received[0].body.contains("filename=\"My_CV.pdf\""));
    assert!(received[0].body.contains("%PDF-1.4 resume body"));
    assert!(received[0].body.contains("name=\"first_name\""));

    let _ = std::fs::remove_dir_all(files.root());
}

#[tokio::test]
async fn missing_file_is_a_preparation_error() {
    let target = common::spawn_stub_target(302).await;
    let files = FileStore::new(common::temp_dir("formrelay_files"));
    let reference = files.save("cv.pdf", b"content").await.unwrap();
    std::fs::remove_file(files.root().join(&reference)).unwrap();

    let store = MemorySubmissionStore::new();
    let record =
        common::pending_record(&store, common::fields("A", "B", "a@b.com"), Some(reference)).await;

    let client = client_for(&target.url(), files);
    let result = client.send(&record, &TrackingParams::new()).await;

    assert!(matches!(result, Err(RelayError::NotFound(_))));
    assert!(target.received().is_empty());
}

// ── Payload merge ───────────────────────────────────────────────

#[test]
fn field_wins_over_tracking_key() {
    let fields = common::fields("A", "B", "a@b.com");
    let mut tracking = TrackingParams::new();
    tracking.insert("email", "spoof@tracker.test");
    tracking.insert("utm_campaign", "spring");

    let body = payload::build(&fields, &tracking);

    let emails: Vec<&str> = body
        .iter()
        .filter(|(k, _)| k == "email")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(emails, vec!["a@b.com"]);
    assert!(body.contains(&("utm_campaign".to_string(), "spring".to_string())));
}

#[test]
fn payload_lists_fields_before_tracking() {
    let fields = common::fields("A", "B", "a@b.com");
    let tracking: TrackingParams = [("gclid", "abc"), ("utm_source", "x")].into_iter().collect();

    let body = payload::build(&fields, &tracking);
    let keys: Vec<&str> = body.iter().map(|(k, _)| k.as_str()).collect();

    assert_eq!(
        keys,
        vec![
            "first_name",
            "last_name",
            "email",
            "phone",
            "country",
            "city",
            "address",
            "position",
            "additional_info",
            "gclid",
            "utm_source",
        ]
    );
}
