use async_trait::async_trait;
use std::fs;
use std::sync::Arc;

use job_tracker::artifacts::{INPUTS_FILE, RECORDS_FILE};
use job_tracker::classifier::{ClassificationBackend, LabelClassifier, Prediction, StatusLabel};
use job_tracker::company::{CompanyExtractor, SuffixRecognizer};
use job_tracker::config::Config;
use job_tracker::email::{extract_body, mime, JobTracker, MessageSource, RawMessage};
use job_tracker::error::BackendError;
use job_tracker::Pipeline;

/// Backend that never answers with a known label.
struct Mumbling;

#[async_trait]
impl ClassificationBackend for Mumbling {
    fn name(&self) -> &str {
        "mumbling"
    }

    fn render_input(&self, message: &RawMessage) -> String {
        format!("{}: {}", message.id, message.subject)
    }

    async fn predict(&self, inputs: &[String]) -> Result<Vec<Prediction>, BackendError> {
        Ok(inputs.iter().map(|_| Prediction::Generated("hmm".to_string())).collect())
    }
}

fn pipeline() -> Pipeline {
    Pipeline::new(
        LabelClassifier::new(Arc::new(Mumbling)),
        CompanyExtractor::with_recognizer(Arc::new(SuffixRecognizer)),
    )
}

fn load(name: &str) -> RawMessage {
    let raw = fs::read(format!("data_test/{}.eml", name))
        .unwrap_or_else(|_| panic!("Failed to read test email file data_test/{}.eml", name));
    mime::raw_message(name, &raw).expect("Failed to parse email")
}

#[test]
fn test_html_only_email_body() {
    let message = load("interview_html");
    let content = message.content.as_ref().expect("content tree");

    let body = extract_body(content);
    assert!(body.starts_with("Hi Jane,\n"), "unexpected body: {:?}", body);
    assert!(body.contains("invite you to interview"));
    assert!(!body.contains('<'));
    assert!(!body.contains("color"));
}

#[test]
fn test_multipart_email_prefers_plain_text() {
    let message = load("rejection_multipart");
    let body = extract_body(message.content.as_ref().expect("content tree"));

    assert!(body.starts_with("Dear Jane,"));
    assert!(!body.contains("<p>"));
}

#[tokio::test]
async fn test_fixture_emails_end_to_end() {
    let messages = vec![
        load("acknowledgement"),
        load("interview_html"),
        load("rejection_multipart"),
    ];

    let records = pipeline().process(&messages).await.unwrap();

    let summary: Vec<(&str, StatusLabel, &str)> = records
        .iter()
        .map(|r| (r.email_id.as_str(), r.classification, r.company.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("acknowledgement", StatusLabel::ApplicationReceived, "Acme Corp"),
            ("interview_html", StatusLabel::Interview, "Globex"),
            ("rejection_multipart", StatusLabel::Rejected, "Initech"),
        ]
    );
    assert!(records.iter().all(|r| r.is_fallback()));
}

#[tokio::test]
async fn test_tracker_writes_artifacts() {
    let data_dir = tempfile::tempdir().unwrap();
    let input_dir = tempfile::tempdir().unwrap();

    let messages = vec![load("acknowledgement"), load("rejection_multipart")];
    let input_path = input_dir.path().join("messages.json");
    fs::write(&input_path, serde_json::to_string(&messages).unwrap()).unwrap();

    let data_dir_path = data_dir.path().to_string_lossy().to_string();
    let config = Config::from_lookup(|name: &str| match name {
        "COHERE_API_KEY" => Some("test-key".to_string()),
        "FT_MODEL_ID" => Some("test-model".to_string()),
        "DATA_DIR" => Some(data_dir_path.clone()),
        _ => None,
    })
    .unwrap();

    let tracker = JobTracker::new(config, MessageSource::JsonFile(input_path))
        .unwrap()
        .with_pipeline(pipeline());
    let result = tracker.run(None).await.unwrap();

    assert_eq!(result.emails_processed, 2);
    assert_eq!(result.fallbacks, 2);

    let inputs: Vec<String> =
        serde_json::from_str(&fs::read_to_string(data_dir.path().join(INPUTS_FILE)).unwrap()).unwrap();
    assert_eq!(
        inputs,
        vec![
            "acknowledgement: Thank you for applying to Acme Corp",
            "rejection_multipart: Your application"
        ]
    );

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.path().join(RECORDS_FILE)).unwrap()).unwrap();
    assert_eq!(records[1]["classification"], "Rejected");
    assert_eq!(records[1]["company"], "Initech");
}

#[tokio::test]
async fn test_tracker_limit() {
    let data_dir = tempfile::tempdir().unwrap();
    let data_dir_path = data_dir.path().to_string_lossy().to_string();
    let config = Config::from_lookup(|name: &str| match name {
        "COHERE_API_KEY" => Some("test-key".to_string()),
        "FT_MODEL_ID" => Some("test-model".to_string()),
        "DATA_DIR" => Some(data_dir_path.clone()),
        _ => None,
    })
    .unwrap();

    let tracker = JobTracker::new_dry_run(config, MessageSource::EmlDir("data_test".into()))
        .unwrap()
        .with_pipeline(pipeline());
    let result = tracker.run(Some(2)).await.unwrap();

    assert_eq!(result.emails_processed, 2);
    // Dry runs write nothing
    assert!(!data_dir.path().join(RECORDS_FILE).exists());
}
