use allergy_scan::domain::ports::{ProfileStore, ScanReporter};
use allergy_scan::utils::validation::Validate;
use allergy_scan::{
    AllergenTag, AllergyProfile, ErrorKind, FileImageSource, HttpTranslator, JsonProfileStore,
    ScanConfig, ScanEngine, ScanOutcome, ScanPipeline, ScanState, Verdict, VisionTextExtractor,
};
use httpmock::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

#[derive(Clone, Default)]
struct RecordingReporter {
    states: Arc<Mutex<Vec<ScanState>>>,
    verdicts: Arc<Mutex<Vec<Verdict>>>,
    errors: Arc<Mutex<Vec<ErrorKind>>>,
}

impl ScanReporter for RecordingReporter {
    fn on_state_change(&self, state: &ScanState) {
        self.states.lock().unwrap().push(state.clone());
    }

    fn report_verdict(&self, verdict: &Verdict) {
        self.verdicts.lock().unwrap().push(verdict.clone());
    }

    fn report_error(&self, error: &ErrorKind) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

struct Fixture {
    _dir: TempDir,
    image_path: std::path::PathBuf,
    profiles: JsonProfileStore,
    config: ScanConfig,
}

async fn fixture(server: &MockServer, ocr_timeout_seconds: u64) -> Fixture {
    let dir = TempDir::new().unwrap();
    let image_path = dir.path().join("label.jpg");
    std::fs::write(&image_path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

    let profile_dir = dir.path().join("profiles");
    let config = ScanConfig::from_toml_str(&format!(
        r#"
[ocr]
endpoint = "{}"
api_key = "vision-key"
timeout_seconds = {}

[translation]
endpoint = "{}"
api_key = "translate-key"

[profiles]
path = "{}"
"#,
        server.url("/v1/images:annotate"),
        ocr_timeout_seconds,
        server.url("/language/translate/v2"),
        profile_dir.display().to_string().replace('\\', "/"),
    ))
    .unwrap();
    assert_ok!(config.validate());

    let profiles = JsonProfileStore::new(&config.profiles.path);
    profiles
        .update_allergy_profile("dana", &AllergyProfile::from_active([AllergenTag::Peanuts]))
        .await
        .unwrap();

    Fixture {
        _dir: dir,
        image_path,
        profiles,
        config,
    }
}

fn engine(
    fixture: &Fixture,
    reporter: RecordingReporter,
) -> ScanEngine<JsonProfileStore, FileImageSource, VisionTextExtractor, HttpTranslator, RecordingReporter>
{
    let pipeline = ScanPipeline::new(
        FileImageSource::new(&fixture.image_path),
        VisionTextExtractor::from_config(&fixture.config.ocr).unwrap(),
        HttpTranslator::from_config(&fixture.config.translation).unwrap(),
        reporter,
    )
    .with_settings(fixture.config.scan_settings());
    ScanEngine::new(fixture.profiles.clone(), pipeline)
}

fn ocr_returns<'a>(server: &'a MockServer, text: &str) -> httpmock::Mock<'a> {
    let body = serde_json::json!({
        "responses": [{ "fullTextAnnotation": { "text": text } }]
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/images:annotate")
            .query_param("key", "vision-key")
            .body_contains("TEXT_DETECTION");
        then.status(200).json_body(body);
    })
}

fn translation_echoes<'a>(server: &'a MockServer, text: &str) -> httpmock::Mock<'a> {
    let body = serde_json::json!({
        "data": { "translations": [{ "translatedText": text }] }
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/language/translate/v2")
            .query_param("key", "translate-key");
        then.status(200).json_body(body);
    })
}

#[tokio::test]
async fn test_peanut_label_is_unsafe() {
    let server = MockServer::start();
    let ocr = ocr_returns(&server, "Contains: Peanuts, Soy Lecithin");
    let translate = translation_echoes(&server, "Contains: Peanuts, Soy Lecithin");
    let fixture = fixture(&server, 15).await;
    let reporter = RecordingReporter::default();

    let outcome = engine(&fixture, reporter.clone())
        .run_for_user("dana")
        .await
        .unwrap();

    ocr.assert();
    translate.assert();
    let expected = Verdict::Unsafe {
        matched: vec![AllergenTag::Peanuts],
    };
    assert_eq!(outcome.verdict(), Some(&expected));
    assert_eq!(*reporter.verdicts.lock().unwrap(), vec![expected]);
    assert!(reporter.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_foreign_label_matches_after_translation() {
    let server = MockServer::start();
    ocr_returns(&server, "Zutaten: Weizenmehl, Erdnüsse");
    translation_echoes(&server, "Ingredients: wheat flour, peanuts");
    let fixture = fixture(&server, 15).await;

    let outcome = engine(&fixture, RecordingReporter::default())
        .run_for_user("dana")
        .await
        .unwrap();

    match outcome {
        ScanOutcome::Completed { attempt, verdict } => {
            assert_eq!(attempt.raw_text.as_deref(), Some("Zutaten: Weizenmehl, Erdnüsse"));
            assert_eq!(
                attempt.normalized_text.as_deref(),
                Some("Ingredients: wheat flour, peanuts")
            );
            assert!(!attempt.translation_degraded);
            assert_eq!(verdict.matched(), &[AllergenTag::Peanuts]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_no_text_detected_is_safe() {
    let server = MockServer::start();
    let ocr = server.mock(|when, then| {
        when.method(POST).path("/v1/images:annotate");
        then.status(200).json_body(serde_json::json!({ "responses": [{}] }));
    });
    let translate = translation_echoes(&server, "unused");
    let fixture = fixture(&server, 15).await;

    let outcome = engine(&fixture, RecordingReporter::default())
        .run_for_user("dana")
        .await
        .unwrap();

    ocr.assert();
    assert_eq!(translate.hits(), 0);
    assert_eq!(outcome.verdict(), Some(&Verdict::Safe));
}

#[tokio::test]
async fn test_ocr_server_error_fails_scan() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/images:annotate");
        then.status(500).json_body(serde_json::json!({
            "error": { "code": 500, "message": "Internal error encountered." }
        }));
    });
    let translate = translation_echoes(&server, "unused");
    let fixture = fixture(&server, 15).await;
    let reporter = RecordingReporter::default();
    let engine = engine(&fixture, reporter.clone());

    let outcome = engine.run_for_user("dana").await.unwrap();

    assert!(matches!(
        outcome,
        ScanOutcome::Failed(ErrorKind::ServiceError { code: 500, .. })
    ));
    assert_eq!(translate.hits(), 0);
    assert!(reporter.verdicts.lock().unwrap().is_empty());
    assert_eq!(reporter.errors.lock().unwrap().len(), 1);
    assert_eq!(engine.pipeline().state(), ScanState::Idle);
}

#[tokio::test]
async fn test_translation_outage_falls_back_to_ocr_text() {
    let server = MockServer::start();
    ocr_returns(&server, "may contain traces of PEANUTS");
    let translate = server.mock(|when, then| {
        when.method(POST).path("/language/translate/v2");
        then.status(503).body("Service Unavailable");
    });
    let fixture = fixture(&server, 15).await;

    let outcome = engine(&fixture, RecordingReporter::default())
        .run_for_user("dana")
        .await
        .unwrap();

    translate.assert();
    match outcome {
        ScanOutcome::Completed { attempt, verdict } => {
            assert!(attempt.translation_degraded);
            assert_eq!(verdict.matched(), &[AllergenTag::Peanuts]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_translation_still_matches_ocr_text() {
    let server = MockServer::start();
    ocr_returns(&server, "Erdnüsse, peanuts");
    translation_echoes(&server, "");
    let fixture = fixture(&server, 15).await;

    let outcome = engine(&fixture, RecordingReporter::default())
        .run_for_user("dana")
        .await
        .unwrap();

    match outcome {
        ScanOutcome::Completed { attempt, verdict } => {
            assert!(attempt.translation_degraded);
            assert_eq!(verdict.matched(), &[AllergenTag::Peanuts]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_ocr_times_out() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/images:annotate");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(serde_json::json!({ "responses": [{}] }));
    });
    let fixture = fixture(&server, 1).await;

    let outcome = engine(&fixture, RecordingReporter::default())
        .run_for_user("dana")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        ScanOutcome::Failed(ErrorKind::TimeoutError { .. })
    ));
}

#[tokio::test]
async fn test_repeated_scans_are_deterministic() {
    let server = MockServer::start();
    let ocr = ocr_returns(&server, "Milk chocolate with peanuts");
    translation_echoes(&server, "Milk chocolate with peanuts");
    let fixture = fixture(&server, 15).await;
    let engine = engine(&fixture, RecordingReporter::default());

    let first = engine.run_for_user("dana").await.unwrap();
    let second = engine.run_for_user("dana").await.unwrap();

    assert_eq!(ocr.hits(), 2);
    assert_eq!(first.verdict(), second.verdict());
}

#[tokio::test]
async fn test_profile_update_changes_verdict() {
    let server = MockServer::start();
    ocr_returns(&server, "Skimmed milk powder, sugar");
    translation_echoes(&server, "Skimmed milk powder, sugar");
    let fixture = fixture(&server, 15).await;
    let engine = engine(&fixture, RecordingReporter::default());

    let before = engine.run_for_user("dana").await.unwrap();
    assert_eq!(before.verdict(), Some(&Verdict::Safe));

    let mut profile = fixture.profiles.get_allergy_profile("dana").await.unwrap();
    profile.toggle(AllergenTag::Milk);
    fixture
        .profiles
        .update_allergy_profile("dana", &profile)
        .await
        .unwrap();

    let after = engine.run_for_user("dana").await.unwrap();
    assert_eq!(after.verdict().unwrap().matched(), &[AllergenTag::Milk]);
}

#[tokio::test]
async fn test_unknown_user_never_calls_ocr() {
    let server = MockServer::start();
    let ocr = ocr_returns(&server, "milk");
    let fixture = fixture(&server, 15).await;

    assert_err!(
        engine(&fixture, RecordingReporter::default())
            .run_for_user("stranger")
            .await
    );
    assert_eq!(ocr.hits(), 0);
}
