/// End-to-end tests: capture client against a live relay backed by the mock face service
use capture_client::{
    CaptureExit, CaptureLoop, CaptureState, ClientError, DirectoryCamera, FrameEncoder,
    HttpRelayClient, RelayApi, Renderer,
};
use common::analysis::{AnalysisResult, IdentityMatch};
use face_relay::{api, Analyzer, MockFaceService, RelayState, SessionGate, SessionStore};
use image::{Rgb, RgbImage};
use reqwest::Url;
use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

const PASSWORD: &str = "e2e-secret";

#[derive(Default)]
struct RecordingRenderer {
    results: Mutex<Vec<AnalysisResult>>,
    errors: Mutex<Vec<String>>,
    placeholders: Mutex<usize>,
}

impl RecordingRenderer {
    fn results(&self) -> Vec<AnalysisResult> {
        self.results.lock().unwrap().clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn placeholders(&self) -> usize {
        *self.placeholders.lock().unwrap()
    }
}

impl Renderer for RecordingRenderer {
    fn render_result(&self, result: &AnalysisResult) {
        self.results.lock().unwrap().push(result.clone());
    }

    fn render_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn render_placeholder(&self) {
        *self.placeholders.lock().unwrap() += 1;
    }
}

/// Start a relay on an ephemeral port and return its base URL
async fn spawn_relay(service: Arc<MockFaceService>, interval_seconds: f64) -> (Url, RelayState) {
    let gate = SessionGate::new(PASSWORD, Arc::new(SessionStore::new()));
    let analyzer = Analyzer::new(service, "e2e-collection", 80.0);
    let state = RelayState::new(gate, analyzer, interval_seconds, 10 * 1024 * 1024);
    let app = api::router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    (url, state)
}

fn write_frames(dir: &Path, count: u8) {
    for i in 0..count {
        RgbImage::from_pixel(800, 600, Rgb([40 * i, 100, 160]))
            .save(dir.join(format!("frame-{:02}.png", i)))
            .unwrap();
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_client_reads_relay_config() {
    let (url, _state) = spawn_relay(Arc::new(MockFaceService::new()), 0.25).await;
    let client = HttpRelayClient::new(url).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "OK");
    assert_eq!(client.capture_interval().await, Duration::from_millis(250));
}

#[tokio::test]
async fn test_unreachable_relay_falls_back_to_default_interval() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpRelayClient::new(Url::parse(&format!("http://{}", addr)).unwrap()).unwrap();

    assert_eq!(client.capture_interval().await, Duration::from_millis(1500));
}

#[tokio::test]
async fn test_oversized_advertised_interval_falls_back_to_default() {
    let (url, _state) = spawn_relay(Arc::new(MockFaceService::new()), 1e20).await;
    let client = HttpRelayClient::new(url).unwrap();

    assert_eq!(client.capture_interval().await, Duration::from_millis(1500));
}

#[tokio::test]
async fn test_login_rejection_surfaces_message() {
    let (url, _state) = spawn_relay(Arc::new(MockFaceService::new()), 1.5).await;
    let client = HttpRelayClient::new(url).unwrap();

    match client.login("wrong").await {
        Err(ClientError::LoginRejected(message)) => assert_eq!(message, "Invalid password"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_analysis_failure_maps_to_server_error() {
    let service = Arc::new(MockFaceService::new().failing_detection("throttled"));
    let (url, _state) = spawn_relay(service, 1.5).await;
    let client = HttpRelayClient::new(url).unwrap();
    let session = client.login(PASSWORD).await.unwrap();

    let image = FrameEncoder::default()
        .encode(&image::DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
        .unwrap();
    match client.analyze(&session, &image).await {
        Err(ClientError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("Failed to analyze face"));
            assert!(message.contains("throttled"));
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_capture_loop_streams_frames_until_stopped() {
    let service = Arc::new(MockFaceService::new().with_identity(IdentityMatch {
        face_id: Some("face-7".to_string()),
        external_image_id: Some("bob".to_string()),
        similarity: 93.5,
    }));
    let (url, _state) = spawn_relay(service.clone(), 0.1).await;
    let frames = tempfile::tempdir().unwrap();
    write_frames(frames.path(), 3);

    let client = Arc::new(HttpRelayClient::new(url).unwrap());
    let session = client.login(PASSWORD).await.unwrap();
    let interval = client.capture_interval().await;
    let renderer = Arc::new(RecordingRenderer::default());

    let mut capture = CaptureLoop::new(
        Arc::new(DirectoryCamera::new(frames.path())),
        client.clone(),
        renderer.clone(),
        FrameEncoder::default(),
        interval,
        session,
    );
    capture.start().unwrap();
    assert_eq!(capture.state(), CaptureState::Capturing);

    wait_until(|| renderer.results().len() >= 3).await;

    assert_eq!(capture.stop().await, CaptureExit::Stopped);
    assert_eq!(capture.state(), CaptureState::Idle);
    assert_eq!(renderer.placeholders(), 1);
    assert!(renderer.errors().is_empty());

    let results = renderer.results();
    assert!(results.iter().all(|r| r.face_detected));
    assert_eq!(results[0].identity.as_ref().unwrap().label(), "bob");

    // frames were downscaled and JPEG-encoded before upload
    let search = service.last_search().await.unwrap();
    assert!(search.image_len > 0);
    assert_eq!(search.collection_id, "e2e-collection");

    let calls = service.detect_calls();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(service.detect_calls(), calls);
}

#[tokio::test]
async fn test_slow_relay_receives_overlapping_submissions() {
    let service = Arc::new(MockFaceService::new().with_latency(Duration::from_secs(2)));
    let (url, _state) = spawn_relay(service.clone(), 0.1).await;
    let frames = tempfile::tempdir().unwrap();
    write_frames(frames.path(), 2);

    let client = Arc::new(HttpRelayClient::new(url).unwrap());
    let session = client.login(PASSWORD).await.unwrap();
    let renderer = Arc::new(RecordingRenderer::default());

    let mut capture = CaptureLoop::new(
        Arc::new(DirectoryCamera::new(frames.path())),
        client,
        renderer.clone(),
        FrameEncoder::default(),
        Duration::from_millis(100),
        session,
    );
    capture.start().unwrap();

    // every detect call takes 2s, so these are all in flight at once
    wait_until(|| service.detect_calls() >= 3).await;
    assert!(renderer.results().is_empty());

    assert_eq!(capture.stop().await, CaptureExit::Stopped);
    let calls = service.detect_calls();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(service.detect_calls(), calls);
    assert!(renderer.results().is_empty());
}

#[tokio::test]
async fn test_relay_restart_expires_session_and_relogin_recovers() {
    let service = Arc::new(MockFaceService::new());
    let (url, state) = spawn_relay(service.clone(), 0.1).await;
    let frames = tempfile::tempdir().unwrap();
    write_frames(frames.path(), 1);

    let client = Arc::new(HttpRelayClient::new(url).unwrap());
    let camera = Arc::new(DirectoryCamera::new(frames.path()));
    let renderer = Arc::new(RecordingRenderer::default());
    let new_loop = |session: String| {
        CaptureLoop::new(
            camera.clone(),
            client.clone(),
            renderer.clone(),
            FrameEncoder::default(),
            Duration::from_millis(100),
            session,
        )
    };

    let mut capture = new_loop(client.login(PASSWORD).await.unwrap());
    capture.start().unwrap();
    wait_until(|| !renderer.results().is_empty()).await;

    // sessions live only in memory; a restart forgets them
    state.shutdown().await;

    tokio::time::timeout(Duration::from_secs(10), capture.finished())
        .await
        .unwrap();
    assert_eq!(capture.stop().await, CaptureExit::SessionExpired);
    assert!(renderer
        .errors()
        .iter()
        .any(|e| e.contains("Session expired")));

    let before = renderer.results().len();
    let mut capture = new_loop(client.login(PASSWORD).await.unwrap());
    capture.start().unwrap();
    wait_until(|| renderer.results().len() > before).await;
    assert_eq!(capture.stop().await, CaptureExit::Stopped);
}

#[tokio::test]
async fn test_missing_frames_directory_keeps_loop_idle() {
    let (url, _state) = spawn_relay(Arc::new(MockFaceService::new()), 0.1).await;
    let client = Arc::new(HttpRelayClient::new(url).unwrap());
    let session = client.login(PASSWORD).await.unwrap();
    let renderer = Arc::new(RecordingRenderer::default());

    let mut capture = CaptureLoop::new(
        Arc::new(DirectoryCamera::new("/nonexistent/frames")),
        client,
        renderer.clone(),
        FrameEncoder::default(),
        Duration::from_millis(100),
        session,
    );

    assert!(matches!(capture.start(), Err(ClientError::Camera(_))));
    assert_eq!(capture.state(), CaptureState::Idle);
    assert_eq!(renderer.errors().len(), 1);
}
