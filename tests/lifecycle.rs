//! End-to-end instance lifecycle scenarios against a mock worker, a mock
//! compute backend and the in-memory state store.

use diogenes::auth::AuthSystem;
use diogenes::compute::{ComputeBackend, LaunchedNode};
use diogenes::domain::{Instance, InstanceStatus, ModelConfig};
use diogenes::error::OrchestratorError;
use diogenes::orchestrator::clock::FakeClock;
use diogenes::orchestrator::{Orchestrator, OrchestratorSettings};
use diogenes::router::{RouteOutcome, Router};
use diogenes::server::routes::inference::proxy;
use diogenes::server::state::AppState;
use diogenes::store::{MemoryStateStore, StateStore};
use async_trait::async_trait;
use actix_web::{test as actix_test, web};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        poll_health_timeout_secs: 3,
        poll_health_interval_secs: 1,
        probe_timeout_secs: 1,
        worker_port: 80,
    }
}

struct RecordingBackend {
    worker_addr: String,
    launches: AtomicUsize,
    terminates: AtomicUsize,
}

impl RecordingBackend {
    fn new(worker_addr: String) -> Self {
        Self {
            worker_addr,
            launches: AtomicUsize::new(0),
            terminates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ComputeBackend for RecordingBackend {
    async fn launch(&self, _instance_type: &str, _vllm_args: &str) -> diogenes::error::Result<LaunchedNode> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let (ip, _port) = self.worker_addr.split_once(':').unwrap();
        Ok(LaunchedNode {
            provider_instance_id: "prov-1".to_string(),
            ip: ip.to_string(),
        })
    }

    async fn terminate(&self, _provider_instance_id: &str) -> diogenes::error::Result<()> {
        self.terminates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn seed_model(store: &Arc<MemoryStateStore>, idle_timeout: i64) {
    store
        .put_model_config(ModelConfig {
            name: "Qwen/Qwen3-32B".to_string(),
            instance_type: "g5.xlarge".to_string(),
            vllm_args: String::new(),
            idle_timeout: Some(idle_timeout),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn s1_cold_then_warm_then_reap() {
    let mock_worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_worker)
        .await;

    let store = Arc::new(MemoryStateStore::new());
    seed_model(&store, 1).await;

    let worker_addr = mock_worker.address().to_string();
    let backend = Arc::new(RecordingBackend::new(worker_addr));
    let mut settings = fast_settings();
    settings.worker_port = mock_worker.address().port();
    let clock = Arc::new(FakeClock::new(1_000));
    let orchestrator = Arc::new(Orchestrator::with_clock(
        store.clone(),
        backend.clone(),
        settings,
        clock.clone(),
    ));
    let router = Router::new(store.clone(), orchestrator.clone());

    match router.route("Qwen/Qwen3-32B").await.unwrap() {
        RouteOutcome::ColdStarting => {}
        RouteOutcome::Ready(_) => panic!("nothing should be ready on first request"),
    }

    let instance = orchestrator.scale_up("Qwen/Qwen3-32B").await.unwrap();
    assert_eq!(instance.status, InstanceStatus::Ready);
    assert_eq!(instance.instance_id, "model#Qwen/Qwen3-32B");

    match router.route("Qwen/Qwen3-32B").await.unwrap() {
        RouteOutcome::Ready(ready) => assert_eq!(ready.instance_id, "model#Qwen/Qwen3-32B"),
        RouteOutcome::ColdStarting => panic!("instance should be ready now"),
    }

    clock.advance(10);
    let reaped = orchestrator.scale_down().await.unwrap();
    assert_eq!(reaped, vec!["model#Qwen/Qwen3-32B".to_string()]);
    assert_eq!(backend.terminates.load(Ordering::SeqCst), 1);

    let final_state = store.get_instance("model#Qwen/Qwen3-32B").await.unwrap().unwrap();
    assert_eq!(final_state.status, InstanceStatus::Terminated);
}

#[tokio::test]
async fn s2_health_failure_terminates_the_slot() {
    let mock_worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_worker)
        .await;

    let store = Arc::new(MemoryStateStore::new());
    seed_model(&store, 300).await;

    let worker_addr = mock_worker.address().to_string();
    let backend = Arc::new(RecordingBackend::new(worker_addr));
    let mut settings = fast_settings();
    settings.worker_port = mock_worker.address().port();
    let orchestrator = Orchestrator::new(store.clone(), backend.clone(), settings);

    let instance = orchestrator.scale_up("Qwen/Qwen3-32B").await.unwrap();
    assert_eq!(instance.status, InstanceStatus::Terminated);
    assert_eq!(backend.terminates.load(Ordering::SeqCst), 1);

    let stored = store.get_instance("model#Qwen/Qwen3-32B").await.unwrap().unwrap();
    assert_eq!(stored.status, InstanceStatus::Terminated);
}

#[tokio::test]
async fn s3_concurrent_scale_up_launches_exactly_once() {
    let mock_worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_worker)
        .await;

    let store = Arc::new(MemoryStateStore::new());
    seed_model(&store, 300).await;

    let worker_addr = mock_worker.address().to_string();
    let backend = Arc::new(RecordingBackend::new(worker_addr));
    let mut settings = fast_settings();
    settings.worker_port = mock_worker.address().port();
    let orchestrator = Arc::new(Orchestrator::new(store.clone(), backend.clone(), settings));

    let a = orchestrator.clone();
    let b = orchestrator.clone();
    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { a.scale_up("Qwen/Qwen3-32B").await }),
        tokio::spawn(async move { b.scale_up("Qwen/Qwen3-32B").await }),
    );
    let ra = ra.unwrap().unwrap();
    let rb = rb.unwrap().unwrap();

    assert_eq!(ra.instance_id, "model#Qwen/Qwen3-32B");
    assert_eq!(rb.instance_id, "model#Qwen/Qwen3-32B");
    assert_eq!(backend.launches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn s4_api_key_lifecycle() {
    let store = Arc::new(MemoryStateStore::new());
    let auth = AuthSystem::new(store.clone());

    let issued = auth.create_key("a@example.com", "laptop", 1_000).await.unwrap();
    assert!(auth.validate_api_key(&issued.token, 1_100).await.is_ok());

    let keys = auth.list_keys("a@example.com").await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].last_used_at, 1_100);

    auth.delete_key("a@example.com", &issued.record.key_hash).await.unwrap();
    assert!(matches!(
        auth.validate_api_key(&issued.token, 1_200).await.unwrap_err(),
        OrchestratorError::Unauthorized
    ));
}

#[tokio::test]
async fn s5_cluster_state_reflects_every_model() {
    let store = Arc::new(MemoryStateStore::new());
    seed_model(&store, 300).await;
    store
        .put_model_config(ModelConfig {
            name: "other-model".to_string(),
            instance_type: "g5.2xlarge".to_string(),
            vllm_args: String::new(),
            idle_timeout: None,
        })
        .await
        .unwrap();

    let configs = store.list_model_configs().await.unwrap();
    assert_eq!(configs.len(), 2);

    let all_instances = store
        .list_instances(diogenes::store::InstanceFilter::default())
        .await
        .unwrap();
    assert!(all_instances.is_empty());
}

#[tokio::test]
async fn s6_proxy_transport_failure_leaves_the_instance_ready() {
    // A ready instance whose address nothing listens on: the proxy hop
    // itself fails, not the health gate (that already happened during
    // scaleUp). SPEC_FULL.md §8 S6 requires a 502 `bad_gateway`, the
    // instance staying `ready`, and `last_request_at` still getting bumped.
    let store = Arc::new(MemoryStateStore::new());
    seed_model(&store, 300).await;

    let mut ready = Instance::claim_placeholder("Qwen/Qwen3-32B", "g5.xlarge", 1_000);
    ready.status = InstanceStatus::Ready;
    ready.ip = Some("127.0.0.1".to_string());
    ready.last_request_at = 1_000;
    store.put_instance(ready).await.unwrap();

    let backend = Arc::new(RecordingBackend::new("127.0.0.1:1".to_string()));
    let mut settings = fast_settings();
    settings.worker_port = 1; // nothing listens here
    let orchestrator = Arc::new(Orchestrator::new(store.clone(), backend, settings.clone()));

    let mut config = diogenes::Config::default();
    config.orchestrator.worker_port = settings.worker_port;
    let state = web::Data::new(AppState::new(config, store.clone(), orchestrator));

    let req = actix_test::TestRequest::post()
        .uri("/v1/chat/completions")
        .to_http_request();
    let body = web::Bytes::from_static(br#"{"model":"Qwen/Qwen3-32B","messages":[]}"#);

    let err = proxy(state, req, body).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::UpstreamUnavailable(_)));
    assert_eq!(
        actix_web::ResponseError::status_code(&err),
        actix_web::http::StatusCode::BAD_GATEWAY
    );

    let stored = store.get_instance("model#Qwen/Qwen3-32B").await.unwrap().unwrap();
    assert_eq!(stored.status, InstanceStatus::Ready);
    assert!(
        stored.last_request_at > 1_000,
        "touch() should bump last_request_at to the current wall-clock time"
    );
}
