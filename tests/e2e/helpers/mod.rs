use std::sync::Arc;
use std::time::Duration;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use voicecast_backend::controllers::{health::HealthController, jobs::JobsController};
use voicecast_backend::domain::admission::AdmissionService;
use voicecast_backend::domain::auth::JwtManager;
use voicecast_backend::domain::job::{JobProcessor, TextSources, WorkerPool};
use voicecast_backend::domain::rate_limit::{RateLimiter, RateLimits};
use voicecast_backend::infrastructure::http::create_router;
use voicecast_backend::infrastructure::queue::JobQueue;
use voicecast_backend::infrastructure::store::MemoryStore;
use voicecast_backend::infrastructure::telegram::TelegramDocumentExtractor;

pub mod api_client;

use api_client::TestClient;
use fakes::{
    CannedTranscriber, ConcatAssembler, EchoTts, FixedClock, FixedPreferences, RecordingReporter,
    ShoutingEnhancer,
};

pub const JWT_SECRET: &str = "test-jwt-secret-key-for-testing-only";
pub const QUEUE_NAME: &str = "test:jobs";
pub const MAX_TEXT_CHARS: usize = 30_000;

/// Full application on a random port with in-memory store and fake providers.
///
/// Workers are not started until [`TestContext::start_workers`] so tests can
/// inspect the queue before anything is consumed.
pub struct TestContext {
    pub client: TestClient,
    pub store: Arc<MemoryStore>,
    pub queue: Arc<JobQueue>,
    pub reporter: Arc<RecordingReporter>,
    pub tts: Arc<EchoTts>,
    jwt: Arc<JwtManager>,
    processor: Arc<JobProcessor>,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl TestContext {
    pub fn token_for(&self, owner: &str) -> String {
        self.jwt
            .generate_token(&owner.into(), chrono::Duration::hours(1))
            .unwrap()
    }

    pub fn start_workers(&mut self, concurrency: usize) {
        let pool = Arc::new(WorkerPool::new(
            self.queue.clone(),
            self.processor.clone(),
            concurrency,
            Duration::from_millis(50),
        ));
        self.workers = pool.spawn(self.shutdown.subscribe());
    }

    /// Poll until `done` holds or the deadline passes
    pub async fn wait_until(&self, mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if done() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        done()
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let store = Arc::new(MemoryStore::new());
            let reporter = Arc::new(RecordingReporter::default());
            let tts = Arc::new(EchoTts::default());
            let queue = Arc::new(JobQueue::new(store.clone(), QUEUE_NAME));
            let rate_limiter = Arc::new(RateLimiter::new(
                store.clone(),
                RateLimits::default(),
                Arc::new(FixedClock),
            ));

            let processor = Arc::new(JobProcessor::new(
                tts.clone(),
                Arc::new(ConcatAssembler),
                reporter.clone(),
                TextSources {
                    enhancer: Arc::new(ShoutingEnhancer),
                    extractor: Arc::new(TelegramDocumentExtractor::new(reporter.clone())),
                    transcriber: Arc::new(CannedTranscriber),
                },
                rate_limiter.clone(),
                4000,
                Duration::from_secs(10),
            ));

            let admission = Arc::new(AdmissionService::new(
                rate_limiter,
                Arc::new(FixedPreferences),
                reporter.clone(),
                queue.clone(),
                MAX_TEXT_CHARS,
            ));

            let jwt = Arc::new(JwtManager::new(JWT_SECRET.to_string()));
            let app = create_router(
                jwt.clone(),
                Arc::new(HealthController::new(store.clone(), queue.clone(), None)),
                Arc::new(JobsController::new(admission)),
            );

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let (shutdown, _) = watch::channel(false);

            Self {
                client: TestClient::new(&base_url),
                store,
                queue,
                reporter,
                tts,
                jwt,
                processor,
                shutdown,
                workers: Vec::new(),
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            let _ = self.shutdown.send(true);
            for worker in self.workers {
                let _ = worker.await;
            }
        }
    }
}
