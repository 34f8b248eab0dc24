use async_openai::{config::OpenAIConfig, Client as OpenAiClient};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicecast_backend::controllers::{health::HealthController, jobs::JobsController};
use voicecast_backend::domain::admission::AdmissionService;
use voicecast_backend::domain::auth::JwtManager;
use voicecast_backend::domain::job::{JobProcessor, TextSources, WorkerPool};
use voicecast_backend::domain::rate_limit::{RateLimiter, SystemClock};
use voicecast_backend::infrastructure::audio::FfmpegAudioAssembler;
use voicecast_backend::infrastructure::config::{Config, LogFormat, TtsProvider};
use voicecast_backend::infrastructure::db::{check_connection, create_pool};
use voicecast_backend::infrastructure::http::{create_router, start_http_server};
use voicecast_backend::infrastructure::queue::JobQueue;
use voicecast_backend::infrastructure::repositories::{
    OpenAiTextEnhancer, OpenAiTranscriber, OpenAiTtsRepository, PgPreferencesRepository,
    PollyTtsRepository, RetryPolicy, RetryingTtsRepository, TtsRepository,
};
use voicecast_backend::infrastructure::store::RedisStore;
use voicecast_backend::infrastructure::telegram::{
    TelegramClient, TelegramDocumentExtractor, TelegramStatusReporter,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting VoiceCast Backend on {}:{}",
        config.host,
        config.port
    );

    // Preferences database
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");
    let pool = Arc::new(pool);

    // Shared store: rate-limit counters and the job queue
    let store = Arc::new(RedisStore::connect(&config.redis_url).await?);
    tracing::info!("Shared store connected");

    // Shared by the OpenAI speech provider and Telegram: every call is bounded
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .connect_timeout(config.http_connect_timeout())
        .build()?;

    // Synthesis provider, always behind the retry wrapper
    let provider: Arc<dyn TtsRepository> = match config.tts_provider {
        TtsProvider::OpenAi => Arc::new(OpenAiTtsRepository::new(
            http_client.clone(),
            config.openai_api_key.clone(),
            config.openai_tts_model.clone(),
        )),
        TtsProvider::Polly => {
            tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            Arc::new(PollyTtsRepository::new(Arc::new(
                aws_sdk_polly::Client::new(&aws_config),
            )))
        }
    };
    tracing::info!(provider = provider.name(), "Synthesis provider selected");

    let tts = Arc::new(RetryingTtsRepository::new(
        provider,
        RetryPolicy {
            max_attempts: config.synthesis_max_attempts,
            attempt_timeout: config.synthesis_timeout(),
            ..RetryPolicy::default()
        },
    ));

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Transport and text sources
    let telegram = Arc::new(TelegramClient::new(
        http_client.clone(),
        config.telegram_bot_token.clone(),
    ));
    let reporter = Arc::new(TelegramStatusReporter::new(telegram));

    let openai = Arc::new(OpenAiClient::with_config(
        OpenAIConfig::new().with_api_key(config.openai_api_key.clone()),
    ));
    let sources = TextSources {
        enhancer: Arc::new(OpenAiTextEnhancer::new(
            openai.clone(),
            config.openai_enhance_model.clone(),
        )),
        extractor: Arc::new(TelegramDocumentExtractor::new(reporter.clone())),
        transcriber: Arc::new(OpenAiTranscriber::new(
            openai,
            reporter.clone(),
            config.openai_transcribe_model.clone(),
        )),
    };

    // 2. Core services
    let rate_limiter = Arc::new(RateLimiter::new(
        store.clone(),
        config.rate_limits(),
        Arc::new(SystemClock),
    ));
    let queue = Arc::new(JobQueue::new(store.clone(), config.queue_name.clone()));
    let assembler = Arc::new(FfmpegAudioAssembler::new(
        config.ffmpeg_path.clone(),
        config.ffmpeg_timeout(),
    ));

    let processor = Arc::new(JobProcessor::new(
        tts,
        assembler,
        reporter.clone(),
        sources,
        rate_limiter.clone(),
        config.chunk_max_chars,
        config.source_timeout(),
    ));

    let admission = Arc::new(AdmissionService::new(
        rate_limiter,
        Arc::new(PgPreferencesRepository::new(pool.clone())),
        reporter,
        queue.clone(),
        config.max_text_chars,
    ));

    // 3. Workers: put back anything a previous process left half-done
    queue.recover_in_flight().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pool_handle = Arc::new(WorkerPool::new(
        queue.clone(),
        processor,
        config.worker_concurrency,
        config.queue_poll_timeout(),
    ));
    let workers = pool_handle.spawn(shutdown_rx);

    // 4. Controllers and HTTP
    let jwt_manager = Arc::new(JwtManager::new(config.jwt_secret.clone()));
    let health_controller = Arc::new(HealthController::new(store, queue, Some(pool)));
    let jobs_controller = Arc::new(JobsController::new(admission));
    let app = create_router(jwt_manager, health_controller, jobs_controller);

    start_http_server(&config, app, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
    })
    .await?;

    // Let every worker finish the job it holds
    let _ = shutdown_tx.send(true);
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Worker task ended abnormally");
        }
    }
    tracing::info!("Workers stopped");

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicecast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicecast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
