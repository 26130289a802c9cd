//! Voice Server Core
//!
//! Application state and the Axum router

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::core::error::{Result, TtsError};
use crate::engine::SpeechBackend;
use crate::server::config::ServerConfig;
use crate::server::middleware::{performance_monitor, MetricsState};
use crate::server::routes;
use crate::server::types::{EndpointStats, ServerStats};
use crate::text::TextTokenizer;
use crate::voice::{CustomVoiceStore, PromptCache};

/// Server state shared across handlers
pub struct ServerState {
    pub config: ServerConfig,
    /// Model runtime
    pub backend: Arc<dyn SpeechBackend>,
    /// Volatile clone prompts
    pub prompts: PromptCache,
    /// Persistent custom voices
    pub voices: CustomVoiceStore,
    pub tokenizer: Option<TextTokenizer>,
    pub metrics: Arc<MetricsState>,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl ServerState {
    /// Build state with the backend named in the configuration
    pub fn new(config: ServerConfig) -> Result<Self> {
        let backend = config.backend.build()?;
        Self::with_backend(config, backend)
    }

    /// Build state around an existing backend
    pub fn with_backend(config: ServerConfig, backend: Arc<dyn SpeechBackend>) -> Result<Self> {
        config.validate()?;

        let voices = CustomVoiceStore::open(
            &config.storage.voices_dir,
            config.limits.max_description_chars,
        )?;
        info!(
            "Custom voice store at {} ({} voices)",
            voices.root().display(),
            voices.len()
        );

        let tokenizer = match &config.tokenizer_path {
            Some(path) => match TextTokenizer::load(path) {
                Ok(tokenizer) => Some(tokenizer),
                Err(e) => {
                    warn!("Tokenizer unavailable: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            metrics: Arc::new(MetricsState::new(config.logging.access_log)),
            backend,
            prompts: PromptCache::new(),
            voices,
            tokenizer,
            config,
            start_time: Instant::now(),
        })
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get server statistics
    pub async fn get_stats(&self) -> ServerStats {
        let metrics = self.metrics.get_metrics().await;
        let summary = metrics.summary();
        let endpoints = metrics
            .requests_by_endpoint
            .iter()
            .map(|(endpoint, &requests)| {
                let stats = EndpointStats {
                    requests,
                    avg_time_ms: metrics.avg_time_by_endpoint(endpoint),
                };
                (endpoint.clone(), stats)
            })
            .collect();

        ServerStats {
            total_requests: summary.total_requests,
            successful_requests: summary.successful_requests,
            failed_requests: summary.failed_requests,
            avg_processing_time_ms: summary.avg_processing_time_ms,
            success_rate: summary.success_rate,
            uptime: self.uptime().as_secs(),
            endpoints,
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let request_id = axum::http::HeaderName::from_static("x-request-id");
    let body_limit = state.config.limits.max_body_bytes;
    let metrics = Arc::clone(&state.metrics);

    Router::new()
        // Health check
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/languages", get(routes::health::languages))

        // Single utterance synthesis
        .route("/design", post(routes::synthesis::design))
        .route("/clone", post(routes::synthesis::clone))
        .route("/preset", post(routes::synthesis::preset))
        .route("/preset/instruct", post(routes::synthesis::preset_instruct))

        // Clone prompts
        .route("/clone/prompt", post(routes::prompts::create_prompt))
        .route("/clone/prompts", get(routes::prompts::list_prompts))
        .route("/clone/prompts/:prompt_id", delete(routes::prompts::delete_prompt))

        // Voice management
        .route("/voices", get(routes::voices::list_voices))
        .route("/voices/custom", post(routes::voices::create_voice))
        .route(
            "/voices/custom/:name",
            get(routes::voices::get_voice).delete(routes::voices::delete_voice),
        )

        // Batch synthesis
        .route("/batch/preset", post(routes::batch::batch_preset))
        .route("/batch/design", post(routes::batch::batch_design))
        .route("/batch/clone", post(routes::batch::batch_clone))

        // Models
        .route("/models/status", get(routes::models::status))
        .route("/models/preload", post(routes::models::preload))

        // Tokenizer
        .route("/tokenizer/encode", post(routes::tokenizer::encode))
        .route("/tokenizer/decode", post(routes::tokenizer::decode))

        // Server stats
        .route("/api/v1/stats", get(routes::stats::get_stats))

        // MCP tool catalogue
        .route("/mcp/docs", get(routes::mcp::docs))

        .with_state(state)
        // Middleware
        .layer(middleware::from_fn_with_state(metrics, performance_monitor))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors)
}

/// Voice API server
pub struct TtsServer {
    state: Arc<ServerState>,
}

impl TtsServer {
    pub fn new(config: ServerConfig) -> Result<Self> {
        Ok(Self {
            state: Arc::new(ServerState::new(config)?),
        })
    }

    /// Run until the listener fails
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address();
        let router = create_router(Arc::clone(&self.state));

        info!(
            "Starting voice server on {} (backend: {}, device: {})",
            addr,
            self.state.backend.name(),
            self.state.backend.device()
        );

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| TtsError::Io {
            message: format!("cannot bind {}: {}", addr, e),
            path: None,
        })?;
        axum::serve(listener, router).await?;

        Ok(())
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }
}
