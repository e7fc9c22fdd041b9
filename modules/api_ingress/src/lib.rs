use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, routing::get, BoxError, Router};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder};

mod config;
pub mod error;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;
use error::AppError;

/// HTTP host: owns the listener, the shared middleware stack and the merged
/// OpenAPI document of every registered module.
pub struct ApiIngress {
    // Lock-free config using arc-swap for read-mostly access
    config: ArcSwap<ApiIngressConfig>,
    openapi: Mutex<OpenApi>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        let base = OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title("Issue Tracker API")
                    .version(env!("CARGO_PKG_VERSION"))
                    .build(),
            )
            .build();
        Self {
            config: ArcSwap::from_pointee(config),
            openapi: Mutex::new(base),
        }
    }

    /// Get the current configuration (cheap clone from ArcSwap)
    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Merge a module's OpenAPI document into the served one.
    pub fn register_openapi(&self, doc: OpenApi) {
        let mut merged = self.openapi.lock();
        let before = merged.paths.paths.len();
        merged.merge(doc);
        tracing::debug!(
            added = merged.paths.paths.len() - before,
            "Registered OpenAPI paths"
        );
    }

    pub fn openapi_json(&self) -> Result<serde_json::Value> {
        let doc = self.openapi.lock().clone();
        serde_json::to_value(doc).context("Failed to serialize OpenAPI document")
    }

    /// Build the HTTP router: host endpoints, module `routes`, then the middleware stack.
    pub fn build_router(&self, routes: Router) -> Result<Router> {
        let config = self.get_config();
        tracing::debug!("Building router");

        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .route("/healthz", get(web::healthz))
            .merge(routes);

        if config.enable_docs {
            let doc = Arc::new(self.openapi_json()?);
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let doc = doc.clone();
                        async move { web::openapi_response(&doc) }
                    }),
                )
                .route("/docs", get(web::serve_docs));
            tracing::info!("API docs enabled at /docs");
        }

        router = router.fallback(web::not_found);

        // Layers added later wrap the earlier ones. Outermost to innermost:
        // PropagateRequestId -> SetRequestId -> push_req_id_to_extensions -> Trace
        // -> BodyLimit -> DefaultBodyLimit -> CORS -> Timeout -> routes
        router = router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(config.request_timeout()),
        );

        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        // Extractors enforce their own limit too; keep both on the configured value.
        router = router.layer(DefaultBodyLimit::max(config.body_limit_bytes));
        router = router.layer(RequestBodyLimitLayer::new(config.body_limit_bytes));
        router = request_id::with_tracing(router);
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));

        let x_request_id = request_id::header();
        router = router.layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            request_id::MakeReqId,
        ));
        router = router.layer(PropagateRequestIdLayer::new(x_request_id));

        Ok(router)
    }

    /// Bind, report the bound address, serve until `cancel` fires.
    pub async fn serve(
        self: Arc<Self>,
        router: Router,
        cancel: CancellationToken,
        ready: Option<oneshot::Sender<SocketAddr>>,
    ) -> Result<()> {
        let cfg = self.get_config();
        let bind_addr = cfg
            .bind_addr
            .as_deref()
            .context("api_ingress.bind_addr is not configured")?;
        let addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{bind_addr}'"))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        let local = listener.local_addr()?;
        tracing::info!("HTTP server bound on {}", local);
        if let Some(tx) = ready {
            let _ = tx.send(local);
        }

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(anyhow::anyhow!(err))
    }
}
