use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};

use super::DispatchMetrics;

// ============================================================================
// Metrics HTTP Endpoint
// ============================================================================

/// Serve `/metrics` and `/health` until the process exits.
///
/// The dispatcher itself is synchronous; run this on its own runtime or
/// thread so scraping never shares a thread with dispatch.
pub async fn start_metrics_server(
    metrics: Arc<DispatchMetrics>,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!(port, "📊 Serving dispatch metrics on /metrics");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics.clone()))
            .route("/metrics", web::get().to(scrape))
            .route("/health", web::get().to(health))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn scrape(metrics: web::Data<Arc<DispatchMetrics>>) -> impl Responder {
    let families = metrics.registry().gather();
    let mut body = Vec::new();
    match TextEncoder::new().encode(&families, &mut body) {
        Ok(()) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(error) => {
            tracing::error!(%error, "Metrics encoding failed");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "domain-dispatch"
    }))
}
