#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer};
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::{AppState, ShutdownReason};
use crate::service::health as health_report;

#[get("/healthz")]
pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status":"ok"}))
}

#[get("/status")]
pub async fn status(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.board.snapshot())
}

#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    let report = health_report(&data.board, &data.metrics);
    if report.status != "ok" {
        warn!(invariants_ok = report.invariants_ok, metrics_ok = report.metrics_ok, "health degraded");
    }
    HttpResponse::Ok().json(report)
}

#[get("/metrics")]
pub async fn scrape_metrics(data: web::Data<AppState>) -> HttpResponse {
    match data.metrics.encode_text() {
        Ok(buf) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buf),
        Err(e) => {
            error!(error=%format!("{e:#}"), "encode metrics failed");
            HttpResponse::InternalServerError().body("encode metrics failed")
        }
    }
}

#[post("/shutdown")]
pub async fn shutdown(data: web::Data<AppState>) -> HttpResponse {
    if data.shutdown.trigger(ShutdownReason::Requested) {
        info!("shutdown requested over http");
        HttpResponse::Accepted().json(json!({"status":"ok"}))
    } else {
        json_error(
            actix_web::http::StatusCode::CONFLICT,
            "shutdown already in progress",
        )
    }
}

pub fn serve(bind: &str, state: AppState) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .service(healthz)
            .service(status)
            .service(health)
            .service(scrape_metrics)
            .service(shutdown)
    })
    .workers(1)
    .disable_signals()
    .bind(bind)?
    .run();
    Ok(server)
}

fn json_error(code: actix_web::http::StatusCode, reason: &str) -> HttpResponse {
    HttpResponse::build(code).json(json!({"status":"error","reason":reason}))
}
