#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use actix_web::{test, App};
use dummy_workload::{
    health, healthz, scrape_metrics, shutdown, shutdown_channel, status, AppState, Metrics,
    ShutdownReason, SimulatorStatus, StatusBoard,
};

#[actix_web::test]
async fn status_metrics_and_shutdown() {
    let (trigger, listener) = shutdown_channel();
    let board = StatusBoard::new(SimulatorStatus {
        name: "http-test".into(),
        iteration: 4,
        memory_chunks: 1,
        max_chunks: 20,
        max_scratch_files: 10,
        ..SimulatorStatus::default()
    });
    let state = AppState {
        board,
        metrics: Metrics::new().unwrap(),
        shutdown: trigger,
    };
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .service(healthz)
            .service(status)
            .service(health)
            .service(scrape_metrics)
            .service(shutdown),
    )
    .await;

    // healthz
    let req = test::TestRequest::get().uri("/healthz").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // status snapshot
    let req = test::TestRequest::get().uri("/status").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "http-test");
    assert_eq!(body["iteration"], 4);
    assert_eq!(body["phase"], "RUNNING");

    // health report
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["invariants_ok"], true);

    // metrics scrape
    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let text = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&text).contains("workload_iterations_total"));

    // shutdown, then a second request conflicts
    let req = test::TestRequest::post().uri("/shutdown").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::ACCEPTED);
    assert_eq!(listener.reason(), Some(ShutdownReason::Requested));

    let req = test::TestRequest::post().uri("/shutdown").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CONFLICT);
}

#[actix_web::test]
async fn health_degrades_when_cap_exceeded() {
    let (trigger, _listener) = shutdown_channel();
    let board = StatusBoard::new(SimulatorStatus {
        memory_chunks: 5,
        max_chunks: 2,
        ..SimulatorStatus::default()
    });
    let state = AppState {
        board,
        metrics: Metrics::new().unwrap(),
        shutdown: trigger,
    };
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .service(health),
    )
    .await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["invariants_ok"], false);
}
