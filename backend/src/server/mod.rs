//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use ideaboard::Trace;
#[cfg(debug_assertions)]
use ideaboard::doc::ApiDoc;
use ideaboard::inbound::http::configure;
use ideaboard::inbound::http::health::{HealthState, live, ready};
use ideaboard::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Build the Prometheus middleware serving `/metrics`.
///
/// # Errors
/// Returns [`std::io::Error`] if the metric registry rejects the collectors.
#[cfg(feature = "metrics")]
fn make_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("ideaboard")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(format!("metrics registration failed: {e}")))
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] carrying the token secret, listener, and optional pool.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config);
    #[cfg(feature = "metrics")]
    let metrics = make_metrics()?;

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics.clone());

        app
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Smoke tests for the assembled application.

    use super::*;
    use std::net::SocketAddr;

    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::Duration;
    use ideaboard::domain::TRACE_ID_HEADER;
    use zeroize::Zeroizing;

    fn deps() -> AppDependencies {
        let config = ServerConfig::new(
            Zeroizing::new(vec![3; 32]),
            Duration::minutes(5),
            SocketAddr::from(([127, 0, 0, 1], 0)),
        );
        AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: build_http_state(&config),
        }
    }

    #[actix_web::test]
    async fn readiness_follows_health_state() {
        let deps = deps();
        let health = deps.health_state.clone();
        let app = test::init_service(build_app(deps)).await;

        let request = test::TestRequest::get().uri("/health/ready").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        health.mark_ready();
        let request = test::TestRequest::get().uri("/health/ready").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(TRACE_ID_HEADER));
    }

    #[actix_web::test]
    async fn api_routes_are_mounted() {
        let app = test::init_service(build_app(deps())).await;
        let request = test::TestRequest::get().uri("/users/").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], "not_found");
    }
}
