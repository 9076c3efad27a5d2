use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, Method, Uri},
    middleware::Next,
    response::Response,
};
use opentelemetry::{
    trace::{Span, SpanKind, Status, Tracer},
    KeyValue,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};

use crate::telemetry::{counters, get_tracer};

/// Per-request span, request id, access log line and request counter.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let tracer = get_tracer("http-server");
    let mut span = tracer
        .span_builder(format!("{} {}", method, route))
        .with_kind(SpanKind::Server)
        .start(&tracer);
    set_span_attributes(&mut span, &method, &uri, &route, request.headers());

    let request_id = uuid::Uuid::now_v7();
    let tracing_span = info_span!(
        "http_request",
        method = %method,
        route = %route,
        request_id = %request_id,
    );

    let start_time = Instant::now();
    let response = next.run(request).instrument(tracing_span.clone()).await;
    let elapsed = start_time.elapsed();
    let status_code = response.status().as_u16();

    span.set_attribute(KeyValue::new("http.status_code", i64::from(status_code)));
    span.set_attribute(KeyValue::new("http.response_time_ms", elapsed.as_millis() as i64));
    if status_code >= 500 {
        span.set_status(Status::Error {
            description: format!("HTTP {}", status_code).into(),
        });
    } else {
        span.set_status(Status::Ok);
    }
    span.end();

    counters::HTTP_REQUESTS.add(1);
    tracing_span.in_scope(|| {
        info!(
            status = status_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request finished"
        )
    });

    response
}

fn set_span_attributes(
    span: &mut impl Span,
    method: &Method,
    uri: &Uri,
    route: &str,
    headers: &HeaderMap,
) {
    span.set_attribute(KeyValue::new("http.method", method.to_string()));
    span.set_attribute(KeyValue::new("http.url", uri.to_string()));
    span.set_attribute(KeyValue::new("http.route", route.to_string()));

    if let Some(user_agent) = headers.get("user-agent").and_then(|ua| ua.to_str().ok()) {
        span.set_attribute(KeyValue::new("http.user_agent", user_agent.to_string()));
    }
    if let Some(forwarded_for) = headers.get("x-forwarded-for").and_then(|xff| xff.to_str().ok()) {
        span.set_attribute(KeyValue::new("http.client_ip", forwarded_for.to_string()));
    }
}
