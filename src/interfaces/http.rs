use crate::application::webhook::{WebhookReply, WebhookService};
use crate::config::WEBHOOK_PATH;
use crate::domain::notification::FieldMap;
use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use std::sync::Arc;
use tracing::info;
use url::form_urlencoded;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the callback router. A single route accepts every method: the
/// gateway is known to deliver both GET query strings and POST bodies.
pub fn router(service: Arc<WebhookService>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, any(webhook_handler))
        .with_state(service)
}

async fn webhook_handler(
    State(service): State<Arc<WebhookService>>,
    request: Request,
) -> Response {
    let fields = match extract_fields(request).await {
        Ok(fields) => fields,
        Err(reply) => return reply.into_response(),
    };
    info!(?fields, "incoming gateway callback");
    service.handle(&fields).await.into_response()
}

/// Assembles the raw field map from wherever the gateway put it: the query
/// string on GET, a JSON or urlencoded form body on POST.
async fn extract_fields(request: Request) -> Result<FieldMap, WebhookReply> {
    if request.method() == Method::POST {
        let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| WebhookReply::BadRequest)?;
        Ok(parse_body(&body))
    } else {
        let query = request.uri().query().unwrap_or("");
        Ok(parse_urlencoded(query.as_bytes()))
    }
}

fn parse_body(body: &[u8]) -> FieldMap {
    if let Ok(object) = serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(body) {
        return object
            .into_iter()
            .filter_map(|(key, value)| value_to_string(value).map(|v| (key, v)))
            .collect();
    }
    parse_urlencoded(body)
}

fn parse_urlencoded(input: &[u8]) -> FieldMap {
    form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

// JSON values arrive as strings, numbers or booleans depending on the
// gateway deployment; all are flattened to their string form.
fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            WebhookReply::Accepted => (StatusCode::OK, "OK"),
            WebhookReply::Alive => (StatusCode::OK, "Bot is running"),
            WebhookReply::BadRequest => (StatusCode::BAD_REQUEST, "Bad Request"),
            WebhookReply::SignError => (StatusCode::FORBIDDEN, "Sign Error"),
            WebhookReply::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Error"),
        };
        (status, body).into_response()
    }
}
