use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What the server saw of an incoming request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub received: usize,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", get(echo).post(echo).put(echo))
        .route("/html", get(html))
        .route("/json/{value}", get(json_string))
        .route("/empty", get(empty_json))
        .route("/upload", post(upload))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn echo(headers: HeaderMap, body: String) -> Json<Echo> {
    let echo = Echo {
        accept: header_str(&headers, header::ACCEPT),
        content_type: header_str(&headers, header::CONTENT_TYPE),
        body,
    };
    tracing::info!(accept = ?echo.accept, len = echo.body.len(), "echo");
    Json(echo)
}

/// Valid JSON text served as HTML, so clients must not decode it.
async fn html() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], r#""works""#)
}

async fn json_string(Path(value): Path<String>) -> impl IntoResponse {
    let body = serde_json::to_string(&value).unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
}

async fn empty_json() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], "")
}

async fn upload(body: Bytes) -> Json<Upload> {
    tracing::info!(len = body.len(), "upload");
    Json(Upload {
        received: body.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_missing_headers_as_null() {
        let echo = Echo {
            accept: None,
            content_type: None,
            body: String::new(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert!(json["accept"].is_null());
        assert!(json["content_type"].is_null());
        assert_eq!(json["body"], "");
    }

    #[test]
    fn echo_reads_back_from_json() {
        let echo: Echo = serde_json::from_str(
            r#"{"accept":"application/json","content_type":null,"body":"x"}"#,
        )
        .unwrap();
        assert_eq!(echo.accept.as_deref(), Some("application/json"));
        assert_eq!(echo.body, "x");
    }

    #[test]
    fn upload_serializes_count() {
        let json = serde_json::to_string(&Upload { received: 3 }).unwrap();
        assert_eq!(json, r#"{"received":3}"#);
    }
}
