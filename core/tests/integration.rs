//! Round-trips through the pipeline against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, prepares each request with the
//! pipeline, sends it with ureq, and feeds the raw reply back through
//! `process_response`. Checks that what the pipeline puts on the wire is what
//! the server sees, and that only JSON replies get decoded.

use std::io::Read;
use std::net::SocketAddr;

use json_pipeline::{Body, HeaderMap, HttpMethod, HttpRequest, HttpResponse, JsonHttpPipeline, DEFAULT_ACCEPT};
use mock_server::{Echo, Upload};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Execute a prepared `HttpRequest` using ureq and return an `HttpResponse`.
fn execute<T>(req: &HttpRequest) -> HttpResponse<T> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let payload: Option<Vec<u8>> = match &req.body {
        Body::Empty => None,
        Body::Text(text) => Some(text.as_bytes().to_vec()),
        Body::Stream(stream) => {
            let mut bytes = Vec::new();
            stream.lock().unwrap().read_to_end(&mut bytes).unwrap();
            Some(bytes)
        }
        Body::Structured(_) => panic!("structured body reached the transport"),
    };

    let mut response = match req.method {
        HttpMethod::Get | HttpMethod::Delete => {
            let mut builder = match req.method {
                HttpMethod::Get => agent.get(&req.path),
                _ => agent.delete(&req.path),
            };
            for (name, value) in req.headers.iter() {
                builder = builder.header(name, value);
            }
            builder.call()
        }
        HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
            let mut builder = match req.method {
                HttpMethod::Post => agent.post(&req.path),
                HttpMethod::Put => agent.put(&req.path),
                _ => agent.patch(&req.path),
            };
            for (name, value) in req.headers.iter() {
                builder = builder.header(name, value);
            }
            match payload {
                Some(bytes) => builder.send(&bytes[..]),
                None => builder.send_empty(),
            }
        }
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let headers: HeaderMap = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse::new(status, headers, body)
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn round_trip<T: DeserializeOwned>(pipeline: &JsonHttpPipeline, mut req: HttpRequest) -> HttpResponse<T> {
    pipeline.prepare_request(&mut req).unwrap();
    let mut resp = execute::<T>(&req);
    pipeline.process_response(&mut resp).unwrap();
    resp
}

#[test]
fn pipeline_round_trips() {
    let addr = start_server();
    let base = format!("http://{addr}");
    let pipeline = JsonHttpPipeline::new();

    // Step 1: default Accept header reaches the server.
    let resp: HttpResponse<Echo> = round_trip(&pipeline, HttpRequest::new(HttpMethod::Get, format!("{base}/echo")));
    let echo = resp.body_as_object.expect("echo is JSON");
    assert_eq!(echo.accept.as_deref(), Some(DEFAULT_ACCEPT));
    assert!(echo.content_type.is_none());

    // Step 2: caller Accept header is sent as-is.
    let preview = "application/vnd.github.manifold-preview; charset=utf-8";
    let req = HttpRequest::new(HttpMethod::Get, format!("{base}/echo")).with_header("accept", preview);
    let resp: HttpResponse<Echo> = round_trip(&pipeline, req);
    assert_eq!(resp.body_as_object.unwrap().accept.as_deref(), Some(preview));

    // Step 3: structured body goes out as compact JSON.
    let req = HttpRequest::new(HttpMethod::Post, format!("{base}/echo")).with_body(json!({"test": "value"}));
    let resp: HttpResponse<Echo> = round_trip(&pipeline, req);
    let echo = resp.body_as_object.unwrap();
    assert_eq!(echo.body, r#"{"test":"value"}"#);
    assert_eq!(echo.content_type.as_deref(), Some("application/json; charset=utf-8"));

    // Step 4: text body is sent verbatim.
    let req = HttpRequest::new(HttpMethod::Put, format!("{base}/echo")).with_body("just some string data");
    let resp: HttpResponse<Echo> = round_trip(&pipeline, req);
    assert_eq!(resp.body_as_object.unwrap().body, "just some string data");

    // Step 5: binary stream bypasses JSON.
    let req = HttpRequest::new(HttpMethod::Post, format!("{base}/upload"))
        .with_header("Content-Type", "application/octet-stream")
        .with_body(Body::stream(std::io::Cursor::new(vec![0u8, 159, 146, 150, 7])));
    let resp: HttpResponse<Upload> = round_trip(&pipeline, req);
    assert_eq!(resp.body_as_object.unwrap().received, 5);

    // Step 6: JSON with a charset parameter is still decoded.
    let resp: HttpResponse<String> = round_trip(&pipeline, HttpRequest::new(HttpMethod::Get, format!("{base}/json/works")));
    assert_eq!(resp.body_as_object.as_deref(), Some("works"));

    // Step 7: valid JSON served as HTML is not decoded.
    let resp: HttpResponse<String> = round_trip(&pipeline, HttpRequest::new(HttpMethod::Get, format!("{base}/html")));
    assert_eq!(resp.body, r#""works""#);
    assert!(resp.body_as_object.is_none());

    // Step 8: empty JSON body leaves the slot unset.
    let resp: HttpResponse<String> = round_trip(&pipeline, HttpRequest::new(HttpMethod::Get, format!("{base}/empty")));
    assert!(resp.body_as_object.is_none());
}

#[test]
fn pipeline_is_shared_across_threads() {
    let addr = start_server();
    let pipeline = std::sync::Arc::new(JsonHttpPipeline::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pipeline = std::sync::Arc::clone(&pipeline);
            let url = format!("http://{addr}/echo");
            std::thread::spawn(move || {
                let req = HttpRequest::new(HttpMethod::Post, url).with_body(json!({ "n": i }));
                let resp: HttpResponse<Echo> = round_trip(&pipeline, req);
                resp.body_as_object.unwrap().body
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!(r#"{{"n":{i}}}"#));
    }
}
