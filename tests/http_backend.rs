//! End-to-end tests of the HTTP client against a real local backend stub.

use std::convert::Infallible;

use actix_web::{web, App, HttpResponse, HttpServer};
use futures_util::stream;
use serde_json::json;

use datachat_client::error::ChatError;
use datachat_client::models::response::ChatResponse;
use datachat_client::services::stream::{consume, RenderSink};
use datachat_client::services::{BackendClient, HttpBackendClient};

async fn query(body: web::Json<serde_json::Value>) -> HttpResponse {
    match body["question"].as_str().unwrap_or_default() {
        "trigger error" => HttpResponse::Ok().json(json!({
            "message": "No matching data found for that question.",
            "has_error": true
        })),
        "impossible filter" => HttpResponse::Ok().json(json!({
            "message": "The query executed successfully but did not return any results.",
            "sql_query": "SELECT ticker FROM financials WHERE 1 = 0",
            "results": [],
            "empty_results": true
        })),
        _ => HttpResponse::Ok().json(json!({
            "success": true,
            "sql_query": "SELECT ticker, revenue_m FROM financials",
            "results": [
                {"ticker": "BIDW", "revenue_m": 2686.18},
                {"ticker": "ACME", "revenue_m": 500}
            ]
        })),
    }
}

async fn visualize(body: web::Json<serde_json::Value>) -> HttpResponse {
    let rows = body["results"].as_array().map(Vec::len).unwrap_or(0);
    HttpResponse::Ok().json(json!({
        "visualization_html": format!(
            "<div id=\"chart\">{} rows</div><script>renderChart('chart');</script>",
            rows
        )
    }))
}

async fn chat(body: web::Json<serde_json::Value>) -> HttpResponse {
    if body["message"].as_str() == Some("boom") {
        return HttpResponse::InternalServerError().finish();
    }
    let chunks: Vec<Result<web::Bytes, Infallible>> = vec![
        Ok(web::Bytes::from_static(b"### Analysis\n")),
        Ok(web::Bytes::from_static(b"Revenue is **up**.")),
    ];
    HttpResponse::Ok()
        .content_type("text/plain")
        .streaming(stream::iter(chunks))
}

/// Bind the stub to an ephemeral port and return its base URL.
fn spawn_backend() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route("/query", web::post().to(query))
            .route("/generate-visualization", web::post().to(visualize))
            .route("/api/chat", web::post().to(chat))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind mock backend");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

fn client(base_url: &str) -> HttpBackendClient {
    HttpBackendClient::from_parts(reqwest::Client::new(), base_url)
}

#[derive(Default)]
struct BufferSink {
    content: String,
    error_lines: Vec<String>,
}

impl RenderSink for BufferSink {
    fn render(&mut self, formatted: &str) {
        self.content = formatted.to_string();
    }

    fn append_error_line(&mut self, line: &str) {
        self.error_lines.push(line.to_string());
    }
}

#[actix_web::test]
async fn query_reply_with_results_classifies_and_keeps_column_order() {
    let base = spawn_backend();
    let response = client(&base)
        .submit_query("revenue by ticker")
        .await
        .unwrap();

    match response {
        ChatResponse::QueryResults { sql_query, results } => {
            assert_eq!(
                sql_query.as_deref(),
                Some("SELECT ticker, revenue_m FROM financials")
            );
            assert_eq!(results.len(), 2);
            assert_eq!(results.columns(), vec!["ticker", "revenue_m"]);
        }
        other => panic!("unexpected classification: {:?}", other),
    }
}

#[actix_web::test]
async fn error_flagged_reply_classifies_as_error_message() {
    let base = spawn_backend();
    let response = client(&base).submit_query("trigger error").await.unwrap();
    assert_eq!(
        response,
        ChatResponse::ErrorMessage("No matching data found for that question.".into())
    );
}

#[actix_web::test]
async fn declared_empty_reply_classifies_as_empty_results() {
    let base = spawn_backend();
    let response = client(&base)
        .submit_query("impossible filter")
        .await
        .unwrap();
    assert_eq!(
        response,
        ChatResponse::EmptyResults {
            sql_query: Some("SELECT ticker FROM financials WHERE 1 = 0".into())
        }
    );
}

#[actix_web::test]
async fn visualization_request_returns_the_html_fragment() {
    let base = spawn_backend();
    let results = serde_json::from_value(json!([
        {"ticker": "BIDW", "revenue_m": 2686.18},
        {"ticker": "ACME", "revenue_m": 500}
    ]))
    .unwrap();

    let fragment = client(&base)
        .generate_visualization(&results)
        .await
        .unwrap();
    assert!(fragment.contains("2 rows"));
    assert!(fragment.contains("<script>"));
}

#[actix_web::test]
async fn chat_stream_is_decoded_and_rendered_incrementally() {
    let base = spawn_backend();
    let chunks = client(&base).open_chat_stream("how did we do").await.unwrap();

    let mut sink = BufferSink::default();
    let text = consume(chunks, &mut sink).await.unwrap();

    assert_eq!(text, "### Analysis\nRevenue is **up**.");
    assert_eq!(
        sink.content,
        "<h3>Analysis</h3>\n<p>Revenue is <strong>up</strong>.</p>\n"
    );
    assert!(sink.error_lines.is_empty());
}

#[actix_web::test]
async fn non_2xx_chat_stream_fails_before_any_body_read() {
    let base = spawn_backend();
    let Err(err) = client(&base).open_chat_stream("boom").await else {
        panic!("expected the stream request to fail");
    };
    assert!(matches!(err, ChatError::HttpStatusFailure(500)));
}
