use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode, Uri},
    Json, Router,
};
use scamscope_core::{AnalysisOutcome, Error};
use scamscope_local::analyze::{analyze_text, PARSE_ERROR};
use scamscope_local::gemini::GeminiClient;
use scamscope_local::openai_compat::OpenAiCompatClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

// Env vars are process-global; serialize tests that mutate them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const REPORT: &str = r#"{
  "overall_confidence_score": 97,
  "overall_assessment": "Government impersonation demanding gift cards.",
  "category_scores": {"phishing": 40, "financial_scam": 97, "misinformation": 20,
                      "emotional_manipulation": 80, "urgency_tactics": 95},
  "red_flags": [{"flag": "Gift card payment", "severity": "high",
                 "explanation": "No agency accepts gift cards."}],
  "suspicious_phrases": [{"phrase": "via gift cards", "reason": "untraceable payment"}],
  "recommendation": "Do not pay. Contact the agency through its official site.",
  "is_safe": false
}"#;

const SCAM: &str = "IRS NOTICE: You owe $3,247 in back taxes. Pay immediately via gift cards to avoid arrest.";

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    query: HashMap<String, String>,
    authorization: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Seen>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A stub that records every request and answers with `status` + `reply`.
fn recording_stub(log: Log, status: StatusCode, reply: Value) -> Router {
    Router::new().fallback(
        move |uri: Uri, Query(query): Query<HashMap<String, String>>, headers: HeaderMap, Json(body): Json<Value>| {
            let log = log.clone();
            let reply = reply.clone();
            async move {
                log.lock().unwrap().push(Seen {
                    path: uri.path().to_string(),
                    query,
                    authorization: headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body,
                });
                (status, Json(reply))
            }
        },
    )
}

fn gemini_reply(text: &str) -> Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
}

fn gemini_client(base_url: &str) -> GeminiClient {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    std::env::set_var("SCAMSCOPE_GEMINI_API_KEY", "test-key");
    std::env::set_var("SCAMSCOPE_GEMINI_BASE_URL", base_url);
    std::env::set_var("SCAMSCOPE_GEMINI_MODEL", "gemini-test");
    let c = GeminiClient::from_env(reqwest::Client::new(), None).unwrap();
    std::env::remove_var("SCAMSCOPE_GEMINI_API_KEY");
    std::env::remove_var("SCAMSCOPE_GEMINI_BASE_URL");
    std::env::remove_var("SCAMSCOPE_GEMINI_MODEL");
    c
}

#[tokio::test]
async fn gemini_fenced_reply_becomes_a_report() {
    let log: Log = Arc::default();
    let base = serve(recording_stub(
        log.clone(),
        StatusCode::OK,
        gemini_reply(&format!("```json\n{REPORT}\n```")),
    ))
    .await;
    let client = gemini_client(&base);

    let out = analyze_text(&client, SCAM).await;
    let report = out.report().expect("success outcome");
    assert_eq!(report.score(), 97);
    assert!(!report.is_safe);
    assert_eq!(report.suspicious_phrases[0].phrase, "via gift cards");

    let seen = log.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/v1beta/models/gemini-test:generateContent");
    assert_eq!(seen[0].query.get("key").map(String::as_str), Some("test-key"));
    let prompt = seen[0].body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(prompt.contains(SCAM));
}

#[tokio::test]
async fn gemini_prose_reply_is_a_parse_failure_with_raw_text() {
    let base = serve(recording_stub(
        Arc::default(),
        StatusCode::OK,
        gemini_reply("I think this message is probably a scam."),
    ))
    .await;
    let client = gemini_client(&base);

    let out = analyze_text(&client, SCAM).await;
    assert_eq!(
        out,
        AnalysisOutcome::Failure {
            error: PARSE_ERROR.to_string(),
            raw_response: Some("I think this message is probably a scam.".to_string()),
        }
    );
}

#[tokio::test]
async fn gemini_quota_error_is_reported_without_raw_response() {
    let base = serve(recording_stub(
        Arc::default(),
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"code": 429, "message": "Quota exceeded for generate_content", "status": "RESOURCE_EXHAUSTED"}}),
    ))
    .await;
    let client = gemini_client(&base);

    match analyze_text(&client, SCAM).await {
        AnalysisOutcome::Failure {
            error,
            raw_response,
        } => {
            assert!(error.contains("429"), "{error}");
            assert!(error.contains("Quota exceeded"), "{error}");
            assert!(!error.contains("test-key"), "{error}");
            assert!(raw_response.is_none());
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn gemini_slow_backend_times_out_into_a_failure() {
    let app = Router::new().fallback(|| async {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Json(gemini_reply(REPORT))
    });
    let base = serve(app).await;
    let client = gemini_client(&base).with_timeout_ms(200);

    let out = analyze_text(&client, SCAM).await;
    assert!(!out.is_success());
}

#[test]
fn gemini_without_key_is_not_configured() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    for k in ["SCAMSCOPE_GEMINI_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"] {
        std::env::remove_var(k);
    }
    let err = GeminiClient::from_env(reqwest::Client::new(), None).unwrap_err();
    assert!(matches!(err, Error::NotConfigured(_)));
}

#[tokio::test]
async fn openai_compat_sends_bearer_and_parses_choice() {
    let log: Log = Arc::default();
    let base = serve(recording_stub(
        log.clone(),
        StatusCode::OK,
        json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": REPORT}}]}),
    ))
    .await;
    let client = {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("SCAMSCOPE_OPENAI_COMPAT_BASE_URL", &base);
        std::env::set_var("SCAMSCOPE_OPENAI_COMPAT_API_KEY", "sk-test");
        let c = OpenAiCompatClient::from_env(reqwest::Client::new(), Some("local-model".to_string()))
            .unwrap();
        std::env::remove_var("SCAMSCOPE_OPENAI_COMPAT_BASE_URL");
        std::env::remove_var("SCAMSCOPE_OPENAI_COMPAT_API_KEY");
        c
    };

    let out = analyze_text(&client, SCAM).await;
    assert_eq!(out.report().map(|r| r.score()), Some(97));

    let seen = log.lock().unwrap();
    assert_eq!(seen[0].path, "/v1/chat/completions");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(seen[0].body["model"], "local-model");
    assert_eq!(seen[0].body["messages"][0]["role"], "user");
}
