use super::*;
use crate::lm::TextGenerator;
use crate::model::AuthType;
use crate::store::WorkspacePaths;
use anyhow::anyhow;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

struct FixedSummary(Option<&'static str>);

impl TextGenerator for FixedSummary {
    fn generate_text(&self, _prompt: &str) -> Result<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| anyhow!("model unavailable"))
    }
}

fn system(base_url: &str) -> System {
    System {
        id: "sys-1".to_string(),
        name: "Target".to_string(),
        base_url: base_url.to_string(),
        auth_type: AuthType::Bearer,
        docs_url: None,
        created_at: String::new(),
    }
}

/// Serve one canned HTTP response and hand back the raw request text.
fn serve_once(content_type: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read line") == 0 {
                break;
            }
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
            request.push_str(&line);
            if line == "\r\n" {
                break;
            }
        }
        let mut payload = vec![0u8; content_length];
        reader.read_exact(&mut payload).expect("read body");
        request.push_str(&String::from_utf8_lossy(&payload));

        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 422 Unprocessable Entity\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");
        tx.send(request).expect("send request text");
    });
    (base, rx)
}

#[test]
fn url_joins_with_a_single_slash() {
    assert_eq!(build_url("https://api.example.com/", Some("v1/sites")), "https://api.example.com/v1/sites");
    assert_eq!(build_url("https://api.example.com", Some("/v1")), "https://api.example.com/v1");
    assert_eq!(build_url("https://api.example.com/", None), "https://api.example.com/");
    assert_eq!(build_url("https://api.example.com", Some("  ")), "https://api.example.com/");
}

#[test]
fn bearer_token_wins_over_api_key() {
    let request = ProbeRequest {
        api_key: Some("key".to_string()),
        bearer_token: Some("tok".to_string()),
        ..ProbeRequest::default()
    };
    assert_eq!(
        request_headers(&request),
        vec![
            ("Content-Type", "application/json".to_string()),
            ("Authorization", "Bearer tok".to_string()),
        ]
    );

    let request = ProbeRequest {
        api_key: Some("key".to_string()),
        ..ProbeRequest::default()
    };
    assert_eq!(request_headers(&request)[1], ("x-api-key", "key".to_string()));
}

#[test]
fn methods_are_case_insensitive_and_default_to_get() {
    assert_eq!(ProbeMethod::parse(None).unwrap(), ProbeMethod::Get);
    assert_eq!(ProbeMethod::parse(Some("post")).unwrap(), ProbeMethod::Post);
    let err = ProbeMethod::parse(Some("brew")).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn json_reply_is_parsed_and_summarized() {
    let (base, requests) = serve_once("application/json; charset=utf-8", r#"{"error":"site_id required"}"#);
    let dir = tempfile::tempdir().expect("temp dir");
    let paths = WorkspacePaths::new(dir.path().to_path_buf());
    let generator = FixedSummary(Some("The call failed: site_id is required."));
    let assistant = Assistant::new(&generator, &paths);
    let request = ProbeRequest {
        method: Some("post".to_string()),
        path: Some("workorders".to_string()),
        bearer_token: Some("tok".to_string()),
        body: Some(json!({"title": "Leak"})),
        ..ProbeRequest::default()
    };

    let report = run_probe(&system(&base), &request, Duration::from_secs(5), &assistant)
        .expect("probe");

    assert_eq!(
        report,
        ProbeReport {
            error: None,
            status_code: 422,
            response_body: json!({"error": "site_id required"}),
            summary: Some("The call failed: site_id is required.".to_string()),
        }
    );
    let seen = requests.recv().expect("request text");
    assert!(seen.starts_with("POST /workorders HTTP/1.1"));
    assert!(seen.to_ascii_lowercase().contains("authorization: bearer tok"));
    assert!(seen.ends_with(r#"{"title":"Leak"}"#));
}

#[test]
fn text_reply_survives_a_failed_summary() {
    let (base, _requests) = serve_once("text/plain", "nope");
    let dir = tempfile::tempdir().expect("temp dir");
    let paths = WorkspacePaths::new(dir.path().to_path_buf());
    let generator = FixedSummary(None);
    let assistant = Assistant::new(&generator, &paths);

    let report = run_probe(&system(&base), &ProbeRequest::default(), Duration::from_secs(5), &assistant)
        .expect("probe");

    assert_eq!(report.status_code, 422);
    assert_eq!(report.response_body, json!("nope"));
    assert_eq!(report.summary, None);
}

#[test]
fn unreachable_host_is_reported_not_raised() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);
    let dir = tempfile::tempdir().expect("temp dir");
    let paths = WorkspacePaths::new(dir.path().to_path_buf());
    let generator = FixedSummary(Some("unused"));
    let assistant = Assistant::new(&generator, &paths);

    let report = run_probe(&system(&base), &ProbeRequest::default(), Duration::from_secs(5), &assistant)
        .expect("probe");

    assert!(report.error.is_some());
    assert_eq!(report.status_code, 0);
    assert_eq!(report.response_body, Value::Null);
    assert_eq!(report.summary, None);
    let rendered = serde_json::to_value(&report).expect("serialize");
    assert_eq!(rendered["statusCode"], json!(0));
    assert_eq!(rendered["responseBody"], Value::Null);
}

#[test]
fn simulation_echoes_the_stored_sample() {
    let missing = simulate(None, None);
    assert!(!missing.valid);
    assert_eq!(missing.mock_response, Value::Null);
    assert!(missing.message.starts_with("No discovery sample stored."));

    let sample = json!({"id": "WO-1"});
    let simulated = simulate(Some(&sample), Some(&json!({"title": "x"})));
    assert!(simulated.simulated);
    assert!(simulated.valid);
    assert_eq!(simulated.mock_response, sample);
}
