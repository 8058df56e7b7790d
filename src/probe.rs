//! Live test calls against a registered system, and the offline simulation.
//!
//! A probe never fails because the remote side misbehaved: transport errors
//! are folded into the report with `statusCode: 0`. Only bad user input
//! (an unsupported method, say) is an error.
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::assist::Assistant;
use crate::error::WorkbenchError;
use crate::model::System;

const NO_SAMPLE_MESSAGE: &str =
    "No discovery sample stored. Paste a sample JSON on the system discovery page first.";
const SIMULATED_MESSAGE: &str =
    "Simulation: payload shape matches known sample. No live call made.";

/// What the user asked to send.
#[derive(Debug, Clone, Default)]
pub struct ProbeRequest {
    pub method: Option<String>,
    pub path: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status_code: u16,
    pub response_body: Value,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub simulated: bool,
    pub message: String,
    pub valid: bool,
    pub mock_response: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeMethod {
    Get,
    Head,
    Delete,
    Options,
    Post,
    Put,
    Patch,
}

impl ProbeMethod {
    fn parse(raw: Option<&str>) -> Result<Self, WorkbenchError> {
        let method = raw
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .unwrap_or("GET")
            .to_ascii_uppercase();
        match method.as_str() {
            "GET" => Ok(ProbeMethod::Get),
            "HEAD" => Ok(ProbeMethod::Head),
            "DELETE" => Ok(ProbeMethod::Delete),
            "OPTIONS" => Ok(ProbeMethod::Options),
            "POST" => Ok(ProbeMethod::Post),
            "PUT" => Ok(ProbeMethod::Put),
            "PATCH" => Ok(ProbeMethod::Patch),
            other => Err(WorkbenchError::Invalid(format!(
                "unsupported method {other:?} (use GET, HEAD, DELETE, OPTIONS, POST, PUT or PATCH)"
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ProbeMethod::Get => "GET",
            ProbeMethod::Head => "HEAD",
            ProbeMethod::Delete => "DELETE",
            ProbeMethod::Options => "OPTIONS",
            ProbeMethod::Post => "POST",
            ProbeMethod::Put => "PUT",
            ProbeMethod::Patch => "PATCH",
        }
    }
}

/// Join a base URL and a request path: one slash between them, `/` when the
/// path is blank.
pub fn build_url(base_url: &str, path: Option<&str>) -> String {
    let path = path.map(str::trim).filter(|path| !path.is_empty()).unwrap_or("/");
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Request headers; a bearer token wins over an API key.
fn request_headers(request: &ProbeRequest) -> Vec<(&'static str, String)> {
    let mut headers = vec![("Content-Type", "application/json".to_string())];
    let bearer = request.bearer_token.as_deref().filter(|token| !token.is_empty());
    let api_key = request.api_key.as_deref().filter(|key| !key.is_empty());
    if let Some(token) = bearer {
        headers.push(("Authorization", format!("Bearer {token}")));
    } else if let Some(key) = api_key {
        headers.push(("x-api-key", key.to_string()));
    }
    headers
}

/// Fire the request, then ask for a best-effort summary of the response.
pub fn run_probe(
    system: &System,
    request: &ProbeRequest,
    timeout: Duration,
    assistant: &Assistant<'_>,
) -> Result<ProbeReport> {
    let method = ProbeMethod::parse(request.method.as_deref())?;
    let url = build_url(&system.base_url, request.path.as_deref());

    let start = Instant::now();
    let (status, response_body) = match send(method, &url, request, timeout) {
        Ok(reply) => reply,
        Err(err) => {
            tracing::info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                method = method.as_str(),
                url = %url,
                error = %err,
                "probe transport failure"
            );
            return Ok(ProbeReport {
                error: Some(err.to_string()),
                status_code: 0,
                response_body: Value::Null,
                summary: None,
            });
        }
    };
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        method = method.as_str(),
        url = %url,
        status,
        "probe complete"
    );

    let summary = match assistant.summarize_probe(status, &response_body) {
        Ok(summary) => Some(summary),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "probe summary unavailable");
            None
        }
    };

    Ok(ProbeReport {
        error: None,
        status_code: status,
        response_body,
        summary,
    })
}

fn send(
    method: ProbeMethod,
    url: &str,
    request: &ProbeRequest,
    timeout: Duration,
) -> Result<(u16, Value), ureq::Error> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .into();
    let headers = request_headers(request);
    let payload = request.body.as_ref().map(Value::to_string);

    let response = match method {
        ProbeMethod::Get => with_headers(agent.get(url), &headers).call(),
        ProbeMethod::Head => with_headers(agent.head(url), &headers).call(),
        ProbeMethod::Delete => with_headers(agent.delete(url), &headers).call(),
        ProbeMethod::Options => with_headers(agent.options(url), &headers).call(),
        ProbeMethod::Post => send_with_body(with_headers(agent.post(url), &headers), payload),
        ProbeMethod::Put => send_with_body(with_headers(agent.put(url), &headers), payload),
        ProbeMethod::Patch => send_with_body(with_headers(agent.patch(url), &headers), payload),
    }?;
    Ok(read_reply(response))
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(&'static str, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder
}

fn send_with_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    payload: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match payload {
        Some(payload) => builder.send(payload.as_bytes()),
        None => builder.send_empty(),
    }
}

// JSON when the server says so, text otherwise; an unreadable body is null.
fn read_reply(mut response: ureq::http::Response<ureq::Body>) -> (u16, Value) {
    let status = response.status().as_u16();
    let is_json = response
        .headers()
        .get(ureq::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    let body = if is_json {
        response.body_mut().read_json::<Value>().unwrap_or(Value::Null)
    } else {
        response
            .body_mut()
            .read_to_string()
            .map(Value::String)
            .unwrap_or(Value::Null)
    };
    (status, body)
}

/// Describe what a call would return using the stored discovery sample.
/// No network traffic; the payload is accepted but not checked.
pub fn simulate(sample: Option<&Value>, _payload: Option<&Value>) -> Simulation {
    match sample.filter(|sample| !sample.is_null()) {
        None => Simulation {
            simulated: true,
            message: NO_SAMPLE_MESSAGE.to_string(),
            valid: false,
            mock_response: Value::Null,
        },
        Some(sample) => Simulation {
            simulated: true,
            message: SIMULATED_MESSAGE.to_string(),
            valid: true,
            mock_response: sample.clone(),
        },
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
