// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Wire-format tests: spin up a minimal HTTP/1.1 mock server, point
//! `HttpJsonProvider` at it, issue a `GenerationRequest`, and assert both the
//! HTTP request it sent and the text/usage it parsed back out. No API keys,
//! no external network access.
use std::collections::HashMap;

use concord_gateway::{AuthStyle, GenerationRequest, HttpJsonProvider, Message, ModelProvider};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

struct CapturedRequest {
    headers: HashMap<String, String>,
    body: Value,
}

/// Bind a one-shot HTTP/1.1 mock server on a random loopback port. Accepts
/// exactly one request, captures it, and replies with `response_body`.
async fn one_shot_server(response_body: Value) -> (String, tokio::task::JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut headers = HashMap::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((k, v)) = line.split_once(':') {
                let k = k.trim().to_lowercase();
                let v = v.trim().to_string();
                if k == "content-length" {
                    content_length = v.parse().unwrap_or(0);
                }
                headers.insert(k, v);
            }
        }

        let mut body_bytes = vec![0u8; content_length];
        reader.read_exact(&mut body_bytes).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap();

        let payload = response_body.to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            payload.len(),
            payload
        );
        write_half.write_all(response.as_bytes()).await.unwrap();
        write_half.flush().await.unwrap();

        CapturedRequest { headers, body }
    });

    (format!("http://{addr}"), handle)
}

fn openai_style_reply(text: &str) -> Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 4},
    })
}

#[tokio::test]
async fn sends_openai_shaped_request_and_parses_content_and_usage() {
    let (base_url, handle) = one_shot_server(openai_style_reply("hello back")).await;

    let provider = HttpJsonProvider::new("openai", "gpt-4o-mini", Some("sk-test".into()), &base_url, AuthStyle::Bearer);
    let req = GenerationRequest::text(vec![Message::user("hi there")], 0.4);
    let (content, usage) = provider.complete(&req).await.unwrap();

    assert_eq!(content, "hello back");
    assert_eq!(usage.input_tokens, 12);
    assert_eq!(usage.output_tokens, 4);

    let captured = handle.await.unwrap();
    assert_eq!(captured.headers.get("authorization").map(String::as_str), Some("Bearer sk-test"));
    assert_eq!(captured.body["model"], "gpt-4o-mini");
    assert_eq!(captured.body["stream"], false);
    assert_eq!(captured.body["messages"][0]["role"], "user");
    assert_eq!(captured.body["messages"][0]["content"], "hi there");
}

#[tokio::test]
async fn azure_auth_style_sends_api_key_header_not_bearer() {
    let (base_url, handle) = one_shot_server(openai_style_reply("ok")).await;

    let provider = HttpJsonProvider::new("azure", "gpt-4o", Some("azure-key".into()), &base_url, AuthStyle::ApiKeyHeader);
    let req = GenerationRequest::text(vec![Message::user("hi")], 0.0);
    provider.complete(&req).await.unwrap();

    let captured = handle.await.unwrap();
    assert_eq!(captured.headers.get("api-key").map(String::as_str), Some("azure-key"));
    assert!(!captured.headers.contains_key("authorization"));
}

#[tokio::test]
async fn structured_request_sets_json_schema_response_format() {
    let (base_url, handle) = one_shot_server(openai_style_reply(r#"{"ok":true}"#)).await;

    let provider = HttpJsonProvider::new("ollama", "llama3", None, &base_url, AuthStyle::None);
    let req = GenerationRequest::structured(
        vec![Message::system("be terse"), Message::user("go")],
        "action_proposal",
        serde_json::json!({"type": "object"}),
        0.1,
    );
    provider.complete(&req).await.unwrap();

    let captured = handle.await.unwrap();
    assert!(!captured.headers.contains_key("authorization"));
    assert_eq!(captured.body["response_format"]["type"], "json_schema");
    assert_eq!(captured.body["response_format"]["json_schema"]["name"], "action_proposal");
    assert_eq!(captured.body["messages"][0]["role"], "system");
}

#[tokio::test]
async fn http_error_status_surfaces_as_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (_read_half, mut write_half) = stream.into_split();
        let body = "rate limited";
        let response =
            format!("HTTP/1.1 429 Too Many Requests\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}", body.len(), body);
        write_half.write_all(response.as_bytes()).await.unwrap();
        write_half.flush().await.unwrap();
    });

    let provider = HttpJsonProvider::new("openai", "gpt-4o-mini", None, &format!("http://{addr}"), AuthStyle::Bearer);
    let req = GenerationRequest::text(vec![Message::user("hi")], 0.0);
    let err = provider.complete(&req).await.unwrap_err();

    assert!(matches!(err, concord_gateway::GatewayError::Transport(_)));
    assert!(err.to_string().contains("429"));
    handle.await.unwrap();
}
