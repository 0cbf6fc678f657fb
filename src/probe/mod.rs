//! 単一エンドポイントへのプローブ実行
//!
//! chat/completions へ固定の小さなテストリクエストを送信し、
//! 結果を [`ProbeStatus`] の5分類に写像する。失敗は例外として
//! 伝播せず、必ず分類済みの [`ProbeOutcome`] として返る。

use crate::types::{ProbeOutcome, ProbeStatus, ServerDescriptor, TokenUsage};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 固定テストプロンプト
const TEST_PROMPT: &str = "What is 2+2? Please provide a short, direct answer.";

/// 応答トークン上限
const MAX_TOKENS: u32 = 50;

/// プローブ実行インターフェース
///
/// ラウンド調整層はこの境界越しにプローブを起動する。
#[async_trait]
pub trait Probe: Send + Sync {
    /// 1サーバーへのテストリクエストを実行し、分類済み結果を返す
    async fn probe(&self, descriptor: &ServerDescriptor) -> ProbeOutcome;
}

/// chat/completions リクエストボディ（必要フィールドのみ）
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: &'static str,
}

/// chat/completions レスポンス（必要フィールドのみ）
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: Option<u32>,
}

/// HTTPベースのプローバー
///
/// クライアント側タイムアウトも持つが、期限の最終的な強制は
/// ラウンド調整層が行う（こちらはあくまで自衛）。
#[derive(Clone)]
pub struct Prober {
    client: Client,
}

impl Prober {
    /// 指定タイムアウトのHTTPクライアントでプローバーを作成する
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// 応答ボディを分類する
    fn classify_body(
        descriptor: &ServerDescriptor,
        parsed: ChatResponse,
    ) -> (ProbeStatus, Option<TokenUsage>, Option<String>) {
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref());

        match content {
            Some(text) if !text.is_empty() => {
                let tokens = parsed
                    .usage
                    .and_then(|u| u.total_tokens)
                    .map(TokenUsage::Known)
                    .unwrap_or(TokenUsage::Unknown);
                if tokens == TokenUsage::Unknown {
                    debug!(
                        shortname = %descriptor.shortname,
                        "response has no usage.total_tokens; recording unknown"
                    );
                }
                (ProbeStatus::Success, Some(tokens), None)
            }
            Some(_) => (
                ProbeStatus::ProtocolError,
                None,
                Some("empty completion content".to_string()),
            ),
            None => (
                ProbeStatus::ProtocolError,
                None,
                Some("no completion choices in response".to_string()),
            ),
        }
    }
}

#[async_trait]
impl Probe for Prober {
    async fn probe(&self, descriptor: &ServerDescriptor) -> ProbeOutcome {
        let issued_at = Utc::now();
        let start = Instant::now();

        let body = ChatRequest {
            model: &descriptor.model,
            messages: [ChatMessage {
                role: "user",
                content: TEST_PROMPT,
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(descriptor.chat_completions_url())
            .bearer_auth(&descriptor.api_key)
            .json(&body)
            .send()
            .await;

        let (status, tokens, detail) = match response {
            Err(e) if e.is_timeout() => (
                ProbeStatus::Timeout,
                None,
                Some(format!("request timed out: {e}")),
            ),
            Err(e) => (
                ProbeStatus::ConnectionError,
                None,
                Some(format!("connection failed: {e}")),
            ),
            Ok(resp) => {
                let http_status = resp.status();
                if http_status == StatusCode::UNAUTHORIZED || http_status == StatusCode::FORBIDDEN
                {
                    (
                        ProbeStatus::AuthError,
                        None,
                        Some(format!("authentication rejected: HTTP {http_status}")),
                    )
                } else if !http_status.is_success() {
                    (
                        ProbeStatus::ProtocolError,
                        None,
                        Some(format!("HTTP {http_status}")),
                    )
                } else {
                    match resp.json::<ChatResponse>().await {
                        Ok(parsed) => Self::classify_body(descriptor, parsed),
                        Err(e) if e.is_timeout() => (
                            ProbeStatus::Timeout,
                            None,
                            Some(format!("response body timed out: {e}")),
                        ),
                        Err(e) => (
                            ProbeStatus::ProtocolError,
                            None,
                            Some(format!("malformed response body: {e}")),
                        ),
                    }
                }
            }
        };

        let duration = start.elapsed();
        match status {
            ProbeStatus::Success => {
                debug!(
                    shortname = %descriptor.shortname,
                    latency_ms = duration.as_millis() as u64,
                    tokens = ?tokens,
                    "probe succeeded"
                );
                ProbeOutcome::success(
                    &descriptor.shortname,
                    issued_at,
                    duration,
                    tokens.unwrap_or(TokenUsage::Unknown),
                )
            }
            _ => {
                let detail = detail.unwrap_or_else(|| "unknown error".to_string());
                warn!(
                    shortname = %descriptor.shortname,
                    status = %status,
                    error = %detail,
                    "probe failed"
                );
                ProbeOutcome::failure(&descriptor.shortname, issued_at, duration, status, detail)
            }
        }
    }
}
