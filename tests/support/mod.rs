//! テスト用の偽プローブ・レンダラー

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use llmprobe::probe::Probe;
use llmprobe::render::{RenderError, Renderer};
use llmprobe::types::{ProbeOutcome, ProbeStatus, RoundSnapshot, ServerDescriptor, ServerStatus, TokenUsage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// shortnameごとのプローブ台本
#[derive(Clone)]
pub enum Script {
    /// 指定時間後に成功を返す
    Success { delay: Duration, tokens: TokenUsage },
    /// 指定時間後に失敗を返す
    Fail {
        delay: Duration,
        status: ProbeStatus,
        detail: &'static str,
    },
}

/// 台本どおりに応答する偽プローブ
pub struct FakeProbe {
    scripts: HashMap<String, Script>,
    calls: AtomicU64,
}

impl FakeProbe {
    pub fn new(scripts: impl IntoIterator<Item = (&'static str, Script)>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn probe(&self, descriptor: &ServerDescriptor) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(&descriptor.shortname)
            .unwrap_or_else(|| panic!("no script for {}", descriptor.shortname))
            .clone();
        let issued_at = Utc::now();
        match script {
            Script::Success { delay, tokens } => {
                tokio::time::sleep(delay).await;
                ProbeOutcome::success(&descriptor.shortname, issued_at, delay, tokens)
            }
            Script::Fail {
                delay,
                status,
                detail,
            } => {
                tokio::time::sleep(delay).await;
                ProbeOutcome::failure(&descriptor.shortname, issued_at, delay, status, detail)
            }
        }
    }
}

/// テスト用のサーバー記述子を作る
pub fn descriptor(shortname: &str) -> ServerDescriptor {
    ServerDescriptor {
        shortname: shortname.to_string(),
        server: format!("host-{shortname}"),
        api_base: format!("http://{shortname}.test:8000/v1"),
        api_key: "sk-test".to_string(),
        model: "test-model".to_string(),
    }
}

pub fn descriptors(names: &[&str]) -> Vec<ServerDescriptor> {
    names.iter().map(|n| descriptor(n)).collect()
}

/// 描画のたびにチャネルへ通知するレンダラー
pub struct ChannelRenderer {
    tx: mpsc::UnboundedSender<u64>,
}

impl ChannelRenderer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Renderer for ChannelRenderer {
    fn is_interactive(&self) -> bool {
        false
    }

    async fn render_round(
        &mut self,
        round: u64,
        _snapshot: &RoundSnapshot,
        _view: &[ServerStatus],
    ) -> Result<(), RenderError> {
        let _ = self.tx.send(round);
        Ok(())
    }
}

/// 常に失敗するレンダラー（ベストエフォート動作の確認用）
pub struct FailingRenderer {
    pub calls: Arc<AtomicU64>,
}

impl FailingRenderer {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl Renderer for FailingRenderer {
    fn is_interactive(&self) -> bool {
        false
    }

    async fn render_round(
        &mut self,
        _round: u64,
        _snapshot: &RoundSnapshot,
        _view: &[ServerStatus],
    ) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RenderError::Io(std::io::Error::other("broken pipe")))
    }
}
