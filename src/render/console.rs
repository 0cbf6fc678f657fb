//! コンソールレンダラー
//!
//! ラウンドごとに静的なテキストレポートを標準出力へ書き出す。
//! 状態は持たず、渡されたスナップショットとビューを整形するだけ。

use super::{RenderError, Renderer};
use crate::types::{ProbeStatus, RoundSnapshot, ServerStatus, TokenUsage};
use async_trait::async_trait;
use std::time::Duration;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const CYAN: &str = "\x1b[96m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// コンソールレンダラー
pub struct ConsoleRenderer {
    /// 継続モードの待機時間（ワンショットならNone）
    delay: Option<Duration>,
}

impl ConsoleRenderer {
    /// コンソールレンダラーを作成する
    ///
    /// `delay` を渡すと各ラウンド末尾に次ラウンドまでの待機通知を出す。
    pub fn new(delay: Option<Duration>) -> Self {
        Self { delay }
    }
}

/// 1サーバー分のレポートブロックを整形する
fn format_server_block(status: &ServerStatus) -> String {
    let d = &status.descriptor;
    let name = &d.shortname;
    let mut out = String::new();
    out.push_str(&format!(
        "{BOLD}{CYAN}SERVER: {} ({}){RESET}\n{}\n",
        name,
        d.model,
        "-".repeat(60)
    ));
    out.push_str(&format!("[{BOLD}{name}{RESET}] API Base: {}\n", d.api_base));

    let Some(outcome) = &status.last_outcome else {
        out.push_str(&format!("[{BOLD}{name}{RESET}] Status: WAITING\n"));
        return out;
    };

    match outcome.status {
        ProbeStatus::Success => {
            out.push_str(&format!(
                "[{BOLD}{name}{RESET}] Success: Endpoint responded in {:.2}s\n",
                outcome.duration.as_secs_f64()
            ));
            match outcome.tokens {
                Some(TokenUsage::Known(n)) => {
                    out.push_str(&format!("[{BOLD}{name}{RESET}] Tokens: {n}\n"));
                }
                // 欠落はゼロではなく明示的に「不明」と表示する
                Some(TokenUsage::Unknown) | None => {
                    out.push_str(&format!("[{BOLD}{name}{RESET}] Tokens: unknown\n"));
                }
            }
            out.push_str(&format!(
                "[{BOLD}{name}{RESET}] Status: {GREEN}SUCCESS{RESET}\n"
            ));
        }
        failed => {
            if let Some(detail) = &outcome.error_detail {
                out.push_str(&format!("[{BOLD}{name}{RESET}] Error: {detail}\n"));
            }
            out.push_str(&format!(
                "[{BOLD}{name}{RESET}] Status: {RED}FAILURE{RESET} ({})\n",
                failed.as_str()
            ));
            if status.consecutive_failures > 1 {
                out.push_str(&format!(
                    "[{BOLD}{name}{RESET}] Consecutive failures: {}\n",
                    status.consecutive_failures
                ));
            }
        }
    }
    out
}

/// ラウンドのサマリ行を整形する
fn format_summary(snapshot: &RoundSnapshot) -> String {
    if snapshot.all_success() {
        format!("{BOLD}SUMMARY: {GREEN}All servers passed{RESET}")
    } else {
        let failed = snapshot.iter().filter(|o| !o.status.is_success()).count();
        format!(
            "{BOLD}SUMMARY: {RED}{failed}/{} servers failed{RESET}",
            snapshot.len()
        )
    }
}

#[async_trait]
impl Renderer for ConsoleRenderer {
    fn is_interactive(&self) -> bool {
        false
    }

    async fn render_round(
        &mut self,
        round: u64,
        snapshot: &RoundSnapshot,
        view: &[ServerStatus],
    ) -> Result<(), RenderError> {
        let mut report = String::new();
        report.push_str(&format!(
            "\n{BOLD}TEST ITERATION #{round}{RESET}\n{YELLOW}{}{RESET}\n",
            "=".repeat(60)
        ));
        for status in view {
            report.push_str(&format_server_block(status));
        }
        report.push_str(&format!("{YELLOW}{}{RESET}\n", "=".repeat(60)));
        report.push_str(&format_summary(snapshot));
        report.push('\n');

        if let Some(delay) = self.delay {
            report.push_str(&format!(
                "{BOLD}Waiting {}s before next round... (Ctrl+C to exit){RESET}\n",
                delay.as_secs()
            ));
        }

        println!("{report}");
        Ok(())
    }
}
