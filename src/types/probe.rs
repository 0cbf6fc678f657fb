//! プローブ結果型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// プローブの分類結果
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// 応答を受信し、補完コンテンツを確認できた
    Success,
    /// 期限内に応答が完了しなかった
    Timeout,
    /// 接続不能（DNS・TCP・TLSレベルの失敗）
    ConnectionError,
    /// 非2xx応答または不正な応答ボディ
    ProtocolError,
    /// 認証拒否（HTTP 401/403）
    AuthError,
}

impl ProbeStatus {
    /// ProbeStatusを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::ProtocolError => "protocol_error",
            Self::AuthError => "auth_error",
        }
    }

    /// 成功かどうか
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// プロバイダ報告のトークン使用量
///
/// `usage.total_tokens` が応答に無い場合は `Unknown` とする。
/// 欠落はデータ品質の問題でありプローブ失敗ではない。
/// ゼロ表示と「不明」表示の区別はレンダラー側の判断に委ねる。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenUsage {
    /// プロバイダが報告した消費トークン数
    Known(u32),
    /// usageフィールド欠落
    Unknown,
}

/// 1回のプローブの結果
///
/// 生成後は不変。`tokens` と `error_detail` は `status` に応じて
/// どちらか一方のみが設定される（コンストラクタで保証）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// 対象サーバーの短縮名
    pub shortname: String,
    /// リクエスト送信時刻
    pub issued_at: DateTime<Utc>,
    /// 送信から応答パース完了までの所要時間
    pub duration: Duration,
    /// 分類結果
    pub status: ProbeStatus,
    /// トークン使用量（Successのみ）
    pub tokens: Option<TokenUsage>,
    /// エラー詳細（非Successのみ）
    pub error_detail: Option<String>,
}

impl ProbeOutcome {
    /// 成功結果を生成する
    pub fn success(
        shortname: impl Into<String>,
        issued_at: DateTime<Utc>,
        duration: Duration,
        tokens: TokenUsage,
    ) -> Self {
        Self {
            shortname: shortname.into(),
            issued_at,
            duration,
            status: ProbeStatus::Success,
            tokens: Some(tokens),
            error_detail: None,
        }
    }

    /// 失敗結果を生成する
    ///
    /// `status` に `Success` を渡してはならない。
    pub fn failure(
        shortname: impl Into<String>,
        issued_at: DateTime<Utc>,
        duration: Duration,
        status: ProbeStatus,
        detail: impl Into<String>,
    ) -> Self {
        debug_assert!(!status.is_success());
        Self {
            shortname: shortname.into(),
            issued_at,
            duration,
            status,
            tokens: None,
            error_detail: Some(detail.into()),
        }
    }
}

/// 1ラウンド分の全プローブ結果
///
/// 設定順を保持し、長さは常に設定サーバー数と一致する。
/// 個別のタイムアウトや失敗があっても欠落しない。
#[derive(Debug, Clone)]
pub struct RoundSnapshot {
    outcomes: Vec<ProbeOutcome>,
}

impl RoundSnapshot {
    /// 設定順の結果列からスナップショットを生成する
    pub fn new(outcomes: Vec<ProbeOutcome>) -> Self {
        Self { outcomes }
    }

    /// 結果数（= 設定サーバー数）
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// 結果が空かどうか
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 設定順での結果イテレータ
    pub fn iter(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter()
    }

    /// 全サーバーが成功したか
    pub fn all_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    /// 全サーバーが失敗したか
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| !o.status.is_success())
    }
}
