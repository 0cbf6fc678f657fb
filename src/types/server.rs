//! サーバー記述子型定義

use serde::{Deserialize, Serialize};

/// プローブ対象サーバーの記述子
///
/// 設定ロード時に確定し、プロセス稼働中は不変。`shortname` が
/// 設定セット全体で一意な識別子となる（ロード時に検証済み）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerDescriptor {
    /// 一意な短縮名（例: "scout", "gpt41"）
    pub shortname: String,
    /// ホスト表示名（例: "本番vLLM", "api.openai.com"）
    pub server: String,
    /// APIベースURL（例: `https://api.openai.com/v1`）
    pub api_base: String,
    /// 解決済みAPIキー（シリアライズ時はスキップ）
    #[serde(skip_serializing)]
    pub api_key: String,
    /// モデル名
    pub model: String,
}

impl ServerDescriptor {
    /// chat/completions エンドポイントの完全URLを返す
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}
