//! llmprobe - OpenAI互換エンドポイント群のヘルスチェッカー
//!
//! 設定された全サーバーへ並列にテストリクエストを送信し、
//! レイテンシ・成否・トークン使用量を集計する。

#![warn(missing_docs)]

/// CLIインターフェース
pub mod cli;

/// サーバー設定ロード（model_servers.yaml）
pub mod config;

/// エラー型定義
pub mod error;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 単一エンドポイントへのプローブ実行
pub mod probe;

/// 描画（コンソール/インタラクティブ）
pub mod render;

/// ラウンド調整（全サーバー並列プローブ）
pub mod round;

/// ラウンドスケジューラ（ワンショット/継続モード）
pub mod scheduler;

/// 協調シャットダウン
pub mod shutdown;

/// サーバー状態の集計ストア
pub mod status;

/// 共通型定義（サーバー記述子・プローブ結果）
pub mod types;
