//! 描画レイヤ
//!
//! コンソール/インタラクティブの2種のレンダラーを提供する。
//! どちらを使うかは起動時に一度だけ設定から決まる。レンダラーは
//! スナップショットと状態ビューを整形するだけで、共有状態を
//! 変更することはない。描画失敗はスケジューラを止めない。

mod console;
mod interactive;

pub use console::ConsoleRenderer;
pub use interactive::InteractiveRenderer;

use crate::types::{RoundSnapshot, ServerStatus};
use async_trait::async_trait;
use thiserror::Error;

/// 描画エラー（ベストエフォート、ログして継続）
#[derive(Debug, Error)]
pub enum RenderError {
    /// 端末入出力エラー
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 描画タスクの異常終了
    #[error("render task failed: {0}")]
    TaskFailed(String),
}

/// レンダラー共通インターフェース
#[async_trait]
pub trait Renderer: Send {
    /// 全画面インタラクティブ描画かどうか
    fn is_interactive(&self) -> bool;

    /// 1ラウンド分の結果を描画する
    ///
    /// `view` は設定順のステータスビュー。呼び出しはラウンドごとに
    /// スケジューラから行われ、ラウンドの適用完了後に到達する。
    async fn render_round(
        &mut self,
        round: u64,
        snapshot: &RoundSnapshot,
        view: &[ServerStatus],
    ) -> Result<(), RenderError>;

    /// 終了処理（画面復元等）
    async fn close(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}
