//! ロギング初期化ユーティリティ

use crate::error::{FleetError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// ログレベル指定用の環境変数
const LOG_LEVEL_ENV: &str = "LLMPROBE_LOG_LEVEL";

/// ロギングを初期化する
///
/// レベルは環境変数 `LLMPROBE_LOG_LEVEL`（既定: info）。
/// インタラクティブモードでは代替スクリーンを汚さないよう
/// `logs/llmprobe.log` への日次ローテーション出力に切り替える。
/// 戻り値のガードはプロセス終了までmainで保持すること。
pub fn init(interactive: bool) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    if interactive {
        let appender = tracing_appender::rolling::daily("logs", "llmprobe.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .try_init()
            .map_err(|e| FleetError::Logging(e.to_string()))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| FleetError::Logging(e.to_string()))?;
        Ok(None)
    }
}
