//! ラウンド調整
//!
//! 全サーバーへのプローブを並列に起動し、共通の個別期限で打ち切って
//! 1ラウンド分のスナップショットにまとめる。1台のハングが他サーバーの
//! 計測を遅らせることはない。
//!
//! 期限の強制はプローバーを信用せず、ここでタイマーとの競争として
//! 行う。タイマーが先に発火したサーバーは `Timeout` として確定し、
//! その後にプローブが完走しても結果は破棄される（タスクをabort）。

use crate::probe::Probe;
use crate::types::{ProbeOutcome, ProbeStatus, RoundSnapshot, ServerDescriptor};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 1ラウンドを実行する
///
/// 戻り値のスナップショットは入力記述子の順序を保持し、長さは常に
/// `descriptors.len()` と一致する。全プローブが結果確定（完走または
/// 強制タイムアウト）するまで返らない。
pub async fn run_round<P>(
    prober: &Arc<P>,
    descriptors: &[ServerDescriptor],
    per_probe_timeout: Duration,
) -> RoundSnapshot
where
    P: Probe + 'static,
{
    let round_start = tokio::time::Instant::now();
    let deadline = round_start + per_probe_timeout;

    let mut handles = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let prober = Arc::clone(prober);
        let descriptor = descriptor.clone();
        let shortname = descriptor.shortname.clone();
        let handle = tokio::spawn(async move { prober.probe(&descriptor).await });
        handles.push((shortname, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (shortname, mut handle) in handles {
        let outcome = match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                // プローブタスク自体の失敗（パニック等）。ネットワーク失敗と
                // 区別してProtocolErrorとして記録する。
                debug!(shortname = %shortname, error = %join_err, "probe task failed");
                ProbeOutcome::failure(
                    &shortname,
                    Utc::now(),
                    round_start.elapsed(),
                    ProbeStatus::ProtocolError,
                    format!("probe task failed: {join_err}"),
                )
            }
            Err(_elapsed) => {
                // 期限切れ。タスクを打ち切り、遅れて完走した結果は採用しない。
                handle.abort();
                ProbeOutcome::failure(
                    &shortname,
                    Utc::now(),
                    per_probe_timeout,
                    ProbeStatus::Timeout,
                    format!(
                        "probe exceeded {}ms deadline",
                        per_probe_timeout.as_millis()
                    ),
                )
            }
        };
        outcomes.push(outcome);
    }

    let success = outcomes.iter().filter(|o| o.status.is_success()).count();
    info!(
        total = outcomes.len(),
        success,
        failure = outcomes.len() - success,
        "probe round completed"
    );

    RoundSnapshot::new(outcomes)
}
