//! サーバー累積状態型定義

use super::probe::ProbeOutcome;
use super::server::ServerDescriptor;

/// サーバーごとの累積状態
///
/// [`crate::status::StatusBoard`] が排他的に所有し、ラウンドごとに
/// 更新される。レンダラーへはクローンのみが渡る。
#[derive(Debug, Clone)]
pub struct ServerStatus {
    /// サーバー記述子
    pub descriptor: ServerDescriptor,
    /// 直近のプローブ結果（初回ラウンド前はNone）
    pub last_outcome: Option<ProbeOutcome>,
    /// 連続失敗回数（成功で0にリセット）
    pub consecutive_failures: u32,
    /// 参加ラウンド総数
    pub total_rounds: u64,
    /// 成功ラウンド総数
    pub total_successes: u64,
}

impl ServerStatus {
    /// 初期状態（ラウンド未実施）を生成する
    pub fn new(descriptor: ServerDescriptor) -> Self {
        Self {
            descriptor,
            last_outcome: None,
            consecutive_failures: 0,
            total_rounds: 0,
            total_successes: 0,
        }
    }

    /// 1ラウンド分の結果を反映する
    ///
    /// 成功で `consecutive_failures` を0にリセット、失敗で+1。
    /// `total_rounds == total_successes + 失敗ラウンド数` を維持する。
    pub(crate) fn record(&mut self, outcome: &ProbeOutcome) {
        self.total_rounds += 1;
        if outcome.status.is_success() {
            self.total_successes += 1;
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
        self.last_outcome = Some(outcome.clone());
    }
}
