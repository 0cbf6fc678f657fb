//! サーバー状態の集計ストア
//!
//! ラウンド結果を累積する単一ライター/複数リーダーのストア。
//! ライターはスケジューラのみで、1スナップショットの反映は
//! 1回のライトロック保持で行う（スナップショット単位で原子的）。
//! リーダーには設定順のクローンを渡し、次ラウンドの書き込みと
//! 競合させない。

use crate::types::{RoundSnapshot, ServerDescriptor, ServerStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

struct Inner {
    /// 設定順のエントリ
    entries: Vec<ServerStatus>,
    /// shortname → entriesインデックス
    index: HashMap<String, usize>,
}

/// 全サーバーの累積状態を保持するストア
///
/// エントリは構築時に設定サーバー分だけ作られ、プロセス稼働中は
/// 追加も削除もされない。
#[derive(Clone)]
pub struct StatusBoard {
    inner: Arc<RwLock<Inner>>,
}

impl StatusBoard {
    /// 設定済みサーバー群から初期状態のボードを作成する
    pub fn new(descriptors: &[ServerDescriptor]) -> Self {
        let entries: Vec<ServerStatus> = descriptors
            .iter()
            .map(|d| ServerStatus::new(d.clone()))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, s)| (s.descriptor.shortname.clone(), i))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(Inner { entries, index })),
        }
    }

    /// 1ラウンド分のスナップショットを反映する
    ///
    /// スナップショット全体を1回のロック保持で適用するため、読み手が
    /// 一部だけ更新された状態を観測することはない。
    pub async fn apply(&self, snapshot: &RoundSnapshot) {
        let mut inner = self.inner.write().await;
        for outcome in snapshot.iter() {
            match inner.index.get(&outcome.shortname).copied() {
                Some(i) => inner.entries[i].record(outcome),
                None => {
                    // 設定セットは固定なので通常到達しない
                    warn!(shortname = %outcome.shortname, "outcome for unknown server ignored");
                }
            }
        }
    }

    /// 設定順の読み取り専用ビューを返す
    pub async fn view(&self) -> Vec<ServerStatus> {
        self.inner.read().await.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProbeOutcome, ProbeStatus, TokenUsage};
    use chrono::Utc;
    use std::time::Duration;

    fn descriptors(names: &[&str]) -> Vec<ServerDescriptor> {
        names
            .iter()
            .map(|name| ServerDescriptor {
                shortname: name.to_string(),
                server: format!("host-{name}"),
                api_base: "http://x/v1".to_string(),
                api_key: "k".to_string(),
                model: "m".to_string(),
            })
            .collect()
    }

    fn ok(name: &str) -> ProbeOutcome {
        ProbeOutcome::success(name, Utc::now(), Duration::from_millis(50), TokenUsage::Known(12))
    }

    fn ng(name: &str, status: ProbeStatus) -> ProbeOutcome {
        ProbeOutcome::failure(name, Utc::now(), Duration::from_secs(2), status, "boom")
    }

    #[tokio::test]
    async fn apply_updates_every_server_in_snapshot() {
        let board = StatusBoard::new(&descriptors(&["a", "b", "c"]));
        let snapshot = RoundSnapshot::new(vec![
            ok("a"),
            ng("b", ProbeStatus::Timeout),
            ng("c", ProbeStatus::AuthError),
        ]);
        board.apply(&snapshot).await;

        let view = board.view().await;
        assert_eq!(view.len(), 3);
        assert_eq!(view[0].consecutive_failures, 0);
        assert_eq!(view[1].consecutive_failures, 1);
        assert_eq!(view[2].consecutive_failures, 1);
        assert!(view.iter().all(|s| s.total_rounds == 1));
    }

    #[tokio::test]
    async fn applying_identical_snapshot_twice_advances_counters_only() {
        let board = StatusBoard::new(&descriptors(&["a", "b"]));
        let snapshot =
            RoundSnapshot::new(vec![ok("a"), ng("b", ProbeStatus::ConnectionError)]);

        board.apply(&snapshot).await;
        let first = board.view().await;
        board.apply(&snapshot).await;
        let second = board.view().await;

        assert_eq!(second[0].total_rounds, 2);
        assert_eq!(second[0].total_successes, 2);
        assert_eq!(second[1].total_rounds, 2);
        assert_eq!(second[1].consecutive_failures, 2);
        // 同一スナップショットの再適用で last_outcome の内容は変わらない
        assert_eq!(
            first[0].last_outcome.as_ref().map(|o| o.status),
            second[0].last_outcome.as_ref().map(|o| o.status)
        );
        assert_eq!(
            first[1].last_outcome.as_ref().map(|o| o.error_detail.clone()),
            second[1].last_outcome.as_ref().map(|o| o.error_detail.clone())
        );
    }

    #[tokio::test]
    async fn view_is_a_detached_copy() {
        let board = StatusBoard::new(&descriptors(&["a"]));
        let before = board.view().await;
        board.apply(&RoundSnapshot::new(vec![ok("a")])).await;

        // 既に取得済みのビューは以後の書き込みの影響を受けない
        assert_eq!(before[0].total_rounds, 0);
        assert_eq!(board.view().await[0].total_rounds, 1);
    }

    #[tokio::test]
    async fn unknown_shortname_is_ignored() {
        let board = StatusBoard::new(&descriptors(&["a"]));
        board
            .apply(&RoundSnapshot::new(vec![ok("a"), ok("ghost")]))
            .await;
        let view = board.view().await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].total_rounds, 1);
    }
}
