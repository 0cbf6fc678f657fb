//! ラウンドスケジューラ
//!
//! ワンショット/継続の2モードでラウンドを逐次駆動する。ラウンドは
//! 常に直列で、前ラウンドのスナップショットがストアへ適用されるまで
//! 次ラウンドは開始しない。キャンセルは待機中なら即座に、実行中なら
//! 進行中ラウンドの（有界な）完了後に反映される。

use crate::probe::Probe;
use crate::render::Renderer;
use crate::round;
use crate::shutdown::ShutdownSignal;
use crate::status::StatusBoard;
use crate::types::{RoundSnapshot, ServerDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 実行モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 1ラウンドだけ実行して戻る
    OneShot,
    /// キャンセルされるまで固定間隔でラウンドを繰り返す
    Continuous {
        /// ラウンド間の待機時間
        delay: Duration,
    },
}

/// スケジューラの状態機械
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// 未実行または正常終了
    Idle,
    /// ラウンド実行中
    Running,
    /// 次ラウンドまでの待機中（継続モードのみ）
    Waiting,
    /// キャンセル済み（終端）
    Cancelled,
}

/// ラウンドスケジューラ
pub struct Scheduler<P> {
    prober: Arc<P>,
    descriptors: Vec<ServerDescriptor>,
    board: StatusBoard,
    mode: Mode,
    per_probe_timeout: Duration,
    shutdown: ShutdownSignal,
    state: SchedulerState,
    round: u64,
}

impl<P> Scheduler<P>
where
    P: Probe + 'static,
{
    /// スケジューラを作成する
    pub fn new(
        prober: P,
        descriptors: Vec<ServerDescriptor>,
        board: StatusBoard,
        mode: Mode,
        per_probe_timeout: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            prober: Arc::new(prober),
            descriptors,
            board,
            mode,
            per_probe_timeout,
            shutdown,
            state: SchedulerState::Idle,
            round: 0,
        }
    }

    /// 現在の状態
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// 完了したラウンド数
    pub fn rounds_completed(&self) -> u64 {
        self.round
    }

    /// ラウンドループを実行する
    ///
    /// 各ラウンドの適用後にレンダラーを呼ぶ。レンダラーの失敗は
    /// ログに記録して継続する。戻り値は最後に完了したラウンドの
    /// スナップショット（1ラウンドも完了しなければNone）。
    pub async fn run(&mut self, renderer: &mut dyn Renderer) -> Option<RoundSnapshot> {
        let mut last = None;

        loop {
            if self.shutdown.is_requested() {
                self.state = SchedulerState::Cancelled;
                break;
            }

            self.state = SchedulerState::Running;
            self.round += 1;
            info!(round = self.round, servers = self.descriptors.len(), "starting probe round");

            let snapshot =
                round::run_round(&self.prober, &self.descriptors, self.per_probe_timeout).await;
            self.board.apply(&snapshot).await;
            let view = self.board.view().await;

            if let Err(e) = renderer.render_round(self.round, &snapshot, &view).await {
                warn!(error = %e, "renderer failed; continuing");
            }
            last = Some(snapshot);

            match self.mode {
                Mode::OneShot => {
                    self.state = if self.shutdown.is_requested() {
                        SchedulerState::Cancelled
                    } else {
                        SchedulerState::Idle
                    };
                    break;
                }
                Mode::Continuous { delay } => {
                    if self.shutdown.is_requested() {
                        self.state = SchedulerState::Cancelled;
                        break;
                    }
                    self.state = SchedulerState::Waiting;
                    let shutdown = self.shutdown.clone();
                    tokio::select! {
                        _ = shutdown.wait() => {
                            self.state = SchedulerState::Cancelled;
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(rounds = self.round, state = ?self.state, "scheduler stopped");
        last
    }
}
