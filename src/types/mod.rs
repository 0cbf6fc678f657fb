//! 共通型定義
//!
//! サーバー記述子・プローブ結果・累積状態の各型を提供する。

mod probe;
mod server;
mod status;

pub use probe::{ProbeOutcome, ProbeStatus, RoundSnapshot, TokenUsage};
pub use server::ServerDescriptor;
pub use status::ServerStatus;
