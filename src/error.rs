//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! プローブ単体の失敗はエラーとして伝播せず [`crate::types::ProbeStatus`]
//! に分類されるため、ここにはラウンド開始前に致命となるエラーのみを置く。

use thiserror::Error;

/// llmprobe error type
#[derive(Debug, Error)]
pub enum FleetError {
    /// Configuration error (fatal, surfaced before any round starts)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Logging initialization error
    #[error("Logging error: {0}")]
    Logging(String),
}

/// llmprobe standard Result
pub type Result<T> = std::result::Result<T, FleetError>;
