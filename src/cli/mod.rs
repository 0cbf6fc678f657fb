//! CLIインターフェース

use crate::scheduler::Mode;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// llmprobe - OpenAI互換エンドポイント群のヘルスチェッカー
#[derive(Parser, Debug)]
#[command(name = "llmprobe")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    LLMPROBE_LOG_LEVEL      Log level (default: info)
    OPENAI_API_KEY          Fallback API key for servers without openai_api_key

EXIT CODES:
    0   clean shutdown (including user quit)
    1   one-shot run in which every server failed
    2   configuration load failure
"#)]
pub struct Cli {
    /// 設定ファイルパス
    #[arg(long, default_value = "model_servers.yaml")]
    pub config: PathBuf,

    /// コンソールモードで実行（既定はインタラクティブUI）
    #[arg(long)]
    pub console: bool,

    /// ラウンド間の待機秒数（0でワンショット）
    #[arg(long, default_value_t = 0)]
    pub delay: u64,

    /// プローブ対象をshortnameで絞り込み（カンマ区切り）
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// プローブ1回あたりのタイムアウト秒数
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

impl Cli {
    /// delayフラグから実行モードを決める
    pub fn mode(&self) -> Mode {
        if self.delay == 0 {
            Mode::OneShot
        } else {
            Mode::Continuous {
                delay: Duration::from_secs(self.delay),
            }
        }
    }

    /// 継続モードの待機時間（ワンショットならNone）
    pub fn round_delay(&self) -> Option<Duration> {
        match self.mode() {
            Mode::OneShot => None,
            Mode::Continuous { delay } => Some(delay),
        }
    }

    /// プローブ期限
    pub fn per_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_shot_interactive() {
        let cli = Cli::parse_from(["llmprobe"]);
        assert!(!cli.console);
        assert_eq!(cli.mode(), Mode::OneShot);
        assert!(cli.round_delay().is_none());
        assert_eq!(cli.per_probe_timeout(), Duration::from_secs(30));
        assert_eq!(cli.config, PathBuf::from("model_servers.yaml"));
    }

    #[test]
    fn delay_selects_continuous_mode() {
        let cli = Cli::parse_from(["llmprobe", "--delay", "15"]);
        assert_eq!(
            cli.mode(),
            Mode::Continuous {
                delay: Duration::from_secs(15)
            }
        );
        assert_eq!(cli.round_delay(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn only_accepts_comma_separated_list() {
        let cli = Cli::parse_from(["llmprobe", "--only", "scout,qwen"]);
        assert_eq!(cli.only, ["scout", "qwen"]);
    }
}
