//! llmprobe エントリポイント

use clap::Parser;
use llmprobe::cli::Cli;
use llmprobe::probe::Prober;
use llmprobe::render::{ConsoleRenderer, InteractiveRenderer, Renderer};
use llmprobe::scheduler::{Mode, Scheduler};
use llmprobe::shutdown::ShutdownSignal;
use llmprobe::status::StatusBoard;
use llmprobe::{config, logging};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _log_guard = match logging::init(!cli.console) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> llmprobe::error::Result<i32> {
    let servers = config::load_servers(&cli.config)?;
    let servers = config::filter_servers(servers, &cli.only)?;

    let shutdown = ShutdownSignal::default();
    shutdown.listen_for_ctrl_c();

    let board = StatusBoard::new(&servers);
    let prober = Prober::new(cli.per_probe_timeout());
    let mode = cli.mode();

    let mut renderer: Box<dyn Renderer> = if cli.console {
        Box::new(ConsoleRenderer::new(cli.round_delay()))
    } else {
        Box::new(InteractiveRenderer::new(
            shutdown.clone(),
            &servers,
            cli.round_delay(),
        ))
    };

    let mut scheduler = Scheduler::new(
        prober,
        servers,
        board,
        mode,
        cli.per_probe_timeout(),
        shutdown.clone(),
    );
    let last = scheduler.run(renderer.as_mut()).await;

    // インタラクティブ時はユーザー終了（またはSIGINT）まで表示を保ち、
    // 端末を復元してから戻る
    if let Err(e) = renderer.close().await {
        error!(error = %e, "renderer shutdown failed");
    }

    let all_failed_one_shot =
        mode == Mode::OneShot && last.map(|s| s.all_failed()).unwrap_or(false);
    Ok(if all_failed_one_shot { 1 } else { 0 })
}
