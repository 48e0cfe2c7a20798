mod commands;
mod view;

use std::{io, process::ExitCode};

use clap::Parser;
use custbook::{infrastructure::HttpCustomerRepository, CustbookConfig};
use tracing::{error, Level};

use commands::{confirm_delete, Cli, Session};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match CustbookConfig::load() {
        Ok(config) => {
            init_tracing(Level::from(&config.logger.level));
            config
        }
        Err(error) => {
            init_tracing(Level::WARN);
            error!("設定読み込みエラー: {}", error);
            CustbookConfig::default()
        }
    };

    let url = cli.url.clone().unwrap_or(config.client.url);
    let mut session = Session::new(HttpCustomerRepository::new(&url), io::stdout().lock());
    let confirm = || confirm_delete(io::stdin().lock(), io::stderr());
    match session.run(cli.command, confirm).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            error!("アプリケーションエラー: {}", error);
            ExitCode::FAILURE
        }
    }
}

/// 標準出力は表示に使うのでログは標準エラーに出す
fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}
