use std::{error::Error, net::SocketAddr};

use axum_server::tls_rustls::RustlsConfig;
use custbook::{infrastructure::CsvFileCustomerRepository, CustbookConfig};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() {
    match CustbookConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            if let Err(error) = serve(&config).await {
                error!("アプリケーションエラー: {}", error);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("アプリケーションエラー: {}", error)
        }
    }
}

async fn serve(config: &CustbookConfig) -> Result<(), Box<dyn Error>> {
    let addr = config.server.address.parse::<SocketAddr>()?;
    let repository = CsvFileCustomerRepository::new(&config.server.data_file);
    let app = custbook_web::app(repository, config.server.static_dir.clone());
    info!("顧客データ: {}", config.server.data_file.display());

    match &config.server.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!("待ち受け開始: https://{}", addr);
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("待ち受け開始: http://{}", addr);
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
