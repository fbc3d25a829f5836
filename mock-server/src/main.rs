use mock_server::AppConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let config = AppConfig {
        api_key: std::env::var("STRAT_MOCK_API_KEY").ok().filter(|k| !k.is_empty()),
    };
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    mock_server::run_with(listener, config).await
}
