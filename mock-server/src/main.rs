use mock_server::ServerConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let config = ServerConfig {
        api_key: std::env::var("FLICKR_API_KEY").unwrap_or_else(|_| "dev-api-key".to_string()),
        secret: std::env::var("FLICKR_SECRET").unwrap_or_else(|_| "dev-secret".to_string()),
    };
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}, REST root http://{addr}/services");
    mock_server::run(listener, config).await
}
