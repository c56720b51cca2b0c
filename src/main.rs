// --- Olimpiada: servidor de la API ---

use olimpiada::config::Config;
use olimpiada::run_server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,actix_web=info")))
        .init();

    let config = match Config::desde_entorno() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("configuración inválida: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };
    tracing::info!("Iniciando servidor en http://{}", config.bind);
    run_server(config).await
}
