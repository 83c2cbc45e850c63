use std::{path::Path, sync::Arc};

use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use futures::FutureExt;
use tokio::{fs, io::AsyncWriteExt as _};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use yamdb_app::{
    mail::{FileMailer, LogMailer, Mailer},
    state::{AppConfig, AppState},
};
use yamdb_auth::{confirmation::ConfirmationCodes, token::TokenManager};

const SECRET_LEN: usize = 64;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

pub fn main_router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/v1", yamdb_app::api_router())
        .with_state(state)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.backend.ensure_data_dir()?;

    let pool = yamdb_dal::new_pool(&config.database_url()).await?;
    yamdb_dal::migrate(&pool).await?;
    debug!("Database ready at {}", config.database_url());

    let secret = read_secret(&data_dir).await?;
    if secret.len() != SECRET_LEN {
        anyhow::bail!(
            "Secret file in {} has invalid length {}",
            data_dir.display(),
            secret.len()
        );
    }
    let (token_key, code_key) = secret.split_at(SECRET_LEN / 2);
    let tokens = TokenManager::new(token_key, config.token_validity);
    let codes = ConfirmationCodes::new(code_key, config.code_validity);

    let mailer: Arc<dyn Mailer> = match &config.mail_dir {
        Some(dir) => {
            info!("Mails will be stored in {dir:?}");
            Arc::new(FileMailer::new(dir))
        }
        None => Arc::new(LogMailer),
    };

    let app_config = AppConfig {
        base_url: config.base_url.clone(),
        default_page_size: config.default_page_size,
        mail_from: config.mail_from.clone(),
    };

    Ok(AppState::new(app_config, pool, tokens, codes, mailer))
}

async fn read_secret(data_dir: &Path) -> Result<Vec<u8>, std::io::Error> {
    let secret_file = data_dir.join("secret");

    let secret = if fs::try_exists(&secret_file).await? {
        fs::read(&secret_file).await?
    } else {
        let random_bytes = rand::random::<[u8; SECRET_LEN]>();
        #[cfg(unix)]
        let mut file = {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;
            {
                let _f = OpenOptions::new()
                    .mode(0o600)
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&secret_file)?;
            }
            fs::File::options().write(true).open(&secret_file).await?
        };
        #[cfg(not(unix))]
        let mut file = fs::File::create(&secret_file).await?;

        file.write_all(&random_bytes).await?;
        random_bytes.to_vec()
    };
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_secret_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let first = read_secret(dir.path()).await.unwrap();
        assert_eq!(SECRET_LEN, first.len());
        let second = read_secret(dir.path()).await.unwrap();
        assert_eq!(first, second);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(dir.path().join("secret")).unwrap();
            assert_eq!(0o600, meta.permissions().mode() & 0o777);
        }
    }
}
