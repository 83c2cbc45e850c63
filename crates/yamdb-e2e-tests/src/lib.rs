use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow};
use rand::Rng as _;
use reqwest::{
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::{debug, info};
use yamdb_dal::{
    Pool,
    user::{CreateUser, UserRepository},
};
use yamdb_server::config::{Parser, ServerConfig};
use yamdb_types::{claim::Role, general::ValidEmail};

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let mail_dir = tmp_data_dir.path().join("mail").to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let base_url = format!("http://127.0.0.1:{}/", port);
    let args = &[
        "yamdb-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--base-url",
        &base_url,
        "--mail-dir",
        &mail_dir,
        "--no-cors",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    test_config(test_name, &base_dir)
}

/// Running server, stopped when dropped
pub struct TestServer {
    pub base_url: Url,
    pub mail_dir: PathBuf,
    pool: Pool,
    _shutdown: oneshot::Sender<()>,
}

pub async fn spawn_server(args: ServerConfig) -> Result<TestServer> {
    let base_url = args.base_url.clone();
    let mail_dir = args.mail_dir.clone().context("Mail dir must be set")?;
    let state = yamdb_server::build_state(&args).await?;
    let pool = state.pool().clone();
    let (tx, rx) = oneshot::channel::<()>();
    let shutdown = async move {
        let _ = rx.await;
    };
    tokio::spawn(async move {
        if let Err(e) = yamdb_server::run_graceful_with_state(args, state, shutdown).await {
            tracing::error!("Server error: {e}");
        }
    });

    let client = reqwest::Client::new();
    let health = base_url.join("health")?;
    let mut attempts = 50;
    loop {
        match client.get(health.clone()).send().await {
            Ok(response) if response.status().is_success() => break,
            _ if attempts > 0 => {
                attempts -= 1;
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            _ => return Err(anyhow!("Server did not start")),
        }
    }
    info!("Test server running at {base_url}");

    Ok(TestServer {
        base_url,
        mail_dir,
        pool,
        _shutdown: tx,
    })
}

pub async fn launch_env(test_name: &str) -> Result<(TestServer, ConfigGuard)> {
    let (args, guard) = prepare_env(test_name).await?;
    let server = spawn_server(args).await?;
    Ok((server, guard))
}

impl TestServer {
    /// URL of versioned API endpoint, path is relative like `titles/`
    pub fn api(&self, path: &str) -> Url {
        self.base_url
            .join("v1/")
            .and_then(|u| u.join(path))
            .expect("Valid API path")
    }

    /// Creates user directly in database, bypassing signup
    pub async fn create_user(&self, username: &str, role: Role) -> Result<()> {
        let email = ValidEmail::cheat(format!("{username}@example.com"));
        let repository = UserRepository::new(self.pool.clone());
        repository
            .create(CreateUser::new(username, email).with_role(role))
            .await?;
        Ok(())
    }

    /// Latest confirmation code mailed to given address
    pub async fn read_code(&self, email: &str) -> Result<String> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.mail_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            files.push(entry.path());
        }
        files.sort();

        for file in files.iter().rev() {
            let content = tokio::fs::read_to_string(file).await?;
            if !content.contains(&format!("To: {email}\r\n")) {
                continue;
            }
            if let Some(code) = content
                .lines()
                .find_map(|line| line.strip_prefix("Confirmation code: "))
            {
                return Ok(code.trim().to_string());
            }
        }
        Err(anyhow!("No confirmation mail for {email}"))
    }

    /// Goes through signup and token exchange, returning the access token
    pub async fn obtain_token(&self, username: &str) -> Result<String> {
        let email = format!("{username}@example.com");
        let client = reqwest::Client::new();
        let response = client
            .post(self.api("auth/signup/"))
            .json(&json!({"username": username, "email": email}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Signup failed with {}: {}",
                response.status(),
                response.text().await?
            ));
        }

        let code = self.read_code(&email).await?;
        debug!("Got confirmation code for {username}");
        let response = client
            .post(self.api("auth/token/"))
            .json(&json!({"username": username, "confirmation_code": code}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("Token exchange failed with {}", response.status()));
        }
        let body: serde_json::Value = response.json().await?;
        body["token"]
            .as_str()
            .map(|t| t.to_string())
            .ok_or_else(|| anyhow!("Missing token in response"))
    }

    /// Client sending given bearer token with every request
    pub fn client_with_token(&self, token: &str) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(client)
    }

    /// Creates user with given role and returns client authenticated as that user
    pub async fn user_client(&self, username: &str, role: Role) -> Result<reqwest::Client> {
        self.create_user(username, role).await?;
        let token = self.obtain_token(username).await?;
        self.client_with_token(&token)
    }
}
