use std::sync::Arc;

use url::Url;
use yamdb_auth::{confirmation::ConfirmationCodes, token::TokenManager};
use yamdb_dal::Pool;

use crate::mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(
        app_config: AppConfig,
        pool: Pool,
        tokens: TokenManager,
        codes: ConfirmationCodes,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                pool,
                tokens,
                codes,
                mailer,
                app_config,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }

    pub fn codes(&self) -> &ConfirmationCodes {
        &self.state.codes
    }

    pub fn build_url(&self, relative_url: &str) -> Result<Url, url::ParseError> {
        self.config().base_url.join(relative_url)
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.state.mailer.as_ref()
    }
}

struct AppStateInner {
    pool: Pool,
    tokens: TokenManager,
    codes: ConfirmationCodes,
    mailer: Arc<dyn Mailer>,
    app_config: AppConfig,
}

pub struct AppConfig {
    /// Public URL of the server, as visible to users
    pub base_url: Url,
    pub default_page_size: u32,
    /// Sender address of confirmation mails
    pub mail_from: String,
}
