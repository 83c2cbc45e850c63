use std::path::PathBuf;

use futures::{future::BoxFuture, FutureExt as _};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Mail date format error: {0}")]
    Format(#[from] time::error::Format),
}

#[derive(Debug, Clone)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Mail {
    fn render(&self) -> Result<String, MailError> {
        let date = OffsetDateTime::now_utc().format(&Rfc2822)?;
        Ok(format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.from, self.to, self.subject, date, self.body
        ))
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: Mail) -> BoxFuture<'_, Result<(), MailError>>;
}

/// Only logs messages, for development
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: Mail) -> BoxFuture<'_, Result<(), MailError>> {
        info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            "Mail message:\n{}",
            mail.body
        );
        futures::future::ready(Ok(())).boxed()
    }
}

/// Writes each message into its own file in given directory
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Mailer for FileMailer {
    fn send(&self, mail: Mail) -> BoxFuture<'_, Result<(), MailError>> {
        async move {
            let content = mail.render()?;
            let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
            let file_name = format!("{stamp}-{}.eml", uuid::Uuid::new_v4().simple());
            tokio::fs::create_dir_all(&self.dir).await?;
            let path = self.dir.join(file_name);
            tokio::fs::write(&path, content).await?;
            debug!("Mail to {} written to {path:?}", mail.to);
            Ok(())
        }
        .boxed()
    }
}
