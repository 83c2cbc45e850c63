use clap::Args;
use tracing::info;
use yamdb_dal::user::UpdateUser;
use yamdb_types::{claim::Role, config::BackendConfig};

use crate::commands::{create_user_repository, Executor};

#[derive(Args, Debug)]
pub struct SetRoleCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "Username")]
    pub username: String,
    #[arg(short, long, help = "New role: user, moderator or admin")]
    pub role: Role,
}

impl Executor for SetRoleCmd {
    async fn run(self) -> anyhow::Result<()> {
        let repository = create_user_repository(&self.backend).await?;
        let user = repository.find_by_username(&self.username).await?;
        let update = UpdateUser {
            role: Some(self.role),
            ..Default::default()
        };
        let user = repository.update(user.id, update).await?;
        info!("User {} has now role {}", user.username, user.role);
        Ok(())
    }
}
