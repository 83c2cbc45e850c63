use clap::Parser;
use garde::Validate as _;
use tracing::info;
use yamdb_dal::user::CreateUser;
use yamdb_types::{claim::Role, config::BackendConfig, general::ValidEmail};

use crate::commands::{create_user_repository, Executor};

#[derive(Parser, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "Username")]
    pub username: String,
    #[arg(short, long, help = "User email, confirmation codes are sent there")]
    pub email: ValidEmail,
    #[arg(short, long, default_value = "user", help = "Role of the user: user, moderator or admin")]
    pub role: Role,
    #[arg(long, help = "First name")]
    pub first_name: Option<String>,
    #[arg(long, help = "Last name")]
    pub last_name: Option<String>,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let repository = create_user_repository(&self.backend).await?;
        let mut new_user = CreateUser::new(self.username, self.email).with_role(self.role);
        new_user.first_name = self.first_name;
        new_user.last_name = self.last_name;
        new_user.validate()?;

        let user = repository.create(new_user).await?;
        info!("Created user {} with role {}", user.username, user.role);
        println!("{}", user.username);
        Ok(())
    }
}
