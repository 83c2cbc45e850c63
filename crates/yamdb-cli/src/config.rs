use clap::{Parser, Subcommand};

use crate::commands::{create_user::CreateUserCmd, set_role::SetRoleCmd};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for yamdb - administrative commands working directly on the database."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    CreateUser(CreateUserCmd),
    SetRole(SetRoleCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::CreateUser(cmd) => cmd.run().await,
            Command::SetRole(cmd) => cmd.run().await,
        }
    }
}
