use yamdb_dal::user::UserRepository;
use yamdb_types::config::BackendConfig;

pub mod create_user;
pub mod set_role;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens the database, bringing its schema up to date first
pub(crate) async fn create_user_repository(backend: &BackendConfig) -> anyhow::Result<UserRepository> {
    backend.ensure_data_dir()?;
    let pool = yamdb_dal::new_pool(&backend.database_url()).await?;
    yamdb_dal::migrate(&pool).await?;
    Ok(UserRepository::new(pool))
}
