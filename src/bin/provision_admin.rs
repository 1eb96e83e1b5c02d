//! Creates the administrator account from `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
//! Safe to run repeatedly.

use secrecy::ExposeSecret;

use quizmaster_server::{
    config::Config,
    db::Database,
    repositories::{MongoUserRepository, UserRepository},
    services::provisioning::{ensure_admin, ProvisionOutcome},
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if config.is_production() {
        config.validate_for_production();
    }

    if let Err(err) = run(&config).await {
        log::error!("Admin provisioning failed: {}", err);
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> quizmaster_server::errors::AppResult<()> {
    let db = Database::connect(config).await?;
    let users = MongoUserRepository::new(&db);
    users.ensure_indexes().await?;

    match ensure_admin(
        &users,
        &config.admin_email,
        config.admin_password.expose_secret(),
    )
    .await?
    {
        ProvisionOutcome::Created(id) => println!("Created admin {} ({})", config.admin_email, id),
        ProvisionOutcome::AlreadyPresent(id) => {
            println!("Admin {} already exists ({})", config.admin_email, id)
        }
    }
    Ok(())
}
