use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use std::io;
use std::sync::Arc;

use taskdesk::auth::{resolver_for, PasswordHasher};
use taskdesk::config::{Config, StoreBackend};
use taskdesk::store::{MemoryStore, PgStore, Store};
use taskdesk::AppState;

fn startup_error<E: std::fmt::Display>(context: &str, err: E) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn open_store(config: &Config) -> io::Result<Arc<dyn Store>> {
    match (config.store, &config.database) {
        (StoreBackend::Postgres, Some(database)) => {
            let store = PgStore::connect(database)
                .await
                .map_err(|e| startup_error("Failed to connect to database", e))?;
            store
                .migrate()
                .await
                .map_err(|e| startup_error("Failed to run migrations", e))?;
            Ok(Arc::new(store))
        }
        (StoreBackend::Postgres, None) => Err(startup_error(
            "Invalid configuration",
            "postgres backend without DATABASE_URL",
        )),
        (StoreBackend::Memory, _) => {
            log::warn!("Using the in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    let hasher = PasswordHasher::new(config.auth.bcrypt_cost)
        .map_err(|e| startup_error("Invalid configuration", e))?;

    let store = open_store(&config).await?;
    let resolver = resolver_for(&config.auth);
    let state = AppState::new(store.clone(), hasher, resolver);

    if let Some(seed) = &config.admin {
        state
            .accounts()
            .ensure_admin(seed)
            .await
            .map_err(|e| startup_error("Failed to create bootstrap admin", e))?;
    }

    log::info!(
        "Starting TaskDesk server at {} (store: {:?}, auth: {})",
        config.server_url(),
        config.store,
        state.identity().mode()
    );

    let server_state = state.clone();
    let result = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .configure(|cfg| server_state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await;

    store.close().await;
    result
}
