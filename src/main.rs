use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

use hrms::config::Config;
use hrms::db::{init_db, run_migrations};
use hrms::docs::ApiDoc;
use hrms::routes::{self, RateLimiters};
use hrms::service::users::ensure_bootstrap_hr;
use hrms::state::AppState;
use hrms::store::MySqlStore;
use hrms::utils::clock::SystemClock;

use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

const EMAIL_WARMUP_BATCH: usize = 250;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let state = AppState::new(Arc::new(MySqlStore::new(pool)), Arc::new(SystemClock));

    if let Some(account) = &config.bootstrap_hr {
        match ensure_bootstrap_hr(&state, config.leave_seed, account).await {
            Ok(Some(user)) => info!(user_id = user.id, "Bootstrap HR account ready"),
            Ok(None) => {}
            Err(e) => error!(error = %e, "Failed to create bootstrap HR account"),
        }
    }

    let warmup_state = state.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_state
            .emails
            .warmup(warmup_state.store.as_ref(), EMAIL_WARMUP_BATCH)
            .await
        {
            warn!(error = %e, "Failed to warm up email index");
        }
    });

    let limiters = RateLimiters::from_config(&config)?;
    let server_addr = config.server_addr.clone();
    let state_data = Data::new(state);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let config = config_data.clone();
        let limiters = limiters.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state_data.clone())
            .app_data(config.clone())
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
