#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod directory;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;

use crate::auth::{AuthConfig, AuthState};
use crate::db::DirectoryDb;
use crate::directory::{DirectoryService, DirectoryStore, PgDirectoryStore};
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

fn cors_options() -> CorsOptions {
    CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
}

/// Every route the service exposes, with the OpenAPI document at `/openapi.json`.
pub fn api_routes() -> Vec<rocket::Route> {
    openapi_get_routes![
        // Auth routes
        auth::routes::register,
        auth::routes::login,
        // Health routes
        routes::health::health_check,
        // User routes
        routes::users::get_user,
        // Organisation routes
        routes::organisations::list_organisations,
        routes::organisations::get_organisation,
        routes::organisations::create_organisation,
        routes::organisations::add_member,
    ]
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    rocket::build()
        .attach(RequestLogger)
        .attach(DirectoryDb::init())
        .attach(AdHoc::try_on_ignite("CORS", |rocket| async move {
            match cors_options().to_cors() {
                Ok(cors) => Ok(rocket.attach(cors)),
                Err(err) => {
                    log::error!("invalid CORS configuration: {}", err);
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite("Run Migrations", |rocket| async move {
            let Some(db) = DirectoryDb::fetch(&rocket) else {
                log::error!("database pool not available for migrations");
                return Err(rocket);
            };
            match db::run_migrations(db).await {
                Ok(()) => {
                    log::info!("database migrations successful");
                    Ok(rocket)
                }
                Err(e) => {
                    log::error!("database migrations failed: {}", e);
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite("Directory Service", |rocket| async move {
            let Some(db) = DirectoryDb::fetch(&rocket) else {
                log::error!("database pool not available for directory store");
                return Err(rocket);
            };
            let pool = (**db).clone();

            let auth_state = match AuthConfig::from_env().and_then(AuthState::from_config) {
                Ok(state) => state,
                Err(err) => {
                    log::error!("authentication configuration rejected: {}", err);
                    return Err(rocket);
                }
            };
            log::info!(
                "issuing tokens for audience {} as {}",
                auth_state.config.audience,
                auth_state.config.issuer
            );

            let store: Arc<dyn DirectoryStore> = Arc::new(PgDirectoryStore::new(pool));
            match DirectoryService::new(store, &auth_state) {
                Ok(directory) => Ok(rocket.manage(auth_state).manage(directory)),
                Err(err) => {
                    log::error!("failed to initialise directory service: {}", err);
                    Err(rocket)
                }
            }
        }))
        .mount("/", api_routes())
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Directory API", "/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
        .register("/", error::catchers())
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};

    use crate::auth::config::HasherCost;
    use crate::auth::{AuthConfig, AuthState};
    use crate::directory::{DirectoryService, DirectoryStore, InMemoryDirectoryStore};

    pub use database::{TestDatabase, TestDatabaseError};

    pub const TEST_JWT_SECRET: &str = "directory-test-signing-secret-0123456789";

    /// Token settings matching production defaults, with the cheapest Argon2
    /// parameters so tests hash in milliseconds.
    pub fn test_auth_config() -> AuthConfig {
        AuthConfig {
            issuer: "https://directory.test".into(),
            audience: "directory-api".into(),
            access_token_ttl_secs: 24 * 60 * 60,
            token_leeway_secs: 0,
            jwt_secret: TEST_JWT_SECRET.into(),
            hasher_cost: HasherCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
        }
    }

    /// A directory service wired to a given store, plus the auth state the
    /// request guard needs.
    pub struct TestDirectory {
        pub service: DirectoryService,
        pub auth_state: AuthState,
    }

    impl TestDirectory {
        pub fn with_store(store: Arc<dyn DirectoryStore>) -> Self {
            let auth_state =
                AuthState::from_config(test_auth_config()).expect("test auth config is valid");
            let service =
                DirectoryService::new(store, &auth_state).expect("directory service builds");
            Self {
                service,
                auth_state,
            }
        }

        /// Backed by a fresh in-memory store, returned for direct inspection.
        pub fn in_memory() -> (Self, Arc<InMemoryDirectoryStore>) {
            let store = Arc::new(InMemoryDirectoryStore::new());
            (Self::with_store(store.clone()), store)
        }
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, ImageExt, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        use crate::db;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral, fully migrated database for integration tests.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Use the server at `TEST_DATABASE_URL` when set, otherwise launch a
            /// disposable Postgres container.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                match std::env::var("TEST_DATABASE_URL") {
                    Ok(url) => Self::provision(&url, None).await,
                    Err(_) => Self::new().await,
                }
            }

            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().with_tag("16-alpine").start().await?;
                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                Self::provision(&admin_url, Some(container)).await
            }

            async fn provision(
                admin_url: &str,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions = admin_url.parse()?;
                let base_options = base_options.log_statements(LevelFilter::Off);
                let admin_options = base_options.clone().database("postgres");

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("directory_test_{}", Uuid::new_v4().simple());
                sqlx::query(&format!(
                    "CREATE DATABASE \"{}\" TEMPLATE template0",
                    database_name
                ))
                .execute(&admin_pool)
                .await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;

                db::run_migrations(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database(self.admin_options.clone(), &self.database_name).await?;
                self.container.take();
                Ok(())
            }
        }

        async fn drop_database(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            sqlx::query(&format!(
                "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                database_name
            ))
            .execute(&admin_pool)
            .await?;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                // Container-backed databases disappear with the container.
                if self.container.is_some() {
                    return;
                }
                let Some(pool) = self.pool.take() else {
                    return;
                };
                let admin_options = self.admin_options.clone();
                let db_name = self.database_name.clone();
                if let Ok(handle) = Handle::try_current() {
                    handle.spawn(async move {
                        pool.close().await;
                        let _ = drop_database(admin_options, &db_name).await;
                    });
                }
            }
        }
    }

    /// Builder for Rocket instances used by the HTTP integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        routes: Vec<Route>,
        directory: Option<(DirectoryService, AuthState)>,
    }

    impl TestRocketBuilder {
        /// Random port, logging disabled, JSON catchers registered on build.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                routes: Vec::new(),
                directory: None,
            }
        }

        /// Mount routes at `/`; handler paths are absolute.
        pub fn mount_routes(mut self, routes: Vec<Route>) -> Self {
            self.routes.extend(routes);
            self
        }

        /// Manage the directory service and the auth state its guard reads.
        pub fn manage_directory(mut self, directory: &TestDirectory) -> Self {
            self.directory = Some((directory.service.clone(), directory.auth_state.clone()));
            self
        }

        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment)
                .mount("/", self.routes)
                .register("/", crate::error::catchers());

            if let Some((service, auth_state)) = self.directory {
                rocket = rocket.manage(service).manage(auth_state);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
