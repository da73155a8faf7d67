#[macro_use]
extern crate rocket;

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod setup;

use crate::config::{DbConfig, ServerConfig};
use crate::db::CustomerDb;
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let db_config = DbConfig::from_env();
    let server_config = ServerConfig::from_env();
    log::info!("using database {db_config}");

    let figment = rocket::Config::figment()
        .join(("databases.customer_db.url", db_config.connection_url()));

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&server_config.allowed_origins))
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Options,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&[
            "Authorization",
            "Content-Type",
            "X-Requested-With",
            "Accept",
        ]))
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::custom(figment)
        .attach(RequestLogger)
        .attach(CustomerDb::init())
        .attach(cors)
        // The schema is owned by `setup_db`; only report when it is missing.
        .attach(AdHoc::on_liftoff("Check Schema", |rocket| {
            Box::pin(async move {
                let Some(db) = CustomerDb::fetch(rocket) else {
                    log::error!("database pool not available for schema check");
                    return;
                };
                match setup::schema::schema_present(db).await {
                    Ok(true) => log::info!("customer schema present"),
                    Ok(false) => log::warn!(
                        "tables users/orders not found; run setup_db before serving requests"
                    ),
                    Err(err) => log::warn!("schema check failed: {err}"),
                }
            })
        }))
        .mount("/api", api_routes())
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Customer API", "../../openapi.json")],
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
}

/// Every REST route plus the generated `openapi.json`.
pub fn api_routes() -> Vec<rocket::Route> {
    openapi_get_routes![
        // Health routes
        routes::health::health_check,
        // Customer routes
        routes::customers::list_customers,
        routes::customers::customer_count,
        routes::customers::get_customer,
        routes::customers::customer_exists,
        // Order routes
        routes::orders::list_customer_orders,
        routes::orders::count_customer_orders,
        routes::orders::get_customer_order,
        routes::orders::get_order,
    ]
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use crate::db::CustomerDb;
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::Database;
    use rocket_db_pools::sqlx::{self, PgPool};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Seed customers and orders directly, bypassing the CSV loader.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a customer with the given id; the remaining columns get
        /// plausible fixed values.
        pub async fn insert_customer(
            &self,
            id: i32,
            first_name: &str,
            last_name: &str,
            email: &str,
            country: Option<&str>,
        ) -> Result<(), sqlx::Error> {
            sqlx::query(
                r#"INSERT INTO users (
                       id, first_name, last_name, email, age, gender, city, country, created_at
                   ) VALUES ($1, $2, $3, $4, 35, 'F', 'Springfield', $5, '2023-01-01T00:00:00Z')"#,
            )
            .bind(id)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(country.map(str::to_string))
            .execute(self.pool)
            .await?;

            Ok(())
        }

        /// Insert an order for `user_id`. `created_at` is an RFC 3339 string.
        pub async fn insert_order(
            &self,
            order_id: i32,
            user_id: i32,
            status: &str,
            created_at: &str,
        ) -> Result<(), sqlx::Error> {
            sqlx::query(
                r#"INSERT INTO orders (order_id, user_id, status, created_at, num_of_item)
                   VALUES ($1, $2, $3, $4::timestamptz, 1)"#,
            )
            .bind(order_id)
            .bind(user_id)
            .bind(status)
            .bind(created_at)
            .execute(self.pool)
            .await?;

            Ok(())
        }
    }

    pub mod database {
        use crate::setup::{SetupError, schema};
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::{ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner};
        use testcontainers_modules::postgres::Postgres;
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("schema error: {0}")]
            Setup(#[from] SetupError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral database with the customer schema already created.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            url: String,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Launch a disposable Postgres container and create a fresh database in it.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let admin_options: PgConnectOptions =
                    admin_url.parse().map_err(TestDatabaseError::Sqlx)?;
                let admin_options = admin_options.log_statements(LevelFilter::Off);

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("customers_{}", Uuid::new_v4().simple());
                sqlx::query(&format!("CREATE DATABASE \"{}\"", database_name))
                    .execute(&admin_pool)
                    .await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(admin_options.clone().database(&database_name))
                    .await?;

                {
                    let mut conn = pool.acquire().await?;
                    schema::recreate_schema(&mut conn).await?;
                }

                Ok(Self {
                    pool: Some(pool),
                    url: format!(
                        "postgres://postgres:postgres@{}:{}/{}",
                        host, port, database_name
                    ),
                    admin_options,
                    database_name,
                    container: Some(container),
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            /// Connection URL for Rocket's `customer_db` pool.
            pub fn url(&self) -> &str {
                &self.url
            }

            /// Close pool connections, drop the database and stop the container.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database(self.admin_options.clone(), &self.database_name).await?;

                if let Some(container) = self.container.take() {
                    drop(container);
                }

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

            sqlx::query(&format!("DROP DATABASE \"{}\" WITH (FORCE)", database_name))
                .execute(&admin_pool)
                .await?;
            admin_pool.close().await;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                        });
                    }
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        with_db: bool,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                with_db: false,
            }
        }

        /// Mount routes under `/api`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api".to_string(), routes));
            self
        }

        /// Point the `customer_db` pool at `url` and attach it.
        pub fn with_database(mut self, url: &str) -> Self {
            self.figment = self
                .figment
                .merge(("databases.customer_db.url", url))
                .merge(("databases.customer_db.max_connections", 5));
            self.with_db = true;
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            if self.with_db {
                rocket = rocket.attach(CustomerDb::init());
            }

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            rocket
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
