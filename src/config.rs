use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub run_migrations: bool,
    pub server_addr: String,
    /// Header the upstream auth proxy uses to assert the caller's username.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    pub default_admin: Option<AdminConfig>,
}

fn default_auth_header() -> String {
    "x-auth-user".to_string()
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .add_source(Environment::default())
            .build()?;

        s.try_deserialize()
    }
}
