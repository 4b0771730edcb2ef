use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// Location of the static demo documents served by the API
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataConfig {
    pub samples_dir: PathBuf,
    pub one_way_file: String,
    pub round_trip_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            samples_dir: PathBuf::from("samples"),
            one_way_file: "RS_ViaOW.xml".to_string(),
            round_trip_file: "RS_Via-3.xml".to_string(),
        }
    }
}

impl DataConfig {
    pub fn one_way_path(&self) -> PathBuf {
        self.samples_dir.join(&self.one_way_file)
    }

    pub fn round_trip_path(&self) -> PathBuf {
        self.samples_dir.join(&self.round_trip_file)
    }
}

impl AppConfig {
    /// Built-in defaults, then `config/default`, then `config/{RUN_MODE}`,
    /// then `AVIA_`-prefixed environment variables (`AVIA_SERVER__PORT=9000`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                config::Environment::with_prefix("AVIA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
