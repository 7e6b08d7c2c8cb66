mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, LogSettings, ServerSettings, Settings};

/// Prefix of the environment variables that override configuration,
/// e.g. `TINYMQ_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "TINYMQ";

/// Load `config/default.toml` (optional) overlaid by `TINYMQ_*` environment
/// variables. Anything neither source sets keeps its default.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("broker.topics")
                .try_parsing(true),
        );

    let config = builder.build()?;

    let settings = config.try_deserialize::<PartialSettings>()?.resolve();

    if settings.broker.max_connections == 0 {
        return Err(ConfigError::Message(
            "broker.max_connections must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}
