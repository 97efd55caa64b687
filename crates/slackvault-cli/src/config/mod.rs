pub mod cli_config;
pub mod settings;

pub use cli_config::CliConfig;
pub use settings::Settings;
