use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{FeedSettings, RiskLimits, Settings, SimulationSettings};

/// Loads the application configuration from the `uptick.toml` file.
///
/// This function is the primary entry point for this crate. It reads the configuration
/// file, deserializes it into our strongly-typed `Settings` struct, validates it, and
/// returns it.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `uptick.toml`. Every
        // setting has a default, so a missing file is fine.
        .add_source(config::File::with_name("uptick.toml").required(false))
        // Environment variables win over the file, e.g. UPTICK__FEED__URL.
        .add_source(config::Environment::with_prefix("UPTICK").separator("__"))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
