use crate::{AppSettings, RawSettings};
use color_eyre::eyre::Result;
use std::path::Path;

/// Loads settings from `config/settings.yaml` plus `APP__`-prefixed
/// environment overrides. A `.env` file, if present, is read first so local
/// runs can override the database url and secrets without exporting anything.
pub fn load_app_settings() -> Result<AppSettings> {
    dotenv::from_path(".env").ok();
    let config_path = Path::new("config/settings.yaml").canonicalize()?;

    let builder = config::Config::builder()
        .add_source(config::File::from(config_path))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    let settings: AppSettings = raw_settings.into();

    Ok(settings)
}
