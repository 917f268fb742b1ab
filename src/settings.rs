//! Environment-driven configuration, loaded once at startup. Variable names
//! match the deployment scripts: `PORT`, `DOWNLOADS_PATH`,
//! `OBJECT_DETECTION_API`, `OBJECT_DETECTION_TIMEOUT_MS`, `PUBLIC_PATH`,
//! `UPLOADS_PATH`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Listen port for the relay itself
    pub port: u16,

    /// Watched screenshot-drop directory feeding the latest-image endpoint
    pub downloads_path: String,

    /// Upstream inference endpoint, e.g. `https://host/predict`
    pub object_detection_api: String,

    /// Upstream request timeout in milliseconds
    pub object_detection_timeout_ms: u64,

    /// Statically served root; processed artifacts land in `<public>/processed`
    pub public_path: String,

    /// Transient spool for uploaded screenshots
    pub uploads_path: String,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("port", 3000_i64)?
        .set_default("downloads_path", "./downloads")?
        .set_default("object_detection_api", "http://127.0.0.1:8000/predict")?
        .set_default("object_detection_timeout_ms", 120_000_i64)?
        .set_default("public_path", "./public")?
        .set_default("uploads_path", "./uploads")?
        .add_source(config::Environment::default().try_parsing(true))
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let settings = get_configuration().expect("defaults should satisfy Settings");
        assert_eq!(settings.object_detection_timeout_ms, 120_000);
        assert!(settings.object_detection_api.ends_with("/predict"));
        assert_eq!(settings.public_path, "./public");
        assert_eq!(settings.uploads_path, "./uploads");
    }
}
