use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use georelay::detector::DetectionClient;
use georelay::server::{self, AppState};
use georelay::settings;
use georelay::store::ArtifactStore;
use std::io;
use std::time::Duration;
use tracing::info;

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt::init();

    let settings = settings::get_configuration().expect("invalid configuration");

    let detector = DetectionClient::new(
        &settings.object_detection_api,
        Duration::from_millis(settings.object_detection_timeout_ms),
    )
    .expect("failed to build detection client");
    let store = ArtifactStore::new(
        &settings.public_path,
        &settings.uploads_path,
        &settings.downloads_path,
    );
    store.ensure_dirs().await?;

    let state = AppState { detector, store };
    let port = settings.port;

    info!(
        port,
        upstream = state.detector.endpoint(),
        downloads = %state.store.downloads_dir().display(),
        "relay starting"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(server::configure)
            .service(Files::new("/processed", state.store.processed_dir()))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
