pub mod camera;
pub mod detect;
pub mod diagnostics;
pub mod overlay;
pub mod sampling;
pub mod session;
pub mod settings;

use std::sync::Arc;

use camera::backend::{CaptureBackend, NullBackend};
use camera::dummy::DummyBackend;
use detect::error::DetectError;
use detect::luma::LumaDetector;
use overlay::surface::LoggingSurface;
use session::error::SessionError;
use session::live::Session;
use settings::store::SettingsStore;
use settings::types::Settings;

/// Create the capture backend for this process.
///
/// When `DUMMY_CAMERA=1` is set, a simulated camera is used instead.
fn create_backend() -> Box<dyn CaptureBackend> {
    if DummyBackend::is_enabled() {
        tracing::info!("using dummy camera backend");
        return Box::new(DummyBackend::new());
    }
    Box::new(NullBackend)
}

/// Build the detector described by the settings.
fn create_detector(settings: &Settings) -> Result<LumaDetector, SessionError> {
    let blob = match &settings.model_path {
        Some(path) => Some(std::fs::read(path).map_err(|e| {
            DetectError::ModelLoad(format!("cannot read {}: {e}", path.display()))
        })?),
        None => None,
    };
    let detector = LumaDetector::init(
        settings.labels.clone(),
        blob.as_deref(),
        settings.frame_spec(),
    )?;
    Ok(detector)
}

/// Load the settings file, writing the defaults if none exists yet.
fn load_settings() -> Result<Settings, SessionError> {
    let store =
        SettingsStore::open(SettingsStore::default_path()).map_err(SessionError::Settings)?;
    match store.write_defaults_if_missing() {
        Ok(true) => tracing::info!("wrote default settings to {}", store.path().display()),
        Ok(false) => tracing::info!("loaded settings from {}", store.path().display()),
        Err(e) => tracing::warn!("failed to write default settings: {e}"),
    }
    Ok(store.get())
}

/// Run a detection session until Ctrl-C.
pub fn run() -> Result<(), SessionError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let settings = load_settings()?;
    let backend = create_backend();
    let detector = Arc::new(create_detector(&settings)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("live-detect")
        .build()
        .map_err(|e| SessionError::Runtime(format!("failed to build runtime: {e}")))?;

    runtime.block_on(async {
        let session = Session::start(&settings, backend.as_ref(), detector, LoggingSurface::new())?;
        tracing::info!("sampling '{}', press Ctrl-C to stop", session.device().name);

        let interrupted = tokio::signal::ctrl_c().await;
        let snapshot = session.stop().await;
        tracing::debug!(
            "final diagnostics: {}",
            serde_json::to_string(&snapshot).unwrap_or_default()
        );
        interrupted.map_err(|e| SessionError::Runtime(format!("signal handler failed: {e}")))
    })
}
