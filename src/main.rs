//! Application entry point — Clear Path viewer.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Create the shared state and annotation store.
//! 5. Build the HTTP guidance client from config.
//! 6. Acquire the camera + microphone session (degrades gracefully:
//!    a denial is reported through the guidance line and the app runs
//!    with typed targets only).
//! 7. Spawn the pipeline runner on the tokio runtime.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use clear_path::{
    api::{GuidanceApi, HttpGuidanceApi},
    app::ClearPathApp,
    config::AppConfig,
    media::MediaSession,
    overlay::AnnotationStore,
    pipeline::{command_channel, guidance_text, new_shared_state, PipelineRunner},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    // Video area at camera resolution plus room for the controls below.
    let width = config.camera.width as f32 + 16.0;
    let height = config.camera.height as f32 + 140.0;

    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([width, height])
        .with_min_inner_size([360.0, 360.0])
        .with_title("Clear Path");

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Clear Path starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (network round trips + blocking encode tasks)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Shared state
    let state = new_shared_state();
    let annotations = AnnotationStore::new();

    // 5. Guidance backend client
    let api: Arc<dyn GuidanceApi> = Arc::new(HttpGuidanceApi::from_config(&config.api));

    // 6. Camera + microphone — a denial leaves the app running with typed
    //    targets only, reported through the guidance line.
    let session = match MediaSession::acquire(&config) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("Media devices unavailable: {e}");
            state.lock().unwrap().guidance = guidance_text::CAMERA_DENIED.into();
            None
        }
    };

    // 7. Pipeline runner
    let (command_tx, command_rx) = command_channel();
    {
        let mut runner =
            PipelineRunner::new(Arc::clone(&state), annotations.clone(), Arc::clone(&api));
        if let Some(session) = &session {
            runner = runner.with_media(Arc::new(session.frames()), session.clip());
        }
        rt.spawn(runner.run(command_rx));
    }

    // 8. Build the egui app and run it (blocks until the window is closed).
    //    The session handle moves into the closure so the devices stay
    //    claimed for the lifetime of the window.
    let frames = session.as_ref().map(MediaSession::frames);
    let app = ClearPathApp::new(state, annotations, frames, command_tx);
    let options = native_options(&config);

    eframe::run_native(
        "Clear Path",
        options,
        Box::new(move |_cc| {
            let _session = session;
            Ok(Box::new(app))
        }),
    )
}
