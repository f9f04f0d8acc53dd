//! Camera View demo CLI
//!
//! Drives a camera view through a full session: attach to a simulated
//! display, start, walk a rotation sequence, take pictures and write them
//! to disk, then detach and persist the facing/flash state.

use camera_view::{
    backend::{CameraListener, CaptureError, SessionBackend},
    capture::{CaptureConfig, FacingMode, FileConfig, FlashMode, MockCamera, PictureMode},
    metrics::MetricsRegistry,
    orientation::{Display, Orientation, SimulatedDisplay},
    view::{CameraView, SavedState},
};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "camera-view-demo", version, about = "Run a camera view session")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    facing: Option<FacingArg>,

    #[arg(long, value_enum)]
    flash: Option<FlashArg>,

    #[arg(long, value_enum)]
    picture_mode: Option<PictureModeArg>,

    /// Pictures to take after the rotation sequence.
    #[arg(short = 'n', long)]
    captures: Option<u32>,

    /// Directory JPEGs are written to.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Display rotations to walk through, one picture each.
    #[arg(long, value_delimiter = ',', default_value = "0,90,180,270")]
    rotate: Vec<u16>,

    /// Saved-state file restored at startup and written on exit.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Simulate hardware without a front camera.
    #[arg(long)]
    back_only: bool,

    /// Use a real webcam at this index instead of the simulated camera.
    #[cfg(feature = "camera")]
    #[arg(long)]
    device: Option<u32>,

    /// Print the webcams the native capture API can see and exit.
    #[cfg(feature = "camera")]
    #[arg(long)]
    list_devices: bool,

    /// Keep taking pictures until Ctrl-C.
    #[arg(long)]
    continuous: bool,

    /// Metrics server port (0 to disable).
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FacingArg {
    Back,
    Front,
}

impl From<FacingArg> for FacingMode {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Back => FacingMode::Back,
            FacingArg::Front => FacingMode::Front,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlashArg {
    Off,
    On,
    Auto,
}

impl From<FlashArg> for FlashMode {
    fn from(arg: FlashArg) -> Self {
        match arg {
            FlashArg::Off => FlashMode::Off,
            FlashArg::On => FlashMode::On,
            FlashArg::Auto => FlashMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PictureModeArg {
    Quality,
    Speed,
    /// Leave the mode unset; captures are ignored.
    None,
}

impl From<PictureModeArg> for Option<PictureMode> {
    fn from(arg: PictureModeArg) -> Self {
        match arg {
            PictureModeArg::Quality => Some(PictureMode::Quality),
            PictureModeArg::Speed => Some(PictureMode::Speed),
            PictureModeArg::None => None,
        }
    }
}

/// Writes every picture to a directory with a timestamped name.
struct DiskWriter {
    directory: PathBuf,
    saved: AtomicU64,
    failed: AtomicU64,
}

impl DiskWriter {
    fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            saved: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

impl CameraListener for DiskWriter {
    fn on_camera_opened(&self) {
        info!("Camera opened");
    }

    fn on_camera_closed(&self) {
        info!("Camera closed");
    }

    fn on_picture_taken(&self, jpeg: Vec<u8>) {
        let index = self.saved.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!(
            "{}-{:04}.jpg",
            chrono::Local::now().format("%Y%m%d-%H%M%S%.3f"),
            index
        );
        let path = self.directory.join(name);

        match std::fs::write(&path, &jpeg) {
            Ok(()) => info!(path = %path.display(), bytes = jpeg.len(), "Picture saved"),
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(path = %path.display(), error = %e, "Failed to write picture");
            }
        }
    }

    fn on_error(&self, error: CaptureError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        warn!(%error, "Camera error");
    }
}

fn load_saved_state(path: &Path) -> Option<SavedState> {
    let text = std::fs::read_to_string(path).ok()?;
    match SavedState::decode(&text) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable saved state");
            None
        }
    }
}

fn build_backend(args: &Args, capture: &CaptureConfig) -> Result<SessionBackend, String> {
    #[cfg(feature = "camera")]
    if let Some(index) = args.device {
        let mut config = capture.clone();
        config.back_device = index;
        let camera_config = config.clone();
        return SessionBackend::spawn(config, move || {
            camera_view::capture::WebcamCamera::new(camera_config)
        })
        .map_err(|e| e.to_string());
    }

    let back_only = args.back_only;
    SessionBackend::spawn(capture.clone(), move || {
        if back_only {
            MockCamera::new().with_facings(&[FacingMode::Back])
        } else {
            MockCamera::new()
        }
    })
    .map_err(|e| e.to_string())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Camera View demo v{}", camera_view::VERSION);

    #[cfg(feature = "camera")]
    if args.list_devices {
        match camera_view::capture::list_webcams() {
            Ok(devices) if devices.is_empty() => println!("No webcams found"),
            Ok(devices) => {
                for device in devices {
                    println!("{}", device);
                }
            }
            Err(e) => {
                eprintln!("Failed to list webcams: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    // CLI flags override file values
    if let Some(facing) = args.facing {
        config.view.default_facing = facing.into();
    }
    if let Some(flash) = args.flash {
        config.view.default_flash = flash.into();
    }
    if let Some(mode) = args.picture_mode {
        config.view.picture_mode = mode.into();
    }
    if let Some(captures) = args.captures {
        config.output.captures = captures;
    }
    if let Some(output) = &args.output {
        config.output.directory = output.clone();
    }
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }
    config.output.continuous |= args.continuous;

    let rotations: Vec<Orientation> = args
        .rotate
        .iter()
        .filter_map(|&degrees| match Orientation::try_from(degrees) {
            Ok(orientation) => Some(orientation),
            Err(e) => {
                warn!(%e, "Skipping rotation");
                None
            }
        })
        .collect();

    if let Err(e) = std::fs::create_dir_all(&config.output.directory) {
        eprintln!(
            "Failed to create output directory {}: {}",
            config.output.directory.display(),
            e
        );
        std::process::exit(1);
    }

    let backend = match build_backend(&args, &config.capture) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Failed to create camera backend: {}", e);
            std::process::exit(1);
        }
    };

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    let publish = start_metrics(registry, config.output.metrics_port);

    let saved = args.state.as_deref().and_then(load_saved_state);
    let mut view = CameraView::with_saved_state(backend, config.view.clone(), saved);

    let writer = Arc::new(DiskWriter::new(config.output.directory.clone()));
    view.set_camera_listener(writer.clone());

    let display = Arc::new(SimulatedDisplay::new(Orientation::Deg0));
    let host_display: Arc<dyn Display> = display.clone();
    view.on_attach(Some(host_display));
    view.start();

    info!(
        facing = %view.facing(),
        flash = %view.flash(),
        rotations = rotations.len(),
        "Walking rotation sequence"
    );

    // The sensor feed runs on its own thread, as a platform would deliver it.
    let sensor = view.orientation_detector().clone();
    for orientation in &rotations {
        display.set_rotation(*orientation);
        let feed = sensor.clone();
        let degrees = i32::from(orientation.degrees());
        if std::thread::spawn(move || feed.on_sensor_changed(degrees))
            .join()
            .is_err()
        {
            warn!("Sensor thread panicked");
        }
        view.capture_picture();
    }

    for _ in 0..config.output.captures {
        view.capture_picture();
    }
    view.backend().flush();
    publish(&view);

    if config.output.continuous {
        let running = Arc::new(AtomicBool::new(true));
        let handler_flag = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst)) {
            warn!(error = %e, "Failed to install Ctrl-C handler");
        }

        info!("Capturing continuously; press Ctrl-C to stop");
        let mut turn = 0u8;
        while running.load(Ordering::SeqCst) {
            turn = turn.wrapping_add(1);
            let orientation = Orientation::from_surface_rotation(turn);
            display.set_rotation(orientation);
            sensor.on_sensor_changed(i32::from(orientation.degrees()));

            view.capture_picture();
            view.backend().flush();
            publish(&view);
            std::thread::sleep(Duration::from_millis(500));
        }
    }

    view.stop();
    view.on_detach();
    view.backend().flush();
    publish(&view);

    if let Some(path) = &args.state {
        match view.save_state().encode() {
            Ok(text) => {
                if let Err(e) = std::fs::write(path, text) {
                    warn!(path = %path.display(), error = %e, "Failed to write saved state");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode saved state"),
        }
    }

    let stats = view.stats();
    info!(
        "Session finished: {} pictures saved, {} failures, {} orientation changes",
        writer.saved.load(Ordering::Relaxed),
        writer.failed.load(Ordering::Relaxed),
        stats.orientation_changes
    );
}

/// Pushes a view's stats to wherever metrics go.
type Publisher = Box<dyn Fn(&CameraView<SessionBackend>)>;

/// Starts the metrics exporter if enabled and returns a publisher that
/// pushes the view's stats into it.
#[cfg(feature = "metrics")]
fn start_metrics(registry: MetricsRegistry, port: u16) -> Publisher {
    use camera_view::metrics::{MetricsServer, MetricsServerConfig};

    if port == 0 {
        return Box::new(move |view: &CameraView<SessionBackend>| {
            registry.update(&view.stats())
        });
    }

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Failed to start metrics runtime");
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            error!(error = %e, "Metrics server stopped");
        }
    });

    Box::new(move |view: &CameraView<SessionBackend>| {
        state.blocking_write().update(&view.stats())
    })
}

#[cfg(not(feature = "metrics"))]
fn start_metrics(registry: MetricsRegistry, port: u16) -> Publisher {
    if port != 0 {
        info!("Built without the metrics feature; metrics are logged at debug level only");
    }

    Box::new(move |view: &CameraView<SessionBackend>| {
        registry.update(&view.stats());
        match registry.encode() {
            Ok(output) => tracing::debug!("Metrics:\n{}", output),
            Err(e) => warn!(error = %e, "Failed to encode metrics"),
        }
    })
}
