use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facetrack_core::detection::domain::anchor::AnchorTable;
use facetrack_core::detection::domain::face_detector::FaceDetector;
use facetrack_core::detection::infrastructure::onnx_blazeface_network::OnnxBlazefaceNetwork;
use facetrack_core::mesh::domain::mesh_refiner::MeshRefiner;
use facetrack_core::mesh::infrastructure::onnx_facemesh_network::OnnxFaceMeshNetwork;
use facetrack_core::pipeline::face_tracker::FaceTracker;
use facetrack_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetrack_core::pipeline::tracker_config::TrackerConfig;
use facetrack_core::pipeline::tracking_loop::TrackingLoop;
use facetrack_core::shared::constants::{DETECTOR_MODEL_NAME, MESH_MODEL_NAME};
use facetrack_core::shared::model_resolver;
use facetrack_core::video::domain::renderer::{NullRenderer, Renderer};
use facetrack_core::video::infrastructure::annotated_image_renderer::AnnotatedImageRenderer;
use facetrack_core::video::infrastructure::image_sequence_source::ImageSequenceSource;

/// Directory searched for models after the user cache.
const BUNDLED_MODELS_DIR: &str = "models";

/// Face region and face mesh tracking over image sequences.
#[derive(Parser)]
#[command(name = "facetrack")]
struct Cli {
    /// Input image, or a directory of images played in file-name order.
    input: PathBuf,

    /// Write annotated frames to this directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Face detector ONNX model (default: resolved from the model cache).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Face mesh ONNX model (default: resolved from the model cache).
    #[arg(long)]
    mesh_model: Option<PathBuf>,

    /// Download URL for the detector model when it is not cached.
    #[arg(long)]
    detector_url: Option<String>,

    /// Download URL for the mesh model when it is not cached.
    #[arg(long)]
    mesh_url: Option<String>,

    /// Detector anchor table as a JSON array of [cx, cy, sx, sy]
    /// (default: the front-camera BlazeFace anchors).
    #[arg(long)]
    anchors: Option<PathBuf>,

    /// JSON configuration file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inference backend: cpu or auto.
    #[arg(long)]
    backend: Option<String>,

    /// Capture width; frames are resized to width x height.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Capture height.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Draw the face rectangle around the mesh.
    #[arg(long)]
    bounding_box: bool,

    /// Fraction of the face size added on each side before the mesh crop.
    #[arg(long)]
    pad_fraction: Option<f32>,

    /// Minimum detector probability (exclusive).
    #[arg(long)]
    detect_threshold: Option<f32>,

    /// Minimum mesh confidence (exclusive) to keep tracking.
    #[arg(long)]
    mesh_threshold: Option<f32>,

    /// Smoothing factor for the fps and latency averages.
    #[arg(long)]
    ema_factor: Option<f64>,

    /// Skip the detector; the mesh searches the whole frame.
    #[arg(long)]
    no_detector: bool,

    /// Skip the mesh; only detector rectangles are produced.
    #[arg(long)]
    no_mesh: bool,

    /// Run detection on every frame.
    #[arg(long)]
    no_tracking: bool,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Treat the mesh face flag as a probability instead of a logit.
    #[arg(long)]
    mesh_confidence_is_probability: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    let config = build_config(&cli)?;
    config.validate()?;

    let detector = if config.use_detector {
        Some(build_detector(&cli, &config)?)
    } else {
        None
    };
    let refiner = if config.mesh_enabled {
        Some(build_refiner(&cli, &config)?)
    } else {
        None
    };
    let tracker = FaceTracker::new(config.clone(), detector, refiner)?;

    let source = ImageSequenceSource::open(&cli.input, config.capture_size())?;
    let renderer: Box<dyn Renderer> = match &cli.output {
        Some(dir) => Box::new(AnnotatedImageRenderer::new(dir)?),
        None => Box::new(NullRenderer),
    };

    let mut tracking = TrackingLoop::new(
        Box::new(source),
        tracker,
        renderer,
        Box::new(StdoutPipelineLogger::default()),
    );
    if let Some(max) = cli.max_frames {
        tracking = tracking.with_max_frames(max);
    }

    let summary = tracking.run()?;
    log::info!(
        "Tracked a face in {}/{} frames ({} failed)",
        summary.faces,
        summary.frames,
        summary.failures
    );
    if let Some(dir) = &cli.output {
        log::info!("Annotated frames written to {}", dir.display());
    }
    Ok(())
}

/// Defaults, then the config file, then explicit flags.
fn build_config(cli: &Cli) -> Result<TrackerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
            TrackerConfig::from_json_str(&json)?
        }
        None => TrackerConfig::default(),
    };

    if let Some(backend) = &cli.backend {
        config.backend = backend.clone();
    }
    if cli.width.is_some() {
        config.width = cli.width;
        config.height = cli.height;
    }
    if cli.bounding_box {
        config.bounding_box = true;
    }
    if let Some(v) = cli.pad_fraction {
        config.pad_fraction = v;
    }
    if let Some(v) = cli.detect_threshold {
        config.detect_threshold = v;
    }
    if let Some(v) = cli.mesh_threshold {
        config.mesh_threshold = v;
    }
    if let Some(v) = cli.ema_factor {
        config.ema_factor = v;
    }
    if cli.no_detector {
        config.use_detector = false;
    }
    if cli.no_mesh {
        config.mesh_enabled = false;
    }
    if cli.no_tracking {
        config.tracking_enabled = false;
    }
    Ok(config)
}

fn build_detector(
    cli: &Cli,
    config: &TrackerConfig,
) -> Result<FaceDetector, Box<dyn std::error::Error>> {
    let anchors = match &cli.anchors {
        Some(path) => AnchorTable::load(path)?,
        None => AnchorTable::blazeface_front(),
    };
    let model_path = model_path(
        cli.detector_model.as_deref(),
        DETECTOR_MODEL_NAME,
        cli.detector_url.as_deref(),
    )?;
    let network = OnnxBlazefaceNetwork::new(&model_path, &config.backend)?;
    Ok(FaceDetector::new(Box::new(network), anchors))
}

fn build_refiner(
    cli: &Cli,
    config: &TrackerConfig,
) -> Result<MeshRefiner, Box<dyn std::error::Error>> {
    let model_path = model_path(
        cli.mesh_model.as_deref(),
        MESH_MODEL_NAME,
        cli.mesh_url.as_deref(),
    )?;
    let network = OnnxFaceMeshNetwork::new(
        &model_path,
        &config.backend,
        !cli.mesh_confidence_is_probability,
    )?;
    Ok(MeshRefiner::new(Box::new(network)))
}

fn model_path(
    explicit: Option<&Path>,
    name: &str,
    url: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(format!("Model not found: {}", path.display()).into());
        }
        return Ok(path.to_path_buf());
    }

    log::info!("Resolving model: {name}");
    let path = model_resolver::resolve(
        name,
        url,
        Some(Path::new(BUNDLED_MODELS_DIR)),
        Some(Box::new(download_progress)),
    )?;
    Ok(path)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
