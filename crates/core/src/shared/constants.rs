/// Square input resolution of the face detector network.
pub const DETECT_SIZE: u32 = 128;

/// Square input resolution of the face mesh network.
pub const MESH_SIZE: u32 = 192;

/// Landmarks produced by the face mesh network.
pub const MESH_LANDMARKS: usize = 468;

/// Values per detector prediction row that the decoder reads:
/// `[logit, dx, dy, dw, dh]`.
pub const DETECTION_FIELDS: usize = 5;

pub const DEFAULT_PAD_FRACTION: f32 = 0.25;
pub const DEFAULT_DETECT_THRESHOLD: f32 = 0.9;
pub const DEFAULT_MESH_THRESHOLD: f32 = 0.5;
/// `f64` like the millisecond timestamps and rates it smooths; the other
/// defaults compare against `f32` network outputs.
pub const DEFAULT_EMA_FACTOR: f64 = 0.05;

/// Accepted values of the `backend` option.
pub const BACKENDS: &[&str] = &["cpu", "auto"];

pub const DETECTOR_MODEL_NAME: &str = "blazeface_front.onnx";
pub const MESH_MODEL_NAME: &str = "face_landmark.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
