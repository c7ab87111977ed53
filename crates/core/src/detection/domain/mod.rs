pub mod anchor;
pub mod detector_network;
pub mod detector_postprocessor;
pub mod detector_preprocessor;
pub mod face_detector;
