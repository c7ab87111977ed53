pub mod face_tracker;
pub mod metric_smoother;
pub mod pipeline_logger;
pub mod tracker_config;
pub mod tracking_loop;
pub mod tracking_state;
