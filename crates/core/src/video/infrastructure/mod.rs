pub mod annotated_image_renderer;
pub mod image_sequence_source;
