pub mod detection;
pub mod mesh;
pub mod pipeline;
pub mod shared;
pub mod video;
