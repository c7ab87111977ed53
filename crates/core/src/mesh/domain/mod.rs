pub mod face_mesh;
pub mod mesh_network;
pub mod mesh_postprocessor;
pub mod mesh_preprocessor;
pub mod mesh_refiner;
