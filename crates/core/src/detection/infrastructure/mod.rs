pub mod execution_provider;
pub mod onnx_blazeface_network;
