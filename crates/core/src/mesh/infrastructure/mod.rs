pub mod onnx_facemesh_network;
