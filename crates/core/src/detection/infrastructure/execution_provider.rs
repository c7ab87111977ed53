use ort::execution_providers::ExecutionProviderDispatch;

use crate::shared::constants::BACKENDS;

/// Maps the opaque `backend` option to ONNX Runtime execution providers.
///
/// `cpu` registers nothing (ORT's default CPU provider); `auto` picks the
/// platform-preferred accelerator, falling back to CPU when unavailable.
pub fn execution_providers_for(backend: &str) -> Result<Vec<ExecutionProviderDispatch>, String> {
    match backend {
        "cpu" => Ok(Vec::new()),
        "auto" => Ok(preferred_execution_providers()),
        other => Err(format!(
            "unknown backend '{other}', expected one of: {}",
            BACKENDS.join(", ")
        )),
    }
}

/// Return the preferred ONNX execution providers for the current platform.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Opens an ONNX model with the providers selected by `backend`.
pub fn open_session(
    model_path: &std::path::Path,
    backend: &str,
) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let providers = execution_providers_for(backend)?;
    let session = ort::session::Session::builder()?
        .with_execution_providers(providers)?
        .commit_from_file(model_path)?;
    log::info!("Loaded {} ({backend} backend)", model_path.display());
    Ok(session)
}
