mod base;
pub mod handle;
pub mod runtime;

pub use base::{
    AudioChunk, AudioChunkStream, EngineError, EngineFactory, EngineResult, EngineVariant,
    InstructTarget, SharedEngine, SynthesisEngine,
};
pub use handle::EngineHandle;
pub use runtime::{ModelInfo, RuntimeEngine, RuntimeEngineConfig, RuntimeEngineFactory};

use tracing::{info, warn};

use crate::errors::AppError;

/// Initialize the first engine variant that accepts the model.
///
/// Factories are tried in order; each failure is logged and the next one is
/// attempted. When none succeeds the combined reasons are returned as
/// [`AppError::EngineInit`], which is fatal at startup.
///
/// # Example
///
/// ```rust,ignore
/// use cosyvoice_gateway::core::engine::{load_engine, runtime_factories};
///
/// let engine = load_engine("iic/CosyVoice-300M", &runtime_factories(config)).await?;
/// ```
pub async fn load_engine(
    model_dir: &str,
    factories: &[Box<dyn EngineFactory>],
) -> Result<SharedEngine, AppError> {
    let mut failures = Vec::with_capacity(factories.len());

    for factory in factories {
        let variant = factory.variant();
        match factory.initialize(model_dir).await {
            Ok(engine) => {
                info!(variant = %variant, model_dir, "Engine initialized");
                return Ok(engine);
            }
            Err(e) => {
                warn!(variant = %variant, model_dir, error = %e, "Engine variant failed to initialize");
                failures.push(format!("{variant}: {e}"));
            }
        }
    }

    if failures.is_empty() {
        return Err(AppError::EngineInit("no engine variants configured".to_string()));
    }

    Err(AppError::EngineInit(format!(
        "no valid model type for {model_dir} ({})",
        failures.join("; ")
    )))
}

/// Runtime-backed factories in startup fallback order.
pub fn runtime_factories(config: RuntimeEngineConfig) -> Vec<Box<dyn EngineFactory>> {
    EngineVariant::FALLBACK_ORDER
        .iter()
        .map(|&variant| {
            Box::new(RuntimeEngineFactory::new(config.clone(), variant)) as Box<dyn EngineFactory>
        })
        .collect()
}
