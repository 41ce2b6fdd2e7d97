use super::metadata::NUM_OUTPUT_JOINTS;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManoError {
    /// Unsupported or contradictory layer configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Model buffers that are missing, malformed or dimensionally inconsistent.
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Per-call input whose batch size or length does not fit the model.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("center joint index {0} is out of range 0..{max}", max = NUM_OUTPUT_JOINTS)]
    CenterIndex(usize),
}

pub type Result<T> = std::result::Result<T, ManoError>;
