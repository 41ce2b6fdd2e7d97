// #![warn(
//     clippy::all,
//     clippy::pedantic,
// )]
// #![allow(clippy::must_use_candidate)]
//! Differentiable MANO hand layer on burn.
//!
//! [`ManoGPU`] maps a batch of pose parameters (axis-angle, PCA or
//! quaternion) and shape coefficients to posed vertices, 21 hand joints and
//! the absolute transform of every skeleton joint. Model buffers come from a
//! [`data::ManoDataProvider`], usually the ``.npz`` reader in [`data::npz`].
pub mod common;
pub mod data;
pub mod mano;

pub use common::{
    error::{ManoError, Result},
    mano_model::ManoCache,
    mano_options::ManoOptions,
    outputs::{ManoOutput, ManoOutputRest},
    types::{HandSide, RotMode},
};
pub use data::{ManoData, ManoDataProvider};
pub use mano::mano_gpu::ManoGPU;
