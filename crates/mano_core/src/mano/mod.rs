pub mod blend;
pub mod kinematics;
pub mod mano_gpu;
pub mod postprocess;
pub mod rotation;
pub mod skinning;
