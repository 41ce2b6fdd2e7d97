use super::{
    error::{ManoError, Result},
    metadata::{HAND_POSE_DIM, NUM_JOINTS, NUM_OUTPUT_JOINTS},
    types::{HandSide, RotMode},
};
use std::str::FromStr;
/// Construction-time options of a MANO layer. None of these can change per
/// call.
#[derive(Clone, Debug, PartialEq)]
pub struct ManoOptions {
    pub rot_mode: RotMode,
    pub side: HandSide,
    /// Output joint subtracted from vertices, joints and transforms
    pub center_idx: Option<usize>,
    /// Hand pose given as PCA coefficients instead of per-joint axis-angles
    pub use_pca: bool,
    /// Number of leading PCA components, only used with `use_pca`
    pub ncomps: usize,
    /// Use a zero mean pose instead of the asset's `hands_mean`
    pub flat_hand_mean: bool,
}
impl Default for ManoOptions {
    fn default() -> Self {
        Self {
            rot_mode: RotMode::AxisAngle,
            side: HandSide::Right,
            center_idx: None,
            use_pca: false,
            ncomps: 15,
            flat_hand_mean: true,
        }
    }
}
impl ManoOptions {
    pub fn new(rot_mode: RotMode, side: HandSide) -> Self {
        Self {
            rot_mode,
            side,
            ..Default::default()
        }
    }
    /// Build options from the textual rotation mode (`axisang` or `quat`)
    pub fn from_mode_str(rot_mode: &str, side: HandSide) -> Result<Self> {
        let rot_mode = RotMode::from_str(rot_mode)
            .map_err(|_| ManoError::Config(format!("unrecognized rotation mode, expect [axisang|quat], got {rot_mode}")))?;
        Ok(Self::new(rot_mode, side))
    }
    #[must_use]
    pub fn with_center_idx(mut self, center_idx: usize) -> Self {
        self.center_idx = Some(center_idx);
        self
    }
    #[must_use]
    pub fn with_pca(mut self, ncomps: usize) -> Self {
        self.use_pca = true;
        self.ncomps = ncomps;
        self
    }
    #[must_use]
    pub fn with_flat_hand_mean(mut self, flat_hand_mean: bool) -> Self {
        self.flat_hand_mean = flat_hand_mean;
        self
    }
    /// Checks everything that can be checked without the model buffers.
    pub fn validate(&self) -> Result<()> {
        if let Some(idx) = self.center_idx {
            if idx >= NUM_OUTPUT_JOINTS {
                return Err(ManoError::CenterIndex(idx));
            }
        }
        if self.use_pca {
            if self.rot_mode == RotMode::Quaternion {
                return Err(ManoError::Config("PCA pose is not supported in quat mode".to_string()));
            }
            if self.ncomps == 0 || self.ncomps > HAND_POSE_DIM {
                return Err(ManoError::Config(format!(
                    "ncomps must be in 1..={HAND_POSE_DIM}, got {}",
                    self.ncomps
                )));
            }
        }
        Ok(())
    }
    /// Length of one raw pose vector under these options
    pub fn pose_dim(&self) -> usize {
        match self.rot_mode {
            RotMode::AxisAngle if self.use_pca => self.rot_mode.rot_dim() + self.ncomps,
            RotMode::AxisAngle => self.rot_mode.rot_dim() + HAND_POSE_DIM,
            RotMode::Quaternion => self.rot_mode.rot_dim() * NUM_JOINTS,
        }
    }
}
