//! Model data store: the immutable MANO buffers and the providers that
//! produce them.
pub mod npz;

use crate::common::{
    error::{ManoError, Result},
    metadata::{HAND_POSE_DIM, NUM_JOINTS, NUM_POSE_BLEND_SHAPES, NUM_VERTS},
    types::HandSide,
};
use crate::mano::kinematics::KinematicTree;
use enum_map::EnumMap;
use ndarray as nd;

/// Largest deviation from 1 tolerated for a row of skinning weights
pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Host copy of the buffers of one MANO asset.
#[derive(Clone, Debug)]
pub struct ManoData {
    /// ``[V, 3]``
    pub v_template: nd::Array2<f32>,
    /// ``[V, 3, S]``
    pub shapedirs: nd::Array3<f32>,
    /// ``[V * 3, 135]``
    pub posedirs: nd::Array2<f32>,
    /// ``[J, V]``
    pub joint_regressor: nd::Array2<f32>,
    /// ``[V, J]``
    pub weights: nd::Array2<f32>,
    /// ``[F, 3]``
    pub faces: nd::Array2<u32>,
    pub parents: Vec<Option<usize>>,
    /// ``[45]``
    pub hands_mean: nd::Array1<f32>,
    /// ``[K, 45]``, rows ordered by decreasing variance
    pub hands_components: nd::Array2<f32>,
}

fn check_dims(name: &str, got: &[usize], expected: &[usize]) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(ManoError::ModelLoad(format!("{name} has shape {got:?}, expected {expected:?}")))
    }
}

impl ManoData {
    /// Number of shape coefficients the model accepts
    pub fn num_betas(&self) -> usize {
        self.shapedirs.dim().2
    }
    /// Number of PCA components available in the asset
    pub fn num_pca_components(&self) -> usize {
        self.hands_components.nrows()
    }
    /// Fails with ``ManoError::ModelLoad`` unless every buffer agrees with
    /// V = 778 and J = 16, the skinning weights are normalized and the
    /// parent table forms the MANO tree.
    pub fn validate(&self) -> Result<()> {
        let s = self.num_betas();
        check_dims("v_template", self.v_template.shape(), &[NUM_VERTS, 3])?;
        check_dims("shapedirs", self.shapedirs.shape(), &[NUM_VERTS, 3, s])?;
        if s == 0 {
            return Err(ManoError::ModelLoad("shapedirs has no shape components".to_string()));
        }
        check_dims("posedirs", self.posedirs.shape(), &[NUM_VERTS * 3, NUM_POSE_BLEND_SHAPES])?;
        check_dims("J_regressor", self.joint_regressor.shape(), &[NUM_JOINTS, NUM_VERTS])?;
        check_dims("weights", self.weights.shape(), &[NUM_VERTS, NUM_JOINTS])?;
        check_dims("hands_mean", self.hands_mean.shape(), &[HAND_POSE_DIM])?;
        let k = self.num_pca_components();
        check_dims("hands_components", self.hands_components.shape(), &[k, HAND_POSE_DIM])?;
        if k == 0 || k > HAND_POSE_DIM {
            return Err(ManoError::ModelLoad(format!("hands_components has {k} components")));
        }
        if self.faces.ncols() != 3 {
            return Err(ManoError::ModelLoad(format!("faces has {} columns, expected 3", self.faces.ncols())));
        }
        if let Some(bad) = self.faces.iter().find(|&&f| f as usize >= NUM_VERTS) {
            return Err(ManoError::ModelLoad(format!("face index {bad} out of range")));
        }
        for (v, row) in self.weights.axis_iter(nd::Axis(0)).enumerate() {
            if row.iter().any(|&w| w.is_nan() || w < 0.0) {
                return Err(ManoError::ModelLoad(format!("negative or NaN skinning weight at vertex {v}")));
            }
            let sum: f32 = row.sum();
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(ManoError::ModelLoad(format!("skinning weights of vertex {v} sum to {sum}")));
            }
        }
        if self.parents.len() != NUM_JOINTS {
            return Err(ManoError::ModelLoad(format!("kintree has {} joints, expected {NUM_JOINTS}", self.parents.len())));
        }
        KinematicTree::new(&self.parents)?;
        Ok(())
    }
}

/// Source of the MANO buffers for a given hand side.
pub trait ManoDataProvider {
    fn provide(&self, side: HandSide) -> Result<ManoData>;
}

/// Provider over buffers that are already in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProvider {
    side_to_data: EnumMap<HandSide, Option<ManoData>>,
}
impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn with_side(mut self, side: HandSide, data: ManoData) -> Self {
        self.side_to_data[side] = Some(data);
        self
    }
}
impl ManoDataProvider for InMemoryProvider {
    fn provide(&self, side: HandSide) -> Result<ManoData> {
        self.side_to_data[side]
            .clone()
            .ok_or_else(|| ManoError::ModelLoad(format!("no {side} hand data registered")))
    }
}
