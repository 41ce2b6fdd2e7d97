use crate::common::{
    error::{ManoError, Result},
    mano_options::ManoOptions,
    metadata::{FULL_POSE_DIM, HAND_POSE_DIM, NUM_JOINTS},
    types::RotMode,
};
use burn::tensor::{backend::Backend, Float, Tensor, TensorData};
use log::warn;
use mano_utils::{
    bshare::{tensor_to_data_float, ToBurn},
    numerical::{batch_quat_to_axis_angle, SMALL_ANGLE_SQ},
};
use ndarray as nd;

/// ``[N, 3]`` rotation vectors to their cross-product matrices ``[N, 3, 3]``
pub fn skew_symmetric<B: Backend>(axis_angles: Tensor<B, 2, Float>) -> Tensor<B, 3, Float> {
    let [n, _] = axis_angles.dims();
    let rx = axis_angles.clone().slice([0..n, 0..1]);
    let ry = axis_angles.clone().slice([0..n, 1..2]);
    let rz = axis_angles.slice([0..n, 2..3]);
    let zeros = rx.zeros_like();
    Tensor::cat(
        vec![zeros.clone(), rz.clone().neg(), ry.clone(), rz, zeros.clone(), rx.clone().neg(), ry.neg(), rx, zeros],
        1,
    )
    .reshape([n, 3, 3])
}

/// Exponential map of ``[N, 3]`` rotation vectors to ``[N, 3, 3]`` matrices.
///
/// R = I + A [r]x + B [r]x^2 with A = sin(t)/t and B = (1 - cos(t))/t^2.
/// Below `SMALL_ANGLE_SQ` both coefficients come from their Taylor series,
/// and the exact branch is evaluated on a masked angle so neither branch
/// produces NaN values or gradients at the zero rotation.
pub fn batch_rodrigues<B: Backend>(axis_angles: Tensor<B, 2, Float>) -> Tensor<B, 3, Float> {
    let [n, _] = axis_angles.dims();
    let device = axis_angles.device();
    let theta_sq = axis_angles.clone().powf_scalar(2.0).sum_dim(1);
    let small = theta_sq.clone().lower_elem(SMALL_ANGLE_SQ);
    let safe_theta_sq = theta_sq.clone().mask_fill(small.clone(), 1.0);
    let theta = safe_theta_sq.clone().sqrt();

    let coeff_a = (theta.clone().sin() / theta.clone()).mask_where(small.clone(), theta_sq.clone().mul_scalar(-1.0 / 6.0).add_scalar(1.0));
    let coeff_b = (theta.cos().neg().add_scalar(1.0) / safe_theta_sq).mask_where(small, theta_sq.mul_scalar(-1.0 / 24.0).add_scalar(0.5));
    let coeff_a = coeff_a.reshape([n, 1, 1]).expand([n, 3, 3]);
    let coeff_b = coeff_b.reshape([n, 1, 1]).expand([n, 3, 3]);

    let k = skew_symmetric(axis_angles);
    let k_sq = k.clone().matmul(k.clone());
    let eye = Tensor::<B, 3, Float>::from_data(TensorData::new(vec![1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], [1, 3, 3]), &device)
        .expand([n, 3, 3]);
    eye + k * coeff_a + k_sq * coeff_b
}

/// ``[N, 4]`` quaternions in ``w x y z`` order to ``[N, 3, 3]`` rotation
/// matrices. Quaternions are normalized first.
pub fn quat_to_rotmat<B: Backend>(quats: Tensor<B, 2, Float>) -> Tensor<B, 3, Float> {
    let [n, _] = quats.dims();
    let norm = quats.clone().powf_scalar(2.0).sum_dim(1).sqrt().clamp_min(1e-12);
    let q = quats / norm.expand([n, 4]);
    let w = q.clone().slice([0..n, 0..1]);
    let x = q.clone().slice([0..n, 1..2]);
    let y = q.clone().slice([0..n, 2..3]);
    let z = q.slice([0..n, 3..4]);
    let (xx, yy, zz) = (x.clone() * x.clone(), y.clone() * y.clone(), z.clone() * z.clone());
    let (xy, xz, yz) = (x.clone() * y.clone(), x.clone() * z.clone(), y.clone() * z.clone());
    let (wx, wy, wz) = (w.clone() * x, w.clone() * y, w * z);
    let entries = vec![
        (yy.clone() + zz.clone()).mul_scalar(-2.0).add_scalar(1.0),
        (xy.clone() - wz.clone()).mul_scalar(2.0),
        (xz.clone() + wy.clone()).mul_scalar(2.0),
        (xy + wz).mul_scalar(2.0),
        (xx.clone() + zz).mul_scalar(-2.0).add_scalar(1.0),
        (yz.clone() - wx.clone()).mul_scalar(2.0),
        (xz - wy).mul_scalar(2.0),
        (yz + wx).mul_scalar(2.0),
        (xx + yy).mul_scalar(-2.0).add_scalar(1.0),
    ];
    Tensor::cat(entries, 1).reshape([n, 3, 3])
}

/// Rotations of all joints for one batch of poses.
#[derive(Clone)]
pub struct ResolvedRotations<B: Backend> {
    /// ``[B, 16, 3, 3]``
    pub rot_mats: Tensor<B, 4, Float>,
    /// Axis-angle of every joint with the mean pose included ``[B, 48]``
    pub full_poses: Tensor<B, 2, Float>,
}

/// Turns raw pose parameters into per-joint rotation matrices. The variant
/// is fixed when the layer is built.
#[derive(Clone)]
pub enum RotationResolver<B: Backend> {
    /// ``[B, 3 + 45]``: root and per-joint rotation vectors
    AxisAngle { hands_mean: Tensor<B, 2, Float> },
    /// ``[B, 3 + K]``: root rotation vector and PCA coefficients
    AxisAnglePca {
        hands_mean: Tensor<B, 2, Float>,
        /// ``[K, 45]``
        components: Tensor<B, 2, Float>,
    },
    /// ``[B, 16 * 4]``: one ``w x y z`` quaternion per joint
    Quaternion,
}

impl<B: Backend> RotationResolver<B> {
    pub fn new(options: &ManoOptions, hands_mean: &nd::Array1<f32>, hands_components: &nd::Array2<f32>, device: &B::Device) -> Result<Self> {
        let mean: Tensor<B, 2, Float> = if options.flat_hand_mean {
            Tensor::zeros([1, HAND_POSE_DIM], device)
        } else {
            let hands_mean: Tensor<B, 1, Float> = hands_mean.to_burn(device);
            hands_mean.reshape([1, HAND_POSE_DIM])
        };
        match options.rot_mode {
            RotMode::Quaternion => {
                if options.use_pca {
                    return Err(ManoError::Config("PCA pose is not supported in quat mode".to_string()));
                }
                if !options.flat_hand_mean {
                    warn!("flat_hand_mean=false has no effect in quat mode, the mean pose is ignored");
                }
                Ok(Self::Quaternion)
            }
            RotMode::AxisAngle if options.use_pca => {
                let available = hands_components.nrows();
                if options.ncomps > available {
                    return Err(ManoError::Config(format!(
                        "ncomps={} exceeds the {available} PCA components of the model",
                        options.ncomps
                    )));
                }
                let components: Tensor<B, 2, Float> = hands_components.to_burn(device);
                let components = components.slice([0..options.ncomps, 0..HAND_POSE_DIM]);
                Ok(Self::AxisAnglePca { hands_mean: mean, components })
            }
            RotMode::AxisAngle => Ok(Self::AxisAngle { hands_mean: mean }),
        }
    }

    pub fn rot_mode(&self) -> RotMode {
        match self {
            Self::AxisAngle { .. } | Self::AxisAnglePca { .. } => RotMode::AxisAngle,
            Self::Quaternion => RotMode::Quaternion,
        }
    }

    /// Expected length of one raw pose vector
    pub fn pose_dim(&self) -> usize {
        match self {
            Self::AxisAngle { .. } => 3 + HAND_POSE_DIM,
            Self::AxisAnglePca { components, .. } => 3 + components.dims()[0],
            Self::Quaternion => 4 * NUM_JOINTS,
        }
    }

    /// Resolve a ``[B, pose_dim]`` batch of raw poses.
    pub fn resolve(&self, pose: Tensor<B, 2, Float>) -> Result<ResolvedRotations<B>> {
        let [batch, dim] = pose.dims();
        if dim != self.pose_dim() {
            return Err(ManoError::ShapeMismatch(format!("pose has {dim} components, expected {}", self.pose_dim())));
        }
        match self {
            Self::AxisAngle { hands_mean } => {
                let hand_pose = pose.clone().slice([0..batch, 3..dim]);
                Ok(Self::from_axis_angles(pose, hand_pose, hands_mean))
            }
            Self::AxisAnglePca { hands_mean, components } => {
                let hand_pose = pose.clone().slice([0..batch, 3..dim]).matmul(components.clone());
                Ok(Self::from_axis_angles(pose, hand_pose, hands_mean))
            }
            Self::Quaternion => {
                let device = pose.device();
                let rot_mats = quat_to_rotmat(pose.clone().reshape([batch * NUM_JOINTS, 4])).reshape([batch, NUM_JOINTS, 3, 3]);
                let quats = nd::Array2::from_shape_vec((batch * NUM_JOINTS, 4), tensor_to_data_float(&pose))
                    .map_err(|e| ManoError::ShapeMismatch(format!("quaternion pose: {e}")))?;
                let full_poses: Tensor<B, 2, Float> = batch_quat_to_axis_angle(&quats).to_burn(&device);
                Ok(ResolvedRotations {
                    rot_mats,
                    full_poses: full_poses.reshape([batch, FULL_POSE_DIM]),
                })
            }
        }
    }

    fn from_axis_angles(pose: Tensor<B, 2, Float>, hand_pose: Tensor<B, 2, Float>, hands_mean: &Tensor<B, 2, Float>) -> ResolvedRotations<B> {
        let [batch, _] = pose.dims();
        let root = pose.slice([0..batch, 0..3]);
        let hand_pose = hand_pose + hands_mean.clone().expand([batch, HAND_POSE_DIM]);
        let full_poses = Tensor::cat(vec![root, hand_pose], 1);
        let rot_mats = batch_rodrigues(full_poses.clone().reshape([batch * NUM_JOINTS, 3])).reshape([batch, NUM_JOINTS, 3, 3]);
        ResolvedRotations { rot_mats, full_poses }
    }
}
