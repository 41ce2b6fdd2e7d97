use crate::common::{
    error::{ManoError, Result},
    metadata::{tip_vertex_ids, NUM_OUTPUT_JOINTS, OUTPUT_JOINT_ORDER},
    types::HandSide,
};
use burn::tensor::{backend::Backend, Float, Int, Tensor};
use mano_utils::bshare::index_tensor;

/// Posed geometry after tips, reorder and centering.
#[derive(Clone)]
pub struct PostProcessed<B: Backend> {
    pub verts: Tensor<B, 3, Float>,
    /// ``[B, 21, 3]`` in output order
    pub joints: Tensor<B, 3, Float>,
    /// ``[B, 1, 3]``
    pub center_joint: Tensor<B, 3, Float>,
    pub transforms_abs: Tensor<B, 4, Float>,
}

/// Appends the fingertips, reorders the joints and optionally re-centers
/// everything on one output joint.
#[derive(Clone)]
pub struct PostProcessor<B: Backend> {
    tip_ids: Tensor<B, 1, Int>,
    joint_order: Tensor<B, 1, Int>,
    center_idx: Option<usize>,
}
impl<B: Backend> PostProcessor<B> {
    pub fn new(side: HandSide, center_idx: Option<usize>, device: &B::Device) -> Result<Self> {
        if let Some(idx) = center_idx {
            if idx >= NUM_OUTPUT_JOINTS {
                return Err(ManoError::CenterIndex(idx));
            }
        }
        Ok(Self {
            tip_ids: index_tensor(&tip_vertex_ids(side), device),
            joint_order: index_tensor(&OUTPUT_JOINT_ORDER, device),
            center_idx,
        })
    }
    pub fn center_idx(&self) -> Option<usize> {
        self.center_idx
    }
    /// ``verts [B, V, 3]``, ``skeleton [B, 16, 3]`` and ``transforms_abs
    /// [B, 16, 4, 4]`` come straight out of skinning and the chain.
    pub fn apply(&self, verts: Tensor<B, 3, Float>, skeleton: Tensor<B, 3, Float>, transforms_abs: Tensor<B, 4, Float>) -> PostProcessed<B> {
        let [batch, nr_verts, _] = verts.dims();
        let tips = verts.clone().select(1, self.tip_ids.clone());
        let joints = Tensor::cat(vec![skeleton, tips], 1).select(1, self.joint_order.clone());
        let Some(c) = self.center_idx else {
            return PostProcessed {
                verts,
                joints,
                center_joint: Tensor::zeros([batch, 1, 3], &transforms_abs.device()),
                transforms_abs,
            };
        };
        let [_, nr_joints, _] = joints.dims();
        let [_, nr_transforms, _, _] = transforms_abs.dims();
        let device = joints.device();
        let center_joint = joints.clone().slice([0..batch, c..c + 1, 0..3]);
        let verts = verts - center_joint.clone().expand([batch, nr_verts, 3]);
        let joints = joints.clone() - center_joint.clone().expand([batch, nr_joints, 3]);
        // only the translation column moves, rotations are untouched
        let translation = Tensor::cat(
            vec![center_joint.clone().reshape([batch, 1, 3, 1]), Tensor::zeros([batch, 1, 1, 1], &device)],
            2,
        );
        let offset = Tensor::cat(vec![Tensor::zeros([batch, 1, 4, 3], &device), translation], 3).expand([batch, nr_transforms, 4, 4]);
        PostProcessed {
            verts,
            joints,
            center_joint,
            transforms_abs: transforms_abs - offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;
    use mano_utils::bshare::tensor_to_data_float;

    fn inputs(device: &<NdArray as Backend>::Device) -> (Tensor<NdArray, 3>, Tensor<NdArray, 3>, Tensor<NdArray, 4>) {
        // vertex v sits at (v, 0, 0), skeleton joint j at (-j, 0, 0)
        #[allow(clippy::cast_precision_loss)]
        let verts: Vec<f32> = (0..778).flat_map(|v| [v as f32, 0.0, 0.0]).collect();
        #[allow(clippy::cast_precision_loss)]
        let skeleton: Vec<f32> = (0..16).flat_map(|j| [-(j as f32), 0.0, 0.0]).collect();
        let eye = Tensor::<NdArray, 1>::from_floats(
            [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            device,
        )
        .reshape([1, 1, 4, 4])
        .expand([1, 16, 4, 4]);
        (
            Tensor::from_data(TensorData::new(verts, [1, 778, 3]), device),
            Tensor::from_data(TensorData::new(skeleton, [1, 16, 3]), device),
            eye,
        )
    }

    #[test]
    fn appends_tips_and_reorders() {
        let device = Default::default();
        let (verts, skeleton, transforms) = inputs(&device);
        let post = PostProcessor::<NdArray>::new(HandSide::Left, None, &device).unwrap();
        let out = post.apply(verts, skeleton, transforms);
        let xs: Vec<f32> = tensor_to_data_float(&out.joints).chunks(3).map(|p| p[0]).collect();
        // wrist, thumb1..3, thumb tip, index1..3, index tip, ...
        assert_eq!(&xs[..9], &[0.0, -13.0, -14.0, -15.0, 745.0, -1.0, -2.0, -3.0, 317.0]);
        assert_eq!(xs[12], 445.0);
        assert!(tensor_to_data_float(&out.center_joint).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn centering_moves_translations_only() {
        let device = Default::default();
        let (verts, skeleton, transforms) = inputs(&device);
        let post = PostProcessor::<NdArray>::new(HandSide::Right, Some(4), &device).unwrap();
        let out = post.apply(verts, skeleton, transforms);
        let joints = tensor_to_data_float(&out.joints);
        assert_eq!(&joints[12..15], &[0.0, 0.0, 0.0]);
        assert_eq!(tensor_to_data_float(&out.center_joint), vec![745.0, 0.0, 0.0]);
        let tf = tensor_to_data_float(&out.transforms_abs);
        assert_eq!(&tf[..16], &[1.0, 0.0, 0.0, -745.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(matches!(PostProcessor::<NdArray>::new(HandSide::Right, Some(21), &device), Err(ManoError::CenterIndex(21))));
    }
}
