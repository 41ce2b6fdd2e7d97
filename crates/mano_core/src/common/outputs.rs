use burn::{prelude::Backend, tensor::{Float, Tensor}};
/// Result of ``ManoGPU::forward``. Every tensor is batched along dim 0 and
/// stays attached to the autodiff graph when the backend records one.
#[derive(Clone)]
pub struct ManoOutput<B: Backend> {
    /// Skinned vertices ``[B, 778, 3]``
    pub verts: Tensor<B, 3, Float>,
    /// 16 skeleton joints plus 5 fingertips in output order ``[B, 21, 3]``
    pub joints: Tensor<B, 3, Float>,
    pub center_idx: Option<usize>,
    /// Offset that was subtracted; all zeros without a center joint ``[B, 1, 3]``
    pub center_joint: Tensor<B, 3, Float>,
    /// Resolved axis-angle pose including the mean pose ``[B, 48]``
    pub full_poses: Tensor<B, 2, Float>,
    pub betas: Tensor<B, 2, Float>,
    /// Absolute joint transforms, translation re-centered ``[B, 16, 4, 4]``
    pub transforms_abs: Tensor<B, 4, Float>,
}
impl<B: Backend> ManoOutput<B> {
    pub fn batch_size(&self) -> usize {
        self.verts.dims()[0]
    }
    /// Vertices of a single batch item ``[778, 3]``
    pub fn verts_of(&self, item: usize) -> Tensor<B, 2, Float> {
        let [_, nr_verts, _] = self.verts.dims();
        self.verts.clone().slice([item..item + 1, 0..nr_verts, 0..3]).squeeze(0)
    }
    /// Joints of a single batch item ``[21, 3]``
    pub fn joints_of(&self, item: usize) -> Tensor<B, 2, Float> {
        let [_, nr_joints, _] = self.joints.dims();
        self.joints.clone().slice([item..item + 1, 0..nr_joints, 0..3]).squeeze(0)
    }
}
/// Shaped but un-posed hand: the blend-shaped template and its regressed
/// joints.
#[derive(Clone)]
pub struct ManoOutputRest<B: Backend> {
    /// ``[B, 778, 3]``
    pub verts: Tensor<B, 3, Float>,
    /// ``[B, 16, 3]``
    pub joints: Tensor<B, 3, Float>,
}
