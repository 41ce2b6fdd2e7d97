use burn::tensor::{backend::Backend, Float, Tensor, TensorData};

/// Template plus shape offsets: ``[V, 3] + reshape([V*3, S] x betas^T)``,
/// returned as ``[B, V, 3]``.
pub fn shape_blend<B: Backend>(verts_template: &Tensor<B, 2, Float>, shape_dirs: &Tensor<B, 2, Float>, betas: Tensor<B, 2, Float>) -> Tensor<B, 3, Float> {
    let [batch, _] = betas.dims();
    let [nr_verts, _] = verts_template.dims();
    let offsets = shape_dirs.clone().matmul(betas.transpose()).transpose().reshape([batch, nr_verts, 3]);
    offsets + verts_template.clone().unsqueeze::<3>().expand([batch, nr_verts, 3])
}

/// Regress ``[B, J, 3]`` joint locations from ``[B, V, 3]`` vertices.
pub fn regress_joints<B: Backend>(joint_regressor: &Tensor<B, 2, Float>, verts: Tensor<B, 3, Float>) -> Tensor<B, 3, Float> {
    let [batch, nr_verts, _] = verts.dims();
    let [nr_joints, _] = joint_regressor.dims();
    joint_regressor.clone().unsqueeze::<3>().expand([batch, nr_joints, nr_verts]).matmul(verts)
}

/// Flattened ``R - I`` of the non-root joints, row-major per joint ``[B, (J-1)*9]``.
pub fn pose_feature<B: Backend>(rot_mats: Tensor<B, 4, Float>) -> Tensor<B, 2, Float> {
    let [batch, nr_joints, _, _] = rot_mats.dims();
    let device = rot_mats.device();
    let eye = Tensor::<B, 4, Float>::from_data(TensorData::new(vec![1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], [1, 1, 3, 3]), &device)
        .expand([batch, nr_joints - 1, 3, 3]);
    (rot_mats.slice([0..batch, 1..nr_joints, 0..3, 0..3]) - eye).reshape([batch, (nr_joints - 1) * 9])
}

/// Pose corrective offsets ``[B, V, 3]`` from ``[V*3, P]`` directions and a
/// ``[B, P]`` pose feature.
pub fn pose_blend<B: Backend>(pose_dirs: &Tensor<B, 2, Float>, pose_feature: Tensor<B, 2, Float>) -> Tensor<B, 3, Float> {
    let [batch, _] = pose_feature.dims();
    let [nr_rows, _] = pose_dirs.dims();
    pose_dirs.clone().matmul(pose_feature.transpose()).transpose().reshape([batch, nr_rows / 3, 3])
}
