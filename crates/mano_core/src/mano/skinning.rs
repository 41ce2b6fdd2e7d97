use burn::tensor::{backend::Backend, Float, Tensor};

/// Linear blend skinning.
///
/// Blends the per-joint skinning transforms ``[B, J, 4, 4]`` with the
/// weights ``[V, J]`` into one transform per vertex and applies it to the
/// rest vertices ``[B, V, 3]``.
pub fn linear_blend_skinning<B: Backend>(
    lbs_weights: &Tensor<B, 2, Float>,
    skinning_transforms: Tensor<B, 4, Float>,
    verts: Tensor<B, 3, Float>,
) -> Tensor<B, 3, Float> {
    let [batch, nr_verts, _] = verts.dims();
    let [_, nr_joints] = lbs_weights.dims();
    let device = verts.device();
    let per_vertex = lbs_weights
        .clone()
        .unsqueeze::<3>()
        .expand([batch, nr_verts, nr_joints])
        .matmul(skinning_transforms.reshape([batch, nr_joints, 16]))
        .reshape([batch, nr_verts, 4, 4]);
    let verts_homogen = Tensor::cat(vec![verts, Tensor::ones([batch, nr_verts, 1], &device)], 2).unsqueeze_dim::<4>(3);
    per_vertex
        .matmul(verts_homogen)
        .slice([0..batch, 0..nr_verts, 0..3, 0..1])
        .reshape([batch, nr_verts, 3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use mano_utils::bshare::tensor_to_data_float;

    #[test]
    fn blends_two_translations() {
        let device = Default::default();
        let translate = |x: f32| {
            Tensor::<NdArray, 2>::from_floats(
                [[1.0, 0.0, 0.0, x], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]],
                &device,
            )
        };
        let transforms = Tensor::stack::<3>(vec![translate(1.0), translate(3.0)], 0).unsqueeze::<4>();
        let weights = Tensor::<NdArray, 2>::from_floats([[1.0, 0.0], [0.25, 0.75]], &device);
        let verts = Tensor::<NdArray, 3>::from_floats([[[0.0, 1.0, 2.0], [1.0, 1.0, 1.0]]], &device);
        let skinned = linear_blend_skinning(&weights, transforms, verts);
        assert_eq!(skinned.dims(), [1, 2, 3]);
        assert_eq!(tensor_to_data_float(&skinned), vec![1.0, 1.0, 2.0, 3.5, 1.0, 1.0]);
    }
}
