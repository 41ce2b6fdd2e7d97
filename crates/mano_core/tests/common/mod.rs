#![allow(dead_code)]
#![allow(clippy::cast_precision_loss)]
use burn::backend::NdArray;
use burn::tensor::{backend::Backend, Float, Tensor, TensorData};
use mano_core::{
    common::metadata::{HAND_POSE_DIM, NUM_JOINTS, NUM_POSE_BLEND_SHAPES, NUM_VERTS, PARENT_ID_PER_JOINT, SHAPE_SPACE_DIM},
    ManoData, ManoGPU, ManoOptions,
};
use ndarray as nd;

pub type TestBackend = NdArray;

/// Deterministic stand-in for a MANO asset with the real dimensions.
pub fn synthetic_data() -> ManoData {
    let v_template = nd::Array2::from_shape_fn((NUM_VERTS, 3), |(v, d)| 0.1 * (0.7 * v as f32 + 1.3 * d as f32 + 0.5).sin());
    let shapedirs = nd::Array3::from_shape_fn((NUM_VERTS, 3, SHAPE_SPACE_DIM), |(v, d, s)| {
        0.01 * (0.11 * v as f32 + 0.37 * d as f32 + 0.53 * s as f32).sin()
    });
    let posedirs = nd::Array2::from_shape_fn((NUM_VERTS * 3, NUM_POSE_BLEND_SHAPES), |(r, c)| 0.001 * (0.013 * r as f32 + 0.071 * c as f32).cos());
    // joint j averages every vertex v with v % 16 == j
    let mut joint_regressor = nd::Array2::<f32>::zeros((NUM_JOINTS, NUM_VERTS));
    for j in 0..NUM_JOINTS {
        let members: Vec<usize> = (0..NUM_VERTS).filter(|v| v % NUM_JOINTS == j).collect();
        for &v in &members {
            joint_regressor[[j, v]] = 1.0 / members.len() as f32;
        }
    }
    let mut weights = nd::Array2::<f32>::zeros((NUM_VERTS, NUM_JOINTS));
    for v in 0..NUM_VERTS {
        weights[[v, v % NUM_JOINTS]] = 0.7;
        weights[[v, (v + 1) % NUM_JOINTS]] = 0.3;
    }
    let faces = nd::Array2::from_shape_fn((NUM_VERTS - 2, 3), |(f, k)| u32::try_from(f + k).unwrap());
    let hands_mean = nd::Array1::from_shape_fn(HAND_POSE_DIM, |i| 0.1 * (i as f32).sin());
    ManoData {
        v_template,
        shapedirs,
        posedirs,
        joint_regressor,
        weights,
        faces,
        parents: PARENT_ID_PER_JOINT.to_vec(),
        hands_mean,
        hands_components: nd::Array2::eye(HAND_POSE_DIM),
    }
}

pub fn build(options: ManoOptions) -> ManoGPU<TestBackend> {
    ManoGPU::new_from_data(&synthetic_data(), options, &Default::default()).unwrap()
}

pub fn tensor2<B: Backend>(data: Vec<f32>, shape: [usize; 2], device: &B::Device) -> Tensor<B, 2, Float> {
    Tensor::from_data(TensorData::new(data, shape), device)
}

/// A reproducible ``[batch, dim]`` block of moderate parameter values.
pub fn pseudo_params(batch: usize, dim: usize, seed: f32) -> Vec<f32> {
    (0..batch * dim).map(|i| 0.4 * (1.7 * i as f32 + seed).sin()).collect()
}

pub fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert!((x - y).abs() <= tol, "index {i}: {x} vs {y}");
    }
}
