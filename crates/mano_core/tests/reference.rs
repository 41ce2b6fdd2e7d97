mod common;

use common::{assert_close, pseudo_params, synthetic_data, tensor2, TestBackend};
use mano_core::{
    common::metadata::{tip_vertex_ids, FULL_POSE_DIM, NUM_JOINTS, NUM_OUTPUT_JOINTS, NUM_VERTS, OUTPUT_JOINT_ORDER},
    HandSide, ManoData, ManoGPU, ManoOptions, RotMode,
};
use mano_utils::bshare::tensor_to_data_float;
use nalgebra as na;

const BATCH: usize = 2;

/// One posed hand computed on the host in f64, flattened row-major.
struct HostHand {
    verts: Vec<f32>,
    joints: Vec<f32>,
    transforms: Vec<f32>,
}

#[allow(clippy::cast_possible_truncation)]
fn flatten3(points: &[na::Vector3<f64>]) -> Vec<f32> {
    points.iter().flat_map(|p| [p.x as f32, p.y as f32, p.z as f32]).collect()
}

/// Straight loop version of the forward pass for one axis-angle pose.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::many_single_char_names)]
fn host_forward(data: &ManoData, options: &ManoOptions, pose: &[f32], betas: &[f32]) -> HostHand {
    let f = |x: f32| f64::from(x);
    let full_pose: Vec<f64> = (0..FULL_POSE_DIM)
        .map(|i| {
            let mean = if i < 3 || options.flat_hand_mean { 0.0 } else { f(data.hands_mean[i - 3]) };
            f(pose[i]) + mean
        })
        .collect();
    let rots: Vec<na::Matrix3<f64>> = (0..NUM_JOINTS)
        .map(|j| na::Rotation3::from_scaled_axis(na::Vector3::new(full_pose[3 * j], full_pose[3 * j + 1], full_pose[3 * j + 2])).into_inner())
        .collect();

    let nr_betas = data.num_betas();
    let v_shaped: Vec<na::Vector3<f64>> = (0..NUM_VERTS)
        .map(|v| {
            na::Vector3::from_fn(|d, _| {
                f(data.v_template[[v, d]]) + (0..nr_betas).map(|s| f(data.shapedirs[[v, d, s]]) * f(betas[s])).sum::<f64>()
            })
        })
        .collect();
    let joints_rest: Vec<na::Vector3<f64>> = (0..NUM_JOINTS)
        .map(|j| (0..NUM_VERTS).fold(na::Vector3::zeros(), |acc, v| acc + v_shaped[v] * f(data.joint_regressor[[j, v]])))
        .collect();

    let feature: Vec<f64> = (1..NUM_JOINTS)
        .flat_map(|j| {
            let rot = rots[j];
            (0..9).map(move |k| rot[(k / 3, k % 3)] - if k / 3 == k % 3 { 1.0 } else { 0.0 })
        })
        .collect();
    let v_posed: Vec<na::Vector3<f64>> = (0..NUM_VERTS)
        .map(|v| {
            v_shaped[v]
                + na::Vector3::from_fn(|d, _| feature.iter().enumerate().map(|(k, x)| f(data.posedirs[[v * 3 + d, k]]) * x).sum::<f64>())
        })
        .collect();

    // parents always precede their children in the MANO joint order
    let mut chain: Vec<na::Matrix4<f64>> = Vec::with_capacity(NUM_JOINTS);
    for j in 0..NUM_JOINTS {
        let offset = match data.parents[j] {
            Some(p) => joints_rest[j] - joints_rest[p],
            None => joints_rest[j],
        };
        let mut local = na::Matrix4::<f64>::identity();
        local.fixed_view_mut::<3, 3>(0, 0).copy_from(&rots[j]);
        local.fixed_view_mut::<3, 1>(0, 3).copy_from(&offset);
        let global = match data.parents[j] {
            Some(p) => chain[p] * local,
            None => local,
        };
        chain.push(global);
    }
    let skinning: Vec<na::Matrix4<f64>> = chain
        .iter()
        .zip(joints_rest.iter())
        .map(|(g, rest)| {
            let moved = g * na::Vector4::new(rest.x, rest.y, rest.z, 0.0);
            let mut g_skin = *g;
            let col = g.column(3) - moved;
            g_skin.set_column(3, &col);
            g_skin
        })
        .collect();

    let verts: Vec<na::Vector3<f64>> = (0..NUM_VERTS)
        .map(|v| {
            let blended = (0..NUM_JOINTS).fold(na::Matrix4::<f64>::zeros(), |acc, j| acc + skinning[j] * f(data.weights[[v, j]]));
            let p = blended * na::Vector4::new(v_posed[v].x, v_posed[v].y, v_posed[v].z, 1.0);
            na::Vector3::new(p.x, p.y, p.z)
        })
        .collect();

    let mut native: Vec<na::Vector3<f64>> = chain.iter().map(|g| na::Vector3::new(g[(0, 3)], g[(1, 3)], g[(2, 3)])).collect();
    native.extend(tip_vertex_ids(options.side).iter().map(|&t| verts[t]));
    let joints: Vec<na::Vector3<f64>> = OUTPUT_JOINT_ORDER.iter().map(|&n| native[n]).collect();

    let center = options.center_idx.map_or(na::Vector3::zeros(), |c| joints[c]);
    let verts: Vec<na::Vector3<f64>> = verts.iter().map(|v| v - center).collect();
    let joints: Vec<na::Vector3<f64>> = joints.iter().map(|j| j - center).collect();
    let transforms: Vec<f32> = chain
        .iter()
        .flat_map(|g| {
            let mut g = *g;
            for r in 0..3 {
                g[(r, 3)] -= center[r];
            }
            (0..16).map(move |k| g[(k / 4, k % 4)] as f32)
        })
        .collect();
    HostHand {
        verts: flatten3(&verts),
        joints: flatten3(&joints),
        transforms,
    }
}

fn check_against_host(options: ManoOptions) {
    let device = Default::default();
    let data = synthetic_data();
    let model = ManoGPU::<TestBackend>::new_from_data(&data, options.clone(), &device).unwrap();
    let pose = pseudo_params(BATCH, FULL_POSE_DIM, 0.7);
    let betas = pseudo_params(BATCH, data.num_betas(), 2.3);
    let out = model
        .forward(tensor2(pose.clone(), [BATCH, FULL_POSE_DIM], &device), tensor2(betas.clone(), [BATCH, data.num_betas()], &device))
        .unwrap();
    let transforms = tensor_to_data_float(&out.transforms_abs);
    let per_item_tf = NUM_JOINTS * 16;
    for item in 0..BATCH {
        let expected = host_forward(
            &data,
            &options,
            &pose[item * FULL_POSE_DIM..(item + 1) * FULL_POSE_DIM],
            &betas[item * data.num_betas()..(item + 1) * data.num_betas()],
        );
        assert_close(&tensor_to_data_float(&out.verts_of(item)), &expected.verts, 1e-4);
        assert_close(&tensor_to_data_float(&out.joints_of(item)), &expected.joints, 1e-4);
        assert_close(&transforms[item * per_item_tf..(item + 1) * per_item_tf], &expected.transforms, 1e-4);
    }
}

#[test]
fn right_hand_with_mean_pose_matches_host_loops() {
    check_against_host(ManoOptions::new(RotMode::AxisAngle, HandSide::Right).with_flat_hand_mean(false));
}

#[test]
fn centered_left_hand_matches_host_loops() {
    check_against_host(
        ManoOptions::new(RotMode::AxisAngle, HandSide::Left)
            .with_flat_hand_mean(false)
            .with_center_idx(9),
    );
}

#[test]
fn centered_flat_right_hand_matches_host_loops() {
    check_against_host(ManoOptions::default().with_center_idx(9));
}

#[test]
fn host_loops_see_a_posed_hand() {
    // guards the comparison itself: the pose must actually bend the fingers
    let data = synthetic_data();
    let options = ManoOptions::default();
    let rest = host_forward(&data, &options, &[0.0; FULL_POSE_DIM], &[0.0; 10]);
    let posed = host_forward(&data, &options, &pseudo_params(1, FULL_POSE_DIM, 0.7), &[0.0; 10]);
    assert_eq!(rest.joints.len(), NUM_OUTPUT_JOINTS * 3);
    let moved = rest.joints.iter().zip(posed.joints.iter()).any(|(a, b)| (a - b).abs() > 1e-2);
    assert!(moved);
}
