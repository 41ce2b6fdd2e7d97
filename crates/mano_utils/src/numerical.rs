use nalgebra as na;
use ndarray as nd;
use ndarray::prelude::*;

/// Below this squared angle the exponential map switches to its series
/// expansion.
pub const SMALL_ANGLE_SQ: f32 = 1e-8;

/// Calculates the rotation matrices for a batch of rotation vectors `[N, 3]`
/// on the host. Returns `[N, 3, 3]`.
pub fn batch_rodrigues(full_pose: &nd::Array2<f32>) -> nd::Array3<f32> {
    let mut rotations_per_joint = nd::Array3::<f32>::zeros((full_pose.nrows(), 3, 3));
    for (v, mut rot) in full_pose.axis_iter(nd::Axis(0)).zip(rotations_per_joint.axis_iter_mut(nd::Axis(0))) {
        let theta_sq = v.iter().map(|x| x * x).sum::<f32>();
        // R = I + A [a]x + B [a]x^2 with A = sin(t)/t and B = (1 - cos(t))/t^2
        let (a, b) = if theta_sq < SMALL_ANGLE_SQ {
            (1.0 - theta_sq / 6.0, 0.5 - theta_sq / 24.0)
        } else {
            let theta = theta_sq.sqrt();
            (theta.sin() / theta, (1.0 - theta.cos()) / theta_sq)
        };
        let (rx, ry, rz) = (v[0], v[1], v[2]);
        let k = array![[0.0, -rz, ry], [rz, 0.0, -rx], [-ry, rx, 0.0]];
        let rot_mat = nd::Array2::<f32>::eye(3) + a * &k + b * k.dot(&k);
        rot.assign(&rot_mat);
    }
    rotations_per_joint
}

/// Quaternion `(w, x, y, z)` to axis-angle: angle = 2 atan2(|v|, w), axis =
/// v / |v|. A vanishing vector part maps to the zero rotation.
///
/// `q` and `-q` are the same rotation; the one with `w >= 0` is used so the
/// angle stays in `[0, pi]`.
pub fn quat_to_axis_angle(q: [f32; 4]) -> [f32; 3] {
    let [w, x, y, z] = if q[0] < 0.0 { q.map(|c| -c) } else { q };
    let sin_half = (x * x + y * y + z * z).sqrt();
    if sin_half <= f32::EPSILON * w.abs().max(1.0) {
        return [0.0, 0.0, 0.0];
    }
    let angle = 2.0 * sin_half.atan2(w);
    let k = angle / sin_half;
    [x * k, y * k, z * k]
}

/// Row-wise [`quat_to_axis_angle`] for `[N, 4]` quaternions.
pub fn batch_quat_to_axis_angle(quats: &nd::Array2<f32>) -> nd::Array2<f32> {
    let mut out = nd::Array2::<f32>::zeros((quats.nrows(), 3));
    for (q, mut aa) in quats.axis_iter(nd::Axis(0)).zip(out.axis_iter_mut(nd::Axis(0))) {
        let r = quat_to_axis_angle([q[0], q[1], q[2], q[3]]);
        aa.assign(&array![r[0], r[1], r[2]]);
    }
    out
}

/// Axis-angle to a unit quaternion in `(w, x, y, z)` order.
pub fn axis_angle_to_quat(aa: [f32; 3]) -> [f32; 4] {
    let q = na::UnitQuaternion::from_scaled_axis(na::Vector3::new(aa[0], aa[1], aa[2]));
    [q.w, q.i, q.j, q.k]
}

/// Row-wise [`axis_angle_to_quat`] for `[N, 3]` rotation vectors.
pub fn batch_axis_angle_to_quat(axis_angles: &nd::Array2<f32>) -> nd::Array2<f32> {
    let mut out = nd::Array2::<f32>::zeros((axis_angles.nrows(), 4));
    for (aa, mut q) in axis_angles.axis_iter(nd::Axis(0)).zip(out.axis_iter_mut(nd::Axis(0))) {
        let r = axis_angle_to_quat([aa[0], aa[1], aa[2]]);
        q.assign(&array![r[0], r[1], r[2], r[3]]);
    }
    out
}
