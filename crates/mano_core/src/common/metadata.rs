use super::types::HandSide;
pub const NUM_VERTS: usize = 778;
pub const NUM_JOINTS: usize = 16;
pub const NUM_HAND_JOINTS: usize = NUM_JOINTS - 1;
pub const NUM_TIPS: usize = 5;
pub const NUM_OUTPUT_JOINTS: usize = NUM_JOINTS + NUM_TIPS;
/// Axis-angle dimension of the 15 finger joints
pub const HAND_POSE_DIM: usize = NUM_HAND_JOINTS * 3;
/// Axis-angle dimension of all joints including the root
pub const FULL_POSE_DIM: usize = NUM_JOINTS * 3;
pub const NUM_POSE_BLEND_SHAPES: usize = NUM_HAND_JOINTS * 9;
/// Number of shape coefficients of the released assets
pub const SHAPE_SPACE_DIM: usize = 10;
/// Depth of every finger chain below the wrist
pub const NUM_LEVELS: usize = 3;
/// Fingers attached to the wrist
pub const NUM_FINGERS: usize = 5;
pub const PARENT_ID_PER_JOINT: [Option<usize>; NUM_JOINTS] = [
    None,
    Some(0),
    Some(1),
    Some(2),
    Some(0),
    Some(4),
    Some(5),
    Some(0),
    Some(7),
    Some(8),
    Some(0),
    Some(10),
    Some(11),
    Some(0),
    Some(13),
    Some(14),
];
pub const JOINT_NAMES: [&str; NUM_JOINTS] = [
    "wrist", "index1", "index2", "index3", "middle1", "middle2", "middle3", "pinky1", "pinky2", "pinky3", "ring1", "ring2", "ring3", "thumb1",
    "thumb2", "thumb3",
];
/// Joint names after tips are appended and the joints are reordered
pub const OUTPUT_JOINT_NAMES: [&str; NUM_OUTPUT_JOINTS] = [
    "wrist", "thumb1", "thumb2", "thumb3", "thumb4", "index1", "index2", "index3", "index4", "middle1", "middle2", "middle3", "middle4", "ring1",
    "ring2", "ring3", "ring4", "pinky1", "pinky2", "pinky3", "pinky4",
];
/// Gather table from the native 21 slots (16 joints then thumb, index,
/// middle, ring, pinky tips) to the output order: `out[i] = native[table[i]]`
pub const OUTPUT_JOINT_ORDER: [usize; NUM_OUTPUT_JOINTS] = [0, 13, 14, 15, 16, 1, 2, 3, 17, 4, 5, 6, 18, 10, 11, 12, 19, 7, 8, 9, 20];
pub const TIP_VERTS_RIGHT: [usize; NUM_TIPS] = [745, 317, 444, 556, 673];
pub const TIP_VERTS_LEFT: [usize; NUM_TIPS] = [745, 317, 445, 556, 673];
/// Everything about the MANO topology that does not live in the asset
#[derive(Clone, Debug)]
pub struct ManoMetadata {
    pub side: HandSide,
    pub num_verts: usize,
    pub num_joints: usize,
    pub num_output_joints: usize,
    pub num_pose_blend_shapes: usize,
    pub joint_parents: Vec<Option<usize>>,
    pub joint_names: Vec<String>,
    pub output_joint_names: Vec<String>,
    pub output_joint_order: Vec<usize>,
    pub tip_vertex_ids: Vec<usize>,
}
pub fn mano_metadata(side: HandSide) -> ManoMetadata {
    ManoMetadata {
        side,
        num_verts: NUM_VERTS,
        num_joints: NUM_JOINTS,
        num_output_joints: NUM_OUTPUT_JOINTS,
        num_pose_blend_shapes: NUM_POSE_BLEND_SHAPES,
        joint_parents: PARENT_ID_PER_JOINT.to_vec(),
        joint_names: JOINT_NAMES.map(std::string::ToString::to_string).to_vec(),
        output_joint_names: OUTPUT_JOINT_NAMES.map(std::string::ToString::to_string).to_vec(),
        output_joint_order: OUTPUT_JOINT_ORDER.to_vec(),
        tip_vertex_ids: tip_vertex_ids(side).to_vec(),
    }
}
pub fn tip_vertex_ids(side: HandSide) -> [usize; NUM_TIPS] {
    match side {
        HandSide::Left => TIP_VERTS_LEFT,
        HandSide::Right => TIP_VERTS_RIGHT,
    }
}
