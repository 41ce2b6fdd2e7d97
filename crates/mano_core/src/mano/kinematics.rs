use crate::common::{
    error::{ManoError, Result},
    metadata::{NUM_FINGERS, NUM_JOINTS, NUM_LEVELS},
};
use burn::tensor::{backend::Backend, Float, Int, Tensor};
use mano_utils::bshare::index_tensor;

/// Joints of one depth below the root together with the arena slots of
/// their parents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeLevel {
    pub joints: Vec<usize>,
    pub parent_slots: Vec<usize>,
}

/// The MANO kinematic tree: a flat parent table plus its breadth levels,
/// derived once so the forward pass composes one level per batched matmul.
///
/// Transforms are composed into an arena where the root sits in slot 0 and
/// every level occupies the next `NUM_FINGERS` slots, so a parent always
/// has a lower slot than its children.
#[derive(Clone, Debug)]
pub struct KinematicTree {
    parents: Vec<Option<usize>>,
    levels: Vec<TreeLevel>,
    slot_of: Vec<usize>,
}

fn tree_err(msg: impl Into<String>) -> ManoError {
    ManoError::ModelLoad(format!("invalid kinematic tree: {}", msg.into()))
}

impl KinematicTree {
    pub fn new(parents: &[Option<usize>]) -> Result<Self> {
        let nr_joints = parents.len();
        if nr_joints != NUM_JOINTS {
            return Err(tree_err(format!("{nr_joints} joints, expected {NUM_JOINTS}")));
        }
        if parents[0].is_some() {
            return Err(tree_err("joint 0 is not the root"));
        }
        let mut depth = vec![0usize; nr_joints];
        for j in 1..nr_joints {
            let mut cur = j;
            let mut steps = 0;
            while let Some(p) = parents[cur] {
                if p >= nr_joints {
                    return Err(tree_err(format!("parent {p} of joint {cur} out of range")));
                }
                steps += 1;
                if steps > nr_joints {
                    return Err(tree_err(format!("cycle through joint {j}")));
                }
                cur = p;
            }
            if cur != 0 {
                return Err(tree_err(format!("joint {cur} is a second root")));
            }
            depth[j] = steps;
        }
        let max_depth = depth.iter().copied().max().unwrap_or(0);
        if max_depth != NUM_LEVELS {
            return Err(tree_err(format!("depth {max_depth}, expected {NUM_LEVELS}")));
        }

        let mut slot_of = vec![0usize; nr_joints];
        let mut levels = Vec::with_capacity(NUM_LEVELS);
        let mut next_slot = 1;
        for level in 1..=NUM_LEVELS {
            let joints: Vec<usize> = (0..nr_joints).filter(|&j| depth[j] == level).collect();
            if joints.len() != NUM_FINGERS {
                return Err(tree_err(format!("level {level} has {} joints, expected {NUM_FINGERS}", joints.len())));
            }
            let mut parent_slots = Vec::with_capacity(joints.len());
            for &j in &joints {
                // depth >= 1 guarantees a parent
                let parent = parents[j].ok_or_else(|| tree_err(format!("joint {j} lost its parent")))?;
                parent_slots.push(slot_of[parent]);
                slot_of[j] = next_slot;
                next_slot += 1;
            }
            levels.push(TreeLevel { joints, parent_slots });
        }
        Ok(Self {
            parents: parents.to_vec(),
            levels,
            slot_of,
        })
    }
    /// Levels 1..=3 below the root, in composition order
    pub fn levels(&self) -> &[TreeLevel] {
        &self.levels
    }
    pub fn slot_of(&self, joint: usize) -> usize {
        self.slot_of[joint]
    }
    /// Parent of every non-root joint, in joint order 1..J
    fn non_root_parents(&self) -> Vec<usize> {
        self.parents.iter().skip(1).map(|p| p.unwrap_or(0)).collect()
    }
}

/// Append the homogeneous row ``[0, 0, 0, 1]`` to ``[B, N, 3, 4]`` matrices.
pub(crate) fn with_bottom_row<B: Backend>(mats: Tensor<B, 4, Float>) -> Tensor<B, 4, Float> {
    let [batch, n, _, _] = mats.dims();
    let device = mats.device();
    let bottom = Tensor::<B, 1, Float>::from_floats([0.0, 0.0, 0.0, 1.0], &device)
        .reshape([1, 1, 1, 4])
        .expand([batch, n, 1, 4]);
    Tensor::cat(vec![mats, bottom], 2)
}

/// Absolute and skinning transforms of all joints, in joint order.
#[derive(Clone)]
pub struct ChainTransforms<B: Backend> {
    /// ``[B, J, 4, 4]``
    pub absolute: Tensor<B, 4, Float>,
    /// Absolute transforms with the rest pose joint location removed, so
    /// they map rest space vertices directly ``[B, J, 4, 4]``
    pub skinning: Tensor<B, 4, Float>,
}
impl<B: Backend> ChainTransforms<B> {
    /// Translation part of the absolute transforms ``[B, J, 3]``
    pub fn posed_joints(&self) -> Tensor<B, 3, Float> {
        let [batch, nr_joints, _, _] = self.absolute.dims();
        self.absolute
            .clone()
            .slice([0..batch, 0..nr_joints, 0..3, 3..4])
            .reshape([batch, nr_joints, 3])
    }
}

/// Compose the rotations ``[B, J, 3, 3]`` along the tree, with the rest
/// joints ``[B, J, 3]`` giving the bone offsets.
#[allow(clippy::similar_names)]
pub fn compose<B: Backend>(tree: &KinematicTree, rot_mats: Tensor<B, 4, Float>, joints: Tensor<B, 3, Float>) -> ChainTransforms<B> {
    let [batch, nr_joints, _] = joints.dims();
    let device = joints.device();

    // bone offsets, the root keeps its absolute location
    let parent_idx: Tensor<B, 1, Int> = index_tensor(&tree.non_root_parents(), &device);
    let rel_joints = joints.clone().slice([0..batch, 1..nr_joints, 0..3]) - joints.clone().select(1, parent_idx);
    let rel_joints = Tensor::cat(vec![joints.clone().slice([0..batch, 0..1, 0..3]), rel_joints], 1);
    let local = with_bottom_row(Tensor::cat(vec![rot_mats, rel_joints.unsqueeze_dim::<4>(3)], 3));

    let mut arena = local.clone().slice([0..batch, 0..1, 0..4, 0..4]);
    for level in tree.levels() {
        let local_level = local.clone().select(1, index_tensor(&level.joints, &device));
        let parent_abs = arena.clone().select(1, index_tensor(&level.parent_slots, &device));
        arena = Tensor::cat(vec![arena, parent_abs.matmul(local_level)], 1);
    }
    let slot_of: Vec<usize> = (0..nr_joints).map(|j| tree.slot_of(j)).collect();
    let absolute = arena.select(1, index_tensor(&slot_of, &device));

    // G' = G - [0 | G (J, 0)]
    let joints_homogen = Tensor::cat(vec![joints, Tensor::zeros([batch, nr_joints, 1], &device)], 2).unsqueeze_dim::<4>(3);
    let moved_rest = absolute.clone().matmul(joints_homogen);
    let offset = Tensor::cat(vec![Tensor::zeros([batch, nr_joints, 4, 3], &device), moved_rest], 3);
    let skinning = absolute.clone() - offset;
    ChainTransforms { absolute, skinning }
}
