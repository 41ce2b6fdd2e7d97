use super::{
    blend::{pose_blend, pose_feature, regress_joints, shape_blend},
    kinematics::{compose, KinematicTree},
    postprocess::PostProcessor,
    rotation::{ResolvedRotations, RotationResolver},
    skinning::linear_blend_skinning,
};
use crate::{
    common::{
        error::{ManoError, Result},
        mano_options::ManoOptions,
        metadata::{mano_metadata, ManoMetadata, NUM_VERTS},
        outputs::{ManoOutput, ManoOutputRest},
        types::{HandSide, RotMode},
    },
    data::{npz::read_mano_npz, ManoData, ManoDataProvider},
};
use burn::tensor::{backend::Backend, Float, Int, Tensor};
use log::info;
use mano_utils::bshare::{faces_to_burn, ToBurn};
use ndarray as nd;
use std::{
    io::{Read, Seek},
    path::Path,
};

/// A MANO hand layer on a burn backend.
///
/// All model buffers live on the device and are shared between clones.
/// `forward` borrows the layer, so one instance serves any number of calls.
#[derive(Clone)]
pub struct ManoGPU<B: Backend> {
    pub device: B::Device,
    pub side: HandSide,
    pub options: ManoOptions,
    pub verts_template: Tensor<B, 2, Float>,
    pub faces: Tensor<B, 2, Int>,
    /// ``[V * 3, S]``
    pub shape_dirs: Tensor<B, 2, Float>,
    /// ``[V * 3, 135]``
    pub pose_dirs: Tensor<B, 2, Float>,
    pub joint_regressor: Tensor<B, 2, Float>,
    pub lbs_weights: Tensor<B, 2, Float>,
    pub tree: KinematicTree,
    pub rotation: RotationResolver<B>,
    pub post: PostProcessor<B>,
    pub metadata: ManoMetadata,
    num_betas: usize,
}

impl<B: Backend> ManoGPU<B> {
    /// Upload validated buffers onto `device`.
    pub fn new_from_data(data: &ManoData, options: ManoOptions, device: &B::Device) -> Result<Self> {
        options.validate()?;
        data.validate()?;
        let num_betas = data.num_betas();
        let shape_dirs: nd::Array2<f32> = data
            .shapedirs
            .to_shape((NUM_VERTS * 3, num_betas))
            .map_err(|e| ManoError::ModelLoad(format!("shapedirs: {e}")))?
            .into_owned();
        let tree = KinematicTree::new(&data.parents)?;
        let rotation = RotationResolver::new(&options, &data.hands_mean, &data.hands_components, device)?;
        let post = PostProcessor::new(options.side, options.center_idx, device)?;
        info!("Initialised burn on Backend: {:?}", B::name());
        info!("Device: {:?}", device);
        info!(
            "MANO {} hand, rot_mode={}, pca={}, betas={num_betas}",
            options.side,
            options.rot_mode,
            if options.use_pca { options.ncomps.to_string() } else { "off".to_string() }
        );
        Ok(Self {
            device: device.clone(),
            side: options.side,
            verts_template: data.v_template.to_burn(device),
            faces: faces_to_burn(&data.faces, device),
            shape_dirs: shape_dirs.to_burn(device),
            pose_dirs: data.posedirs.to_burn(device),
            joint_regressor: data.joint_regressor.to_burn(device),
            lbs_weights: data.weights.to_burn(device),
            tree,
            rotation,
            post,
            metadata: mano_metadata(options.side),
            options,
            num_betas,
        })
    }
    pub fn new_from_provider<P: ManoDataProvider + ?Sized>(provider: &P, options: ManoOptions, device: &B::Device) -> Result<Self> {
        options.validate()?;
        let data = provider.provide(options.side)?;
        Self::new_from_data(&data, options, device)
    }
    /// Load an ``.npz`` asset onto the default device.
    pub fn new_from_npz(model_path: impl AsRef<Path>, options: ManoOptions) -> Result<Self> {
        options.validate()?;
        let model_path = model_path.as_ref();
        info!("Loading MANO model from {}", model_path.display());
        let file = std::fs::File::open(model_path).map_err(|e| ManoError::ModelLoad(format!("cannot open {}: {e}", model_path.display())))?;
        Self::new_from_reader(file, options)
    }
    pub fn new_from_reader<R: Read + Seek>(reader: R, options: ManoOptions) -> Result<Self> {
        options.validate()?;
        let data = read_mano_npz(reader)?;
        Self::new_from_data(&data, options, &B::Device::default())
    }

    pub fn num_betas(&self) -> usize {
        self.num_betas
    }
    pub fn pose_dim(&self) -> usize {
        self.rotation.pose_dim()
    }
    pub fn rot_mode(&self) -> RotMode {
        self.rotation.rot_mode()
    }
    pub fn side(&self) -> HandSide {
        self.side
    }
    pub fn faces(&self) -> &Tensor<B, 2, Int> {
        &self.faces
    }
    pub fn metadata(&self) -> &ManoMetadata {
        &self.metadata
    }

    fn check_betas(&self, betas: &Tensor<B, 2, Float>) -> Result<()> {
        let [_, nr_betas] = betas.dims();
        if nr_betas == self.num_betas {
            Ok(())
        } else {
            Err(ManoError::ShapeMismatch(format!("betas have {nr_betas} components, expected {}", self.num_betas)))
        }
    }

    /// Shaped template vertices ``[B, V, 3]``
    pub fn betas2verts(&self, betas: Tensor<B, 2, Float>) -> Result<Tensor<B, 3, Float>> {
        self.check_betas(&betas)?;
        Ok(shape_blend(&self.verts_template, &self.shape_dirs, betas))
    }
    /// Rest joints ``[B, 16, 3]`` regressed from ``[B, V, 3]`` vertices
    pub fn verts2joints(&self, verts_t_pose: Tensor<B, 3, Float>) -> Tensor<B, 3, Float> {
        regress_joints(&self.joint_regressor, verts_t_pose)
    }
    pub fn resolve_rotations(&self, pose: Tensor<B, 2, Float>) -> Result<ResolvedRotations<B>> {
        self.rotation.resolve(pose)
    }
    /// ``[B, 135]`` deviation of the finger rotations from identity
    pub fn compute_pose_feature(&self, rot_mats: Tensor<B, 4, Float>) -> Tensor<B, 2, Float> {
        pose_feature(rot_mats)
    }
    /// Pose corrective offsets ``[B, V, 3]``
    pub fn compute_pose_correctives(&self, rot_mats: Tensor<B, 4, Float>) -> Tensor<B, 3, Float> {
        pose_blend(&self.pose_dirs, self.compute_pose_feature(rot_mats))
    }
    /// The shaped hand in its rest pose.
    pub fn forward_rest(&self, betas: Tensor<B, 2, Float>) -> Result<ManoOutputRest<B>> {
        let verts = self.betas2verts(betas)?;
        let joints = self.verts2joints(verts.clone());
        Ok(ManoOutputRest { verts, joints })
    }

    /// Pose and shape a batch of hands.
    ///
    /// `pose` is ``[B, pose_dim]`` in the configured rotation mode and
    /// `betas` is ``[B, S]``. Shape errors leave the layer untouched.
    pub fn forward(&self, pose: Tensor<B, 2, Float>, betas: Tensor<B, 2, Float>) -> Result<ManoOutput<B>> {
        let [batch, _] = pose.dims();
        let [nr_betas_rows, _] = betas.dims();
        if batch == 0 {
            return Err(ManoError::ShapeMismatch("empty batch".to_string()));
        }
        if batch != nr_betas_rows {
            return Err(ManoError::ShapeMismatch(format!("pose batch {batch} does not match betas batch {nr_betas_rows}")));
        }
        self.check_betas(&betas)?;
        let ResolvedRotations { rot_mats, full_poses } = self.resolve_rotations(pose)?;

        let verts_shaped = shape_blend(&self.verts_template, &self.shape_dirs, betas.clone());
        let joints_rest = self.verts2joints(verts_shaped.clone());
        let verts_posed = verts_shaped + self.compute_pose_correctives(rot_mats.clone());

        let chain = compose(&self.tree, rot_mats, joints_rest);
        let verts = linear_blend_skinning(&self.lbs_weights, chain.skinning.clone(), verts_posed);
        let out = self.post.apply(verts, chain.posed_joints(), chain.absolute);
        Ok(ManoOutput {
            verts: out.verts,
            joints: out.joints,
            center_idx: self.post.center_idx(),
            center_joint: out.center_joint,
            full_poses,
            betas,
            transforms_abs: out.transforms_abs,
        })
    }
}
