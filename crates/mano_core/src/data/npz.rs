use super::{ManoData, ManoDataProvider};
use crate::common::{
    error::{ManoError, Result},
    types::HandSide,
};
use log::{debug, info};
use ndarray as nd;
use ndarray_npy::{NpzReader, NpzWriter};
use std::{
    io::{Read, Seek, Write},
    path::{Path, PathBuf},
};

/// Reads ``MANO_LEFT.npz`` / ``MANO_RIGHT.npz`` from a directory.
#[derive(Clone, Debug)]
pub struct NpzProvider {
    root: PathBuf,
}
impl NpzProvider {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    pub fn path_for(&self, side: HandSide) -> PathBuf {
        self.root.join(side.asset_file_name())
    }
}
impl ManoDataProvider for NpzProvider {
    fn provide(&self, side: HandSide) -> Result<ManoData> {
        let path = self.path_for(side);
        info!("Loading MANO {side} hand from {}", path.display());
        let file = std::fs::File::open(&path).map_err(|e| ManoError::ModelLoad(format!("cannot open {}: {e}", path.display())))?;
        read_mano_npz(file)
    }
}

fn load_err(name: &str, e: impl std::fmt::Display) -> ManoError {
    ManoError::ModelLoad(format!("{name}: {e}"))
}

/// Float arrays are stored as f64 in the released assets and as f32 in slim
/// conversions; accept both.
fn read_float<R: Read + Seek, D: nd::Dimension>(npz: &mut NpzReader<R>, name: &str) -> Result<nd::Array<f32, D>> {
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<f32>, D>(name) {
        return Ok(arr);
    }
    #[allow(clippy::cast_possible_truncation)]
    npz.by_name::<nd::OwnedRepr<f64>, D>(name)
        .map(|arr| arr.mapv(|x| x as f32))
        .map_err(|e| load_err(name, e))
}

fn read_index<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Result<nd::Array2<i64>> {
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<i64>, nd::Ix2>(name) {
        return Ok(arr);
    }
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<i32>, nd::Ix2>(name) {
        return Ok(arr.mapv(i64::from));
    }
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<u32>, nd::Ix2>(name) {
        return Ok(arr.mapv(i64::from));
    }
    // out-of-range u64 values only occur as the root sentinel
    npz.by_name::<nd::OwnedRepr<u64>, nd::Ix2>(name)
        .map(|arr| arr.mapv(|x| i64::try_from(x).unwrap_or(-1)))
        .map_err(|e| load_err(name, e))
}

/// Parse the MANO buffers from any npz stream.
pub fn read_mano_npz<R: Read + Seek>(reader: R) -> Result<ManoData> {
    let mut npz = NpzReader::new(reader).map_err(|e| load_err("npz", e))?;
    debug!("NPZ keys - {:?}", npz.names().map_err(|e| load_err("npz", e))?);
    let v_template: nd::Array2<f32> = read_float(&mut npz, "v_template")?;
    let shapedirs: nd::Array3<f32> = read_float(&mut npz, "shapedirs")?;
    let posedirs: nd::Array2<f32> = match read_float::<R, nd::Ix3>(&mut npz, "posedirs") {
        Ok(pose_dirs) => {
            let (nr_verts, dims, nr_feats) = pose_dirs.dim();
            pose_dirs
                .to_shape((nr_verts * dims, nr_feats))
                .map_err(|e| load_err("posedirs", e))?
                .into_owned()
        }
        Err(_) => read_float(&mut npz, "posedirs")?,
    };
    let joint_regressor: nd::Array2<f32> = read_float(&mut npz, "J_regressor")?;
    let weights: nd::Array2<f32> = read_float(&mut npz, "weights")?;
    let faces = read_index(&mut npz, "f")?;
    let faces = faces
        .iter()
        .map(|&x| u32::try_from(x).map_err(|_| load_err("f", format!("invalid face index {x}"))))
        .collect::<Result<Vec<u32>>>()?;
    let faces = nd::Array2::from_shape_vec((faces.len() / 3, 3), faces).map_err(|e| load_err("f", e))?;
    let kintree_table = read_index(&mut npz, "kintree_table")?;
    if kintree_table.nrows() == 0 {
        return Err(load_err("kintree_table", "empty table"));
    }
    let nr_joints = kintree_table.ncols();
    // the root's parent is stored as -1 or as an out-of-range sentinel
    let parents = kintree_table
        .row(0)
        .iter()
        .map(|&p| usize::try_from(p).ok().filter(|&p| p < nr_joints))
        .collect();
    let hands_mean: nd::Array1<f32> = read_float(&mut npz, "hands_mean")?;
    let hands_components: nd::Array2<f32> = read_float(&mut npz, "hands_components")?;
    Ok(ManoData {
        v_template,
        shapedirs,
        posedirs,
        joint_regressor,
        weights,
        faces,
        parents,
        hands_mean,
        hands_components,
    })
}

/// Write the buffers in the layout ``read_mano_npz`` expects, e.g. to ship
/// f32 assets converted from the released pickles.
pub fn write_mano_npz<W: Write + Seek>(data: &ManoData, writer: W) -> Result<W> {
    let mut npz = NpzWriter::new(writer);
    let (nr_verts, dims) = data.v_template.dim();
    let posedirs = data
        .posedirs
        .to_shape((nr_verts, dims, data.posedirs.ncols()))
        .map_err(|e| load_err("posedirs", e))?;
    #[allow(clippy::cast_possible_wrap)]
    let kintree: Vec<i64> = data
        .parents
        .iter()
        .map(|p| p.map_or(-1, |p| p as i64))
        .chain((0..data.parents.len()).map(|j| j as i64))
        .collect();
    let kintree = nd::Array2::from_shape_vec((2, data.parents.len()), kintree).map_err(|e| load_err("kintree_table", e))?;
    let write_err = |name: &str, e: ndarray_npy::WriteNpzError| ManoError::ModelLoad(format!("writing {name}: {e}"));
    npz.add_array("v_template", &data.v_template).map_err(|e| write_err("v_template", e))?;
    npz.add_array("shapedirs", &data.shapedirs).map_err(|e| write_err("shapedirs", e))?;
    npz.add_array("posedirs", &posedirs).map_err(|e| write_err("posedirs", e))?;
    npz.add_array("J_regressor", &data.joint_regressor).map_err(|e| write_err("J_regressor", e))?;
    npz.add_array("weights", &data.weights).map_err(|e| write_err("weights", e))?;
    npz.add_array("f", &data.faces).map_err(|e| write_err("f", e))?;
    npz.add_array("kintree_table", &kintree).map_err(|e| write_err("kintree_table", e))?;
    npz.add_array("hands_mean", &data.hands_mean).map_err(|e| write_err("hands_mean", e))?;
    npz.add_array("hands_components", &data.hands_components)
        .map_err(|e| write_err("hands_components", e))?;
    npz.finish().map_err(|e| write_err("npz", e))
}
