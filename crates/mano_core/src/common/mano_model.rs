use super::{error::Result, mano_options::ManoOptions, types::HandSide};
use crate::{data::npz::NpzProvider, mano::mano_gpu::ManoGPU};
use burn::tensor::backend::Backend;
use enum_map::EnumMap;
use log::info;
use std::path::Path;
use strum::IntoEnumIterator;

/// Holds at most one built layer per hand side.
pub struct ManoCache<B: Backend> {
    side_to_model: EnumMap<HandSide, Option<ManoGPU<B>>>,
}
impl<B: Backend> Default for ManoCache<B> {
    fn default() -> Self {
        Self {
            side_to_model: EnumMap::from_fn(|_| None),
        }
    }
}
impl<B: Backend> ManoCache<B> {
    /// Stores `model` under its side, replacing an earlier one.
    pub fn add_model(&mut self, model: ManoGPU<B>) {
        let side = model.side();
        self.side_to_model[side] = Some(model);
    }
    pub fn get_model_ref(&self, side: HandSide) -> Option<&ManoGPU<B>> {
        self.side_to_model[side].as_ref()
    }
    pub fn has_model(&self, side: HandSide) -> bool {
        self.side_to_model[side].is_some()
    }
    pub fn remove_all_models(&mut self) {
        self.side_to_model = EnumMap::from_fn(|_| None);
    }
    /// Builds a layer for every side whose asset exists under `dir`, all
    /// with the same `options` apart from the side.
    pub fn load_from_dir(&mut self, dir: impl AsRef<Path>, options: &ManoOptions, device: &B::Device) -> Result<usize> {
        let provider = NpzProvider::new(dir);
        let mut nr_loaded = 0;
        for side in HandSide::iter() {
            if !provider.path_for(side).exists() {
                info!("No {side} hand asset at {}", provider.path_for(side).display());
                continue;
            }
            let options = ManoOptions { side, ..options.clone() };
            self.add_model(ManoGPU::new_from_provider(&provider, options, device)?);
            nr_loaded += 1;
        }
        Ok(nr_loaded)
    }
}
