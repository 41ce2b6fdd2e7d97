pub mod error;
pub mod mano_model;
pub mod mano_options;
pub mod metadata;
pub mod outputs;
pub mod types;
