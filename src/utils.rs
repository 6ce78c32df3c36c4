use bevy::prelude::*;
use bevy_args::{
    Deserialize,
    Parser,
    Serialize,
};

use crate::io::{
    ingest::DEFAULT_CHUNK_SIZE,
    loader::SplatLoaderSettings,
};


#[derive(
    Clone,
    Debug,
    Resource,
    Serialize,
    Deserialize,
    Parser,
)]
#[command(about = "bevy_splat_ingest inspector", version, long_about = None)]
pub struct SplatIngestConfig {
    #[arg(long, default_value = "")]
    pub input_file: String,

    #[arg(long, default_value = "false")]
    pub animation_frame: bool,

    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(long, default_value = "false")]
    pub summary: bool,
}

impl Default for SplatIngestConfig {
    fn default() -> SplatIngestConfig {
        SplatIngestConfig {
            input_file: "".to_string(),
            animation_frame: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            summary: false,
        }
    }
}

impl SplatIngestConfig {
    pub fn loader_settings(&self) -> SplatLoaderSettings {
        SplatLoaderSettings {
            animation_frame: self.animation_frame,
            chunk_size: self.chunk_size,
        }
    }
}
