use bevy::prelude::*;

pub use error::IngestError;
pub use io::{
    dispatch::{
        LoadDispatcher,
        LoadRequest,
        SourceFormat,
    },
    ingest::StreamIngester,
    loader::{
        SplatLoader,
        SplatLoaderSettings,
    },
    progress::{
        LoadProgress,
        ProgressSink,
    },
    splat::{
        decode_splat,
        encode_splat,
    },
};
pub use splat::{
    AttributeTable,
    SplatAsset,
    rand::random_splats,
};

pub mod error;
pub mod io;
pub mod splat;
pub mod utils;


pub struct SplatIngestPlugin;

impl Plugin for SplatIngestPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<SplatAsset>();
        app.init_resource::<LoadProgress>();

        let progress = app.world().resource::<LoadProgress>().clone();
        app.register_asset_loader(SplatLoader::new(progress));

        app.add_systems(Update, io::progress::report_load_progress);
    }
}
