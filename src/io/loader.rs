use bevy::asset::{
    AssetLoader,
    LoadContext,
    io::Reader,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    error::IngestError,
    io::{
        dispatch::{
            LoadDispatcher,
            LoadRequest,
        },
        ingest::{
            DEFAULT_CHUNK_SIZE,
            StreamIngester,
        },
        progress::{
            LoadProgress,
            ProgressScope,
        },
    },
    splat::SplatAsset,
};


#[derive(
    Clone,
    Debug,
    PartialEq,
    Serialize,
    Deserialize,
)]
pub struct SplatLoaderSettings {
    pub animation_frame: bool,
    pub chunk_size: usize,
}

impl Default for SplatLoaderSettings {
    fn default() -> Self {
        Self {
            animation_frame: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}


/// Streams `.ply` and `.splat` assets from any bevy asset source into [`SplatAsset`]s.
#[derive(Default)]
pub struct SplatLoader {
    dispatcher: LoadDispatcher,
    progress: LoadProgress,
}

impl SplatLoader {
    pub fn new(progress: LoadProgress) -> Self {
        Self {
            dispatcher: LoadDispatcher::default(),
            progress,
        }
    }
}

impl AssetLoader for SplatLoader {
    type Asset = SplatAsset;
    type Settings = SplatLoaderSettings;
    type Error = IngestError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        settings: &Self::Settings,
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let path = load_context.path().to_string_lossy().to_string();
        let request = LoadRequest::remote(path.clone(), load_context.asset_path().to_string())
            .with_animation_frame(settings.animation_frame);

        let Some(format) = request.format() else {
            return Err(IngestError::UnrecognizedFormat { name: path });
        };

        // asset sources do not expose a total size, progress is estimated
        let sink = self.progress.request(path.clone());
        let mut progress = ProgressScope::open(&sink, &format!("Loading {path}"));
        let bytes = StreamIngester::new(settings.chunk_size)
            .read_body(&path, reader, None, &mut progress)
            .await?;

        self.dispatcher.finish(format, &bytes, request, &mut progress)
    }

    fn extensions(&self) -> &[&str] {
        &["ply", "splat"]
    }
}
