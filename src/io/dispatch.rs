use std::sync::Arc;

use bevy::log::{
    debug,
    info,
    warn,
};

use crate::{
    error::IngestError,
    io::{
        ingest::StreamIngester,
        ply::{
            ContainerDecoder,
            ContainerKind,
            LocatorMap,
            PlyContainerDecoder,
        },
        progress::{
            BusyScope,
            ProgressScope,
            ProgressSink,
        },
        splat::decode_splat,
        transport::Transport,
    },
    splat::{
        FLAT_SCALE,
        REQUIRED_FIELDS,
        SplatAsset,
        reorder::reorder_morton,
        table::{
            AttributeTable,
            ColumnData,
        },
    },
};


pub const META_FILENAME: &str = "meta.json";


#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
)]
pub enum SourceFormat {
    /// fixed 32 byte `.splat` records
    Records,
    Container(ContainerKind),
}

impl SourceFormat {
    /// Resolve a format from a file name or locator, ignoring case, query and fragment.
    pub fn from_name(name: &str) -> Option<Self> {
        let path = name.split(['?', '#']).next().unwrap_or_default();
        let file = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if file == META_FILENAME {
            Some(SourceFormat::Container(ContainerKind::Meta))
        } else if file.ends_with(".ply") {
            Some(SourceFormat::Container(ContainerKind::Ply))
        } else if file.ends_with(".splat") {
            Some(SourceFormat::Records)
        } else {
            None
        }
    }
}


/// A single asset to load, either from bytes already in memory or from a locator.
#[derive(Clone)]
pub struct LoadRequest {
    name: String,
    locator: Option<String>,
    contents: Option<Vec<u8>>,
    animation_frame: bool,
    map_locator: Option<LocatorMap>,
    format: Option<SourceFormat>,
}

impl LoadRequest {
    fn new(
        name: String,
        locator: Option<String>,
        contents: Option<Vec<u8>>,
    ) -> Self {
        let format = SourceFormat::from_name(&name)
            .or_else(|| locator.as_deref().and_then(SourceFormat::from_name));

        Self {
            name,
            locator,
            contents,
            animation_frame: false,
            map_locator: None,
            format,
        }
    }

    pub fn local(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self::new(name.into(), None, Some(contents))
    }

    pub fn remote(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self::new(name.into(), Some(locator.into()), None)
    }

    pub fn with_animation_frame(mut self, animation_frame: bool) -> Self {
        self.animation_frame = animation_frame;
        self
    }

    pub fn with_locator_map(
        mut self,
        map_locator: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.map_locator = Some(Arc::new(map_locator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    /// skips point reordering and busy signaling for animated playback
    pub fn is_animation_frame(&self) -> bool {
        self.animation_frame
    }

    pub fn map_locator(&self) -> Option<&LocatorMap> {
        self.map_locator.as_ref()
    }

    /// resolved once from the name, falling back to the locator
    pub fn format(&self) -> Option<SourceFormat> {
        self.format
    }
}


/// Give 2d splat tables a flat third scale axis, placed right after `scale_1`.
///
/// Returns whether the table was changed.
pub fn normalize_table(table: &mut AttributeTable) -> Result<bool, IngestError> {
    if !table.contains("scale_0") || !table.contains("scale_1") || table.contains("scale_2") {
        return Ok(false);
    }

    let flat = vec![FLAT_SCALE.ln(); table.len()];
    table.insert_after("scale_1", "scale_2", ColumnData::F32(flat))?;

    Ok(true)
}

pub fn validate_table(table: &AttributeTable) -> Result<(), IngestError> {
    let fields = table.missing(&REQUIRED_FIELDS);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingRequiredFields { fields })
    }
}


/// Routes load requests to the record decoder or the container decoder,
/// fetching remote sources first.
pub struct LoadDispatcher<C = PlyContainerDecoder> {
    container: C,
    ingester: StreamIngester,
}

impl Default for LoadDispatcher<PlyContainerDecoder> {
    fn default() -> Self {
        Self::new(PlyContainerDecoder)
    }
}

impl<C: ContainerDecoder> LoadDispatcher<C> {
    pub fn new(container: C) -> Self {
        Self {
            container,
            ingester: StreamIngester::default(),
        }
    }

    pub fn with_ingester(mut self, ingester: StreamIngester) -> Self {
        self.ingester = ingester;
        self
    }

    /// Load a request from its contents, or through `transport` when it only has a locator.
    ///
    /// Unrecognized formats resolve to `Ok(None)`.
    pub async fn load<T: Transport + ?Sized>(
        &self,
        request: LoadRequest,
        transport: &T,
        sink: &dyn ProgressSink,
    ) -> Result<Option<SplatAsset>, IngestError> {
        let Some(format) = request.format() else {
            debug!("skipping `{}`, not a splat format", request.name);
            return Ok(None);
        };

        if request.contents.is_some() {
            return self.load_contents(request, sink);
        }

        let Some(locator) = request.locator.clone() else {
            return Err(IngestError::MissingSource { name: request.name });
        };

        let mut progress = ProgressScope::open(sink, &format!("Loading {}", request.name));

        let bytes = self
            .ingester
            .fetch(transport, &locator, &mut progress)
            .await
            .inspect_err(|err| warn!("failed to fetch `{locator}`: {err}"))?;

        self.finish(format, &bytes, request, &mut progress).map(Some)
    }

    /// Decode fetched bytes into an asset, reporting the stages after the transfer.
    pub fn finish(
        &self,
        format: SourceFormat,
        bytes: &[u8],
        request: LoadRequest,
        progress: &mut ProgressScope<'_>,
    ) -> Result<SplatAsset, IngestError> {
        progress.update("Processing", 95.0);
        let table = self
            .decode(format, bytes, &request)
            .inspect_err(|err| warn!("failed to decode `{}`: {err}", request.name))?;

        progress.update("Loading", 98.0);
        let asset = SplatAsset::new(request.name, request.locator, table);

        progress.update("Complete", 100.0);

        Ok(asset)
    }

    /// Decode a request whose bytes are already in memory, without any transfer.
    pub fn load_contents(
        &self,
        request: LoadRequest,
        sink: &dyn ProgressSink,
    ) -> Result<Option<SplatAsset>, IngestError> {
        let Some(format) = request.format() else {
            debug!("skipping `{}`, not a splat format", request.name);
            return Ok(None);
        };

        let Some(bytes) = request.contents.as_deref() else {
            return Err(IngestError::MissingSource { name: request.name });
        };

        let _busy = (!request.animation_frame).then(|| BusyScope::open(sink));
        let table = self.decode(format, bytes, &request)?;

        Ok(Some(SplatAsset::new(request.name.clone(), request.locator.clone(), table)))
    }

    /// Decode `bytes` as `format`, then validate, normalize, and reorder per `request`.
    pub fn decode(
        &self,
        format: SourceFormat,
        bytes: &[u8],
        request: &LoadRequest,
    ) -> Result<AttributeTable, IngestError> {
        debug!("decoding `{}` as {format:?} ({} bytes)", request.name, bytes.len());

        let mut table = match format {
            SourceFormat::Records => decode_splat(bytes)?,
            SourceFormat::Container(kind) => {
                let mut table = self
                    .container
                    .decode(kind, bytes, request.map_locator.as_ref())?;

                if normalize_table(&mut table)? {
                    info!("`{}` has 2d splats, flattened scale_2", request.name);
                }

                validate_table(&table)?;
                table
            },
        };

        if !request.animation_frame {
            reorder_morton(&mut table);
        }

        Ok(table)
    }
}
