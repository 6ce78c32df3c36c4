use bevy::{
    log::debug,
    tasks::futures_lite::{
        AsyncRead,
        AsyncReadExt,
    },
};
use byte_unit::{
    Byte,
    UnitType,
};

use crate::{
    error::IngestError,
    io::{
        progress::{
            ProgressScope,
            ProgressSink,
        },
        transport::Transport,
    },
};


pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// the rest is left for decoding, so a transfer alone never shows 100%
pub const SIZED_PROGRESS_CAP: f32 = 95.0;
pub const UNSIZED_PROGRESS_CAP: f32 = 89.0;
const UNSIZED_PROGRESS_SCALE: f64 = 16.0 * 1024.0 * 1024.0;


/// Transfer progress in percent.
///
/// With a declared size this is the received fraction, capped at
/// [`SIZED_PROGRESS_CAP`]. Without one, an estimate that keeps rising with
/// every byte and stays at or below [`UNSIZED_PROGRESS_CAP`].
pub fn transfer_percentage(received: u64, total: Option<u64>) -> f32 {
    match total.filter(|&total| total > 0) {
        Some(total) => {
            let fraction = received as f64 / total as f64;
            ((fraction * 100.0) as f32).min(SIZED_PROGRESS_CAP)
        },
        None => {
            let estimate = 90.0 * (1.0 - (-(received as f64) / UNSIZED_PROGRESS_SCALE).exp());
            (estimate as f32).min(UNSIZED_PROGRESS_CAP)
        },
    }
}

fn human_bytes(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Decimal);
    format!("{adjusted:.1}")
}

fn transfer_text(received: u64, total: Option<u64>) -> String {
    match total.filter(|&total| total > 0) {
        Some(total) => format!("Downloading {} / {}", human_bytes(received), human_bytes(total)),
        None => format!("Downloading {}", human_bytes(received)),
    }
}


/// Chunked retrieval of a byte source into one contiguous buffer.
///
/// The record format has no header declaring its count, so the whole payload
/// is assembled before anything is decoded.
#[derive(Clone, Copy, Debug)]
pub struct StreamIngester {
    chunk_size: usize,
}

impl Default for StreamIngester {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl StreamIngester {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fetch `locator` under its own progress scope.
    pub async fn ingest<T: Transport + ?Sized>(
        &self,
        transport: &T,
        locator: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<u8>, IngestError> {
        let mut progress = ProgressScope::open(sink, &format!("Downloading {locator}"));
        self.fetch(transport, locator, &mut progress).await
    }

    pub async fn fetch<T: Transport + ?Sized>(
        &self,
        transport: &T,
        locator: &str,
        progress: &mut ProgressScope<'_>,
    ) -> Result<Vec<u8>, IngestError> {
        let response = transport.open(locator).await?;

        if !response.is_success() {
            return Err(IngestError::TransferFailed {
                locator: locator.to_string(),
                status: response.status,
            });
        }

        let Some(mut body) = response.body else {
            return Err(IngestError::TransferFailed {
                locator: locator.to_string(),
                status: response.status,
            });
        };

        self.read_body(locator, &mut body, response.content_length, progress).await
    }

    /// Read `body` to completion, reporting progress after every chunk.
    ///
    /// Chunks are joined in the order they arrived. A failed read, or a stream
    /// that ends short of its declared `total`, discards everything received.
    pub async fn read_body<R: AsyncRead + Unpin + ?Sized>(
        &self,
        locator: &str,
        body: &mut R,
        total: Option<u64>,
        progress: &mut ProgressScope<'_>,
    ) -> Result<Vec<u8>, IngestError> {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        let mut received: u64 = 0;
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let read = match body.read(&mut buffer).await {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(IngestError::StreamInterrupted {
                        locator: locator.to_string(),
                        source,
                    });
                },
            };

            chunks.push(buffer[..read].to_vec());
            received += read as u64;

            progress.update(
                &transfer_text(received, total),
                transfer_percentage(received, total),
            );
        }

        if let Some(total) = total.filter(|&total| total > 0) {
            if received < total {
                return Err(IngestError::StreamInterrupted {
                    locator: locator.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("stream ended after {received} of {total} bytes"),
                    ),
                });
            }
        }

        debug!("received {} bytes of `{locator}` in {} chunks", received, chunks.len());

        Ok(chunks.concat())
    }
}
