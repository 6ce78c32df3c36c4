use crate::error::IngestError;


// TODO: support streamed codecs once a splat format carries its record count up front
pub trait SplatCodec: Sized {
    fn encode(&self) -> Result<Vec<u8>, IngestError>;
    fn decode(data: &[u8]) -> Result<Self, IngestError>;
}
