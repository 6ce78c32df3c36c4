use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
};

use bevy::tasks::futures_lite::{
    AsyncRead,
    io::Cursor,
};

use crate::error::IngestError;


pub type TransferFuture<'a> =
    Pin<Box<dyn Future<Output = Result<TransferResponse<'a>, IngestError>> + Send + 'a>>;

pub type TransferBody<'a> = Box<dyn AsyncRead + Send + Unpin + 'a>;


/// An opened transfer: status, declared size, and the body to read it from.
pub struct TransferResponse<'a> {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Option<TransferBody<'a>>,
}

impl<'a> TransferResponse<'a> {
    pub fn ok(body: TransferBody<'a>, content_length: Option<u64>) -> Self {
        Self {
            status: 200,
            content_length,
            body: Some(body),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_length: None,
            body: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}


/// Opens byte streams for remote locators.
pub trait Transport: Send + Sync {
    fn open<'a>(&'a self, locator: &'a str) -> TransferFuture<'a>;
}


#[derive(Clone, Debug)]
struct MemoryResource {
    bytes: Vec<u8>,
    declare_length: bool,
}

/// Serves registered byte blobs by locator, 404 for anything else.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    resources: HashMap<String, MemoryResource>,
}

impl MemoryTransport {
    pub fn with_resource(
        mut self,
        locator: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.resources.insert(locator.into(), MemoryResource {
            bytes,
            declare_length: true,
        });
        self
    }

    /// served without a content length, like a chunked response
    pub fn with_unsized_resource(
        mut self,
        locator: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.resources.insert(locator.into(), MemoryResource {
            bytes,
            declare_length: false,
        });
        self
    }
}

impl Transport for MemoryTransport {
    fn open<'a>(&'a self, locator: &'a str) -> TransferFuture<'a> {
        Box::pin(async move {
            let Some(resource) = self.resources.get(locator) else {
                return Ok(TransferResponse::status(404));
            };

            let content_length = resource
                .declare_length
                .then_some(resource.bytes.len() as u64);
            let body: TransferBody<'a> = Box::new(Cursor::new(resource.bytes.as_slice()));

            Ok(TransferResponse::ok(body, content_length))
        })
    }
}
