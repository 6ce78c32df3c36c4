use std::{
    io::{
        BufRead,
        Cursor,
    },
    sync::Arc,
};

use bevy::log::warn;
use ply_rs::{
    parser::Parser,
    ply::{
        DefaultElement,
        Property,
        PropertyType,
        ScalarType,
    },
};

use crate::{
    error::IngestError,
    splat::table::{
        AttributeTable,
        ColumnData,
    },
};


#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
)]
pub enum ContainerKind {
    Ply,
    /// reserved `meta.json` descriptor whose attributes live in auxiliary resources
    Meta,
}

/// Maps an auxiliary resource name (e.g. a texture referenced by a container)
/// to the locator it should be fetched from.
pub type LocatorMap = Arc<dyn Fn(&str) -> String + Send + Sync>;


/// Structured container parsing, yielding a generic property table.
pub trait ContainerDecoder: Send + Sync {
    fn decode(
        &self,
        kind: ContainerKind,
        bytes: &[u8],
        map_locator: Option<&LocatorMap>,
    ) -> Result<AttributeTable, IngestError>;
}

impl<T: ContainerDecoder + ?Sized> ContainerDecoder for Arc<T> {
    fn decode(
        &self,
        kind: ContainerKind,
        bytes: &[u8],
        map_locator: Option<&LocatorMap>,
    ) -> Result<AttributeTable, IngestError> {
        (**self).decode(kind, bytes, map_locator)
    }
}


#[derive(Clone, Copy, Debug, Default)]
pub struct PlyContainerDecoder;

impl ContainerDecoder for PlyContainerDecoder {
    fn decode(
        &self,
        kind: ContainerKind,
        bytes: &[u8],
        _map_locator: Option<&LocatorMap>,
    ) -> Result<AttributeTable, IngestError> {
        match kind {
            ContainerKind::Ply => {
                let mut reader = Cursor::new(bytes);
                parse_ply_table(&mut reader)
            },
            ContainerKind::Meta => Err(IngestError::UnsupportedContainer(kind)),
        }
    }
}


fn property_f32(property: &Property) -> Option<f32> {
    match *property {
        Property::Char(v) => Some(v as f32),
        Property::UChar(v) => Some(v as f32),
        Property::Short(v) => Some(v as f32),
        Property::UShort(v) => Some(v as f32),
        Property::Int(v) => Some(v as f32),
        Property::UInt(v) => Some(v as f32),
        Property::Float(v) => Some(v),
        Property::Double(v) => Some(v as f32),
        _ => None,
    }
}

enum ColumnBuilder {
    F32(Vec<f32>),
    U8(Vec<u8>),
}

impl ColumnBuilder {
    fn push(&mut self, property: &Property) -> bool {
        match (self, property) {
            (ColumnBuilder::U8(values), Property::UChar(v)) => values.push(*v),
            (ColumnBuilder::F32(values), property) => match property_f32(property) {
                Some(v) => values.push(v),
                None => return false,
            },
            _ => return false,
        }
        true
    }

    fn finish(self) -> ColumnData {
        match self {
            ColumnBuilder::F32(values) => ColumnData::F32(values),
            ColumnBuilder::U8(values) => ColumnData::U8(values),
        }
    }
}


/// Read the `vertex` element of an ascii or binary ply into a table, keeping
/// header property order. `uchar` properties stay bytes, other scalars are
/// widened or narrowed to f32, list properties are skipped.
pub fn parse_ply_table(mut reader: &mut dyn BufRead) -> Result<AttributeTable, IngestError> {
    let parser = Parser::<DefaultElement>::new();
    let header = parser.read_header(&mut reader)?;

    let mut table = None;

    // binary payloads have to be consumed in header order
    for (_key, element) in &header.elements {
        let rows = parser.read_payload_for_element(&mut reader, element, &header)?;

        if element.name != "vertex" {
            continue;
        }

        let mut columns = Vec::new();
        for (name, property) in &element.properties {
            match property.data_type {
                PropertyType::Scalar(ScalarType::UChar) => {
                    columns.push((name.clone(), ColumnBuilder::U8(Vec::with_capacity(rows.len()))));
                },
                PropertyType::Scalar(_) => {
                    columns.push((name.clone(), ColumnBuilder::F32(Vec::with_capacity(rows.len()))));
                },
                PropertyType::List(..) => {
                    warn!("skipping ply list property `{name}`");
                },
            }
        }

        for (index, row) in rows.iter().enumerate() {
            for (name, column) in columns.iter_mut() {
                let pushed = row
                    .get(name.as_str())
                    .is_some_and(|property| column.push(property));

                if !pushed {
                    return Err(IngestError::ContainerDecode(format!(
                        "vertex {index} has no readable `{name}` property",
                    )));
                }
            }
        }

        let mut vertex = AttributeTable::vertex(rows.len());
        for (name, column) in columns {
            vertex.push(name, column.finish())?;
        }

        table = Some(vertex);
    }

    table.ok_or_else(|| IngestError::ContainerDecode("ply has no vertex element".to_string()))
}
