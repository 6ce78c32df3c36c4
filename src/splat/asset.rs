use bevy::prelude::*;

use crate::splat::table::AttributeTable;


/// A decoded, validated splat table plus where it came from.
///
/// Only built once decoding and validation have succeeded, so a `SplatAsset`
/// never holds a partial table.
#[derive(
    Asset,
    Clone,
    Debug,
    TypePath,
)]
pub struct SplatAsset {
    pub name: String,
    pub locator: Option<String>,
    table: AttributeTable,
}

impl SplatAsset {
    pub(crate) fn new(
        name: impl Into<String>,
        locator: Option<String>,
        table: AttributeTable,
    ) -> Self {
        Self {
            name: name.into(),
            locator,
            table,
        }
    }

    pub fn table(&self) -> &AttributeTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
