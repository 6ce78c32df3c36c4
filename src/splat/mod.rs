pub mod asset;
pub mod rand;
pub mod reorder;
pub mod table;

pub use asset::SplatAsset;
pub use table::{
    AttributeTable,
    Column,
    ColumnData,
    TableSummary,
};


/// zeroth order spherical harmonic normalization constant
pub const SH_C0: f32 = 0.282_094_8;

/// log-scale used to flatten legacy 2d splats along their third axis
pub const FLAT_SCALE: f32 = 1e-6;

pub const STATE_FIELD: &str = "state";

/// every splat source must provide these, `state` is not required
pub const REQUIRED_FIELDS: [&str; 14] = [
    "x", "y", "z",
    "opacity",
    "scale_0", "scale_1", "scale_2",
    "rot_0", "rot_1", "rot_2", "rot_3",
    "f_dc_0", "f_dc_1", "f_dc_2",
];

/// decoded record layout, in table field order
pub const RECORD_FIELDS: [&str; 15] = [
    "x", "y", "z",
    "opacity",
    "scale_0", "scale_1", "scale_2",
    "rot_0", "rot_1", "rot_2", "rot_3",
    "f_dc_0", "f_dc_1", "f_dc_2",
    STATE_FIELD,
];
