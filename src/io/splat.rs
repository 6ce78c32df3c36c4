use bytemuck::{
    Pod,
    Zeroable,
};
use static_assertions::const_assert_eq;

use crate::{
    error::IngestError,
    io::codec::SplatCodec,
    splat::{
        RECORD_FIELDS,
        REQUIRED_FIELDS,
        SH_C0,
        table::{
            AttributeTable,
            ColumnData,
        },
    },
};


pub const SPLAT_RECORD_STRIDE: usize = 32;


/// One little-endian `.splat` record: position and linear scale as f32 bits,
/// quantized sh dc color + opacity, quantized rotation.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Pod,
    Zeroable,
)]
#[repr(C)]
pub struct SplatRecord {
    pub position: [u32; 3],
    pub scale: [u32; 3],
    pub color: [u8; 4],
    pub rotation: [u8; 4],
}

const_assert_eq!(std::mem::size_of::<SplatRecord>(), SPLAT_RECORD_STRIDE);


pub fn decode_scale(linear: f32) -> f32 {
    linear.ln()
}

pub fn decode_color(byte: u8) -> f32 {
    (byte as f32 / 255.0 - 0.5) / SH_C0
}

/// Logit of `byte / 255`. Byte 0 is clamped to 1 so fully transparent
/// records decode to a large negative value instead of NaN.
pub fn decode_opacity(byte: u8) -> f32 {
    let byte = byte.max(1) as f32;
    -(255.0 / byte - 1.0).ln()
}

pub fn decode_rotation(byte: u8) -> f32 {
    (byte as f32 - 128.0) / 128.0
}

fn quantize(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

pub fn encode_color(sh: f32) -> u8 {
    quantize((sh * SH_C0 + 0.5) * 255.0)
}

pub fn encode_opacity(logit: f32) -> u8 {
    quantize(255.0 / (1.0 + (-logit).exp()))
}

pub fn encode_rotation(component: f32) -> u8 {
    quantize(component * 128.0 + 128.0)
}


impl SplatRecord {
    /// field values in `RECORD_FIELDS` order
    pub fn decode(&self) -> [f32; 15] {
        let float = |bits: u32| f32::from_bits(u32::from_le(bits));

        [
            float(self.position[0]),
            float(self.position[1]),
            float(self.position[2]),
            decode_opacity(self.color[3]),
            decode_scale(float(self.scale[0])),
            decode_scale(float(self.scale[1])),
            decode_scale(float(self.scale[2])),
            decode_rotation(self.rotation[0]),
            decode_rotation(self.rotation[1]),
            decode_rotation(self.rotation[2]),
            decode_rotation(self.rotation[3]),
            decode_color(self.color[0]),
            decode_color(self.color[1]),
            decode_color(self.color[2]),
            0.0,
        ]
    }

    /// `values` in `REQUIRED_FIELDS` order
    pub fn encode(values: &[f32; 14]) -> Self {
        let bits = |value: f32| value.to_bits().to_le();

        let rotation = [values[7], values[8], values[9], values[10]];
        let norm = rotation.iter().map(|v| v * v).sum::<f32>().sqrt();
        let rotation = if norm > 0.0 && norm.is_finite() {
            rotation.map(|v| v / norm)
        } else {
            [1.0, 0.0, 0.0, 0.0]
        };

        Self {
            position: [bits(values[0]), bits(values[1]), bits(values[2])],
            scale: [
                bits(values[4].exp()),
                bits(values[5].exp()),
                bits(values[6].exp()),
            ],
            color: [
                encode_color(values[11]),
                encode_color(values[12]),
                encode_color(values[13]),
                encode_opacity(values[3]),
            ],
            rotation: rotation.map(encode_rotation),
        }
    }
}


/// Decode a buffer of fixed 32 byte records into a `vertex` table.
///
/// The splat count is `bytes.len() / 32`; any other length is rejected
/// before a table is built.
pub fn decode_splat(bytes: &[u8]) -> Result<AttributeTable, IngestError> {
    if bytes.len() % SPLAT_RECORD_STRIDE != 0 {
        return Err(IngestError::MalformedRecordBuffer { len: bytes.len() });
    }

    let count = bytes.len() / SPLAT_RECORD_STRIDE;
    let mut columns: [Vec<f32>; 15] = std::array::from_fn(|_| Vec::with_capacity(count));

    for chunk in bytes.chunks_exact(SPLAT_RECORD_STRIDE) {
        let record: SplatRecord = bytemuck::pod_read_unaligned(chunk);

        for (column, value) in columns.iter_mut().zip(record.decode()) {
            column.push(value);
        }
    }

    let mut table = AttributeTable::vertex(count);
    for (name, values) in RECORD_FIELDS.into_iter().zip(columns) {
        table.push(name, ColumnData::F32(values))?;
    }

    Ok(table)
}

/// Quantize a table back into 32 byte records, the inverse of [`decode_splat`].
pub fn encode_splat(table: &AttributeTable) -> Result<Vec<u8>, IngestError> {
    let missing = table.missing(&REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(IngestError::MissingRequiredFields { fields: missing });
    }

    let columns = REQUIRED_FIELDS.map(|name| table.column(name));

    let mut bytes = Vec::with_capacity(table.len() * SPLAT_RECORD_STRIDE);
    for i in 0..table.len() {
        let values = columns.map(|column| {
            column
                .and_then(|column| column.get_f32(i))
                .unwrap_or_default()
        });

        bytes.extend_from_slice(bytemuck::bytes_of(&SplatRecord::encode(&values)));
    }

    Ok(bytes)
}


impl SplatCodec for AttributeTable {
    fn encode(&self) -> Result<Vec<u8>, IngestError> {
        encode_splat(self)
    }

    fn decode(data: &[u8]) -> Result<Self, IngestError> {
        decode_splat(data)
    }
}
