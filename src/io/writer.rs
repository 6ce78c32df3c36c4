use std::io::Write;

use crate::{
    error::IngestError,
    io::codec::SplatCodec,
    splat::table::AttributeTable,
};


pub fn write_splat_to_file(
    table: &AttributeTable,
    path: &str,
) -> Result<(), IngestError> {
    let data = table.encode()?;

    let splat_file = std::fs::File::create(path)?;
    let mut splat_writer = std::io::BufWriter::new(splat_file);

    splat_writer.write_all(data.as_slice())?;
    splat_writer.flush()?;

    Ok(())
}
