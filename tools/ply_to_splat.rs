use byte_unit::{Byte, UnitType};

use bevy_splat_ingest::{
    LoadDispatcher,
    LoadRequest,
    io::{
        progress::NoProgress,
        writer::write_splat_to_file,
    },
};

// TODO: accept an output path and animation-frame flag through SplatIngestConfig
fn main() {
    let filename = std::env::args().nth(1).expect("no filename given");

    println!("converting `{filename}` file to splat");

    let bytes = std::fs::read(&filename).expect("failed to read file");

    // animation frame keeps the source splat order
    let request = LoadRequest::local(filename.clone(), bytes).with_animation_frame(true);
    let splat = LoadDispatcher::default()
        .load_contents(request, &NoProgress)
        .expect("failed to decode ply file")
        .expect("input is not a .ply or .splat file");

    println!("splat count: {}", splat.len());

    let base_filename = filename
        .rsplit_once('.')
        .map_or(filename.as_str(), |(base, _)| base)
        .to_string();
    let splat_filename = base_filename + ".splat";

    write_splat_to_file(splat.table(), &splat_filename).expect("failed to write splat file");

    let post_encode_bytes = Byte::from_u64(
        std::fs::metadata(&splat_filename)
            .expect("failed to get metadata")
            .len(),
    );
    println!(
        "output file size: {}",
        post_encode_bytes.get_appropriate_unit(UnitType::Decimal)
    );
}
