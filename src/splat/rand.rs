use rand::Rng;

use crate::splat::{
    RECORD_FIELDS,
    STATE_FIELD,
    table::{
        AttributeTable,
        ColumnData,
    },
};


fn sample_field<R: Rng + ?Sized>(rng: &mut R, name: &str) -> f32 {
    match name {
        "x" | "y" | "z" => rng.gen_range(-20.0..20.0),
        "opacity" => rng.gen_range(-4.0..4.0),
        "scale_0" | "scale_1" | "scale_2" => rng.gen_range(-6.0..0.0),
        "rot_0" | "rot_1" | "rot_2" | "rot_3" => rng.gen_range(-1.0..1.0),
        "f_dc_0" | "f_dc_1" | "f_dc_2" => rng.gen_range(-1.5..1.5),
        _ => 0.0,
    }
}

/// random table in the decoded record layout, values within what the record format can carry
pub fn random_splats(n: usize) -> AttributeTable {
    let mut rng = rand::thread_rng();
    let mut table = AttributeTable::vertex(n);

    for name in RECORD_FIELDS {
        let values = if name == STATE_FIELD {
            vec![0.0; n]
        } else {
            (0..n).map(|_| sample_field(&mut rng, name)).collect()
        };

        table
            .push(name, ColumnData::F32(values))
            .expect("record fields are unique and sized to n");
    }

    table
}
