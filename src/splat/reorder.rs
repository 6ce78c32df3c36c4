#[cfg(feature = "sort_rayon")]
use rayon::prelude::*;

use crate::splat::table::{
    AttributeTable,
    PositionBounds,
};


const MORTON_BITS: u32 = 10;
const MORTON_MAX: f32 = ((1 << MORTON_BITS) - 1) as f32;


// spread the low 10 bits of v so two zero bits sit between each
fn part_1_by_2(v: u32) -> u32 {
    let mut v = v & 0x0000_03ff;
    v = (v ^ (v << 16)) & 0xff00_00ff;
    v = (v ^ (v << 8)) & 0x0300_f00f;
    v = (v ^ (v << 4)) & 0x030c_30c3;
    v = (v ^ (v << 2)) & 0x0924_9249;
    v
}

pub fn morton_code(x: u32, y: u32, z: u32) -> u32 {
    part_1_by_2(x) | (part_1_by_2(y) << 1) | (part_1_by_2(z) << 2)
}

fn quantize(value: f32, min: f32, max: f32) -> u32 {
    let extent = max - min;
    if !value.is_finite() || extent <= 0.0 {
        return 0;
    }

    (((value - min) / extent) * MORTON_MAX)
        .round()
        .clamp(0.0, MORTON_MAX) as u32
}

/// Row order along a Z-order curve through the finite position bounds.
///
/// Returns `None` when the table has no f32 position fields or more rows than
/// `u32` can index. Rows with equal codes keep their relative order.
pub fn morton_order(table: &AttributeTable) -> Option<Vec<u32>> {
    let count = u32::try_from(table.len()).ok()?;
    let (x, y, z) = (table.f32("x")?, table.f32("y")?, table.f32("z")?);

    let bounds = PositionBounds::from_positions(x, y, z).unwrap_or(PositionBounds {
        min: [0.0; 3],
        max: [0.0; 3],
    });

    let code = |i: usize| {
        morton_code(
            quantize(x[i], bounds.min[0], bounds.max[0]),
            quantize(y[i], bounds.min[1], bounds.max[1]),
            quantize(z[i], bounds.min[2], bounds.max[2]),
        )
    };

    #[cfg(feature = "sort_rayon")]
    let codes: Vec<u32> = (0..table.len()).into_par_iter().map(code).collect();

    #[cfg(not(feature = "sort_rayon"))]
    let codes: Vec<u32> = (0..table.len()).map(code).collect();

    let mut order: Vec<u32> = (0..count).collect();

    #[cfg(feature = "sort_rayon")]
    order.par_sort_by_key(|&i| codes[i as usize]);

    #[cfg(not(feature = "sort_rayon"))]
    order.sort_by_key(|&i| codes[i as usize]);

    Some(order)
}

/// returns false when the table has no positions to order by, or is too large to index
pub fn reorder_morton(table: &mut AttributeTable) -> bool {
    match morton_order(table) {
        Some(order) => {
            table.permute(&order);
            true
        },
        None => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::splat::table::ColumnData;

    #[test]
    fn interleaves_axis_bits() {
        assert_eq!(morton_code(1, 0, 0), 0b001);
        assert_eq!(morton_code(0, 1, 0), 0b010);
        assert_eq!(morton_code(0, 0, 1), 0b100);
        assert_eq!(morton_code(3, 0, 0), 0b1001);
        assert_eq!(morton_code(1023, 1023, 1023), (1 << 30) - 1);
    }

    #[test]
    fn orders_rows_along_the_curve() {
        let mut table = AttributeTable::vertex(4);
        table.push("x", ColumnData::F32(vec![1.0, 0.0, 1.0, 0.0])).unwrap();
        table.push("y", ColumnData::F32(vec![1.0, 0.0, 0.0, 1.0])).unwrap();
        table.push("z", ColumnData::F32(vec![0.0; 4])).unwrap();
        table.push("id", ColumnData::U8(vec![0, 1, 2, 3])).unwrap();

        assert!(reorder_morton(&mut table));

        // (0,0) -> (1,0) -> (0,1) -> (1,1)
        assert_eq!(table.column("id"), Some(&ColumnData::U8(vec![1, 2, 3, 0])));
    }

    #[test]
    fn tables_without_positions_are_left_alone() {
        let mut table = AttributeTable::vertex(2);
        table.push("opacity", ColumnData::F32(vec![0.5, 0.25])).unwrap();

        assert!(!reorder_morton(&mut table));
        assert_eq!(table.f32("opacity"), Some([0.5, 0.25].as_slice()));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_tables_are_not_reordered() {
        let mut table = AttributeTable::new("vertex", u32::MAX as usize + 1);

        assert_eq!(morton_order(&table), None);
        assert!(!reorder_morton(&mut table));
        assert_eq!(table.len(), u32::MAX as usize + 1);
    }
}
