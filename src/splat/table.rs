use serde::{
    Deserialize,
    Serialize,
};

use crate::error::IngestError;


#[derive(
    Clone,
    Debug,
    PartialEq,
    Serialize,
    Deserialize,
)]
pub enum ColumnData {
    F32(Vec<f32>),
    U8(Vec<u8>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::F32(values) => values.len(),
            ColumnData::U8(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// byte columns are widened without rescaling
    pub fn get_f32(&self, index: usize) -> Option<f32> {
        match self {
            ColumnData::F32(values) => values.get(index).copied(),
            ColumnData::U8(values) => values.get(index).map(|&v| v as f32),
        }
    }

    fn permuted(&self, order: &[u32]) -> ColumnData {
        match self {
            ColumnData::F32(values) => ColumnData::F32(
                order.iter().map(|&i| values[i as usize]).collect()
            ),
            ColumnData::U8(values) => ColumnData::U8(
                order.iter().map(|&i| values[i as usize]).collect()
            ),
        }
    }
}


#[derive(
    Clone,
    Debug,
    PartialEq,
    Serialize,
    Deserialize,
)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}


/// Parallel named arrays of one element (usually `vertex`), one entry per splat.
///
/// Every column holds exactly `len` entries and names are unique. Field order
/// is preserved because downstream consumers index fields positionally.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "UncheckedTable")]
pub struct AttributeTable {
    element: String,
    len: usize,
    columns: Vec<Column>,
}

/// deserialized form, checked column by column through [`AttributeTable::push`]
#[derive(Deserialize)]
struct UncheckedTable {
    element: String,
    len: usize,
    columns: Vec<Column>,
}

impl TryFrom<UncheckedTable> for AttributeTable {
    type Error = IngestError;

    fn try_from(unchecked: UncheckedTable) -> Result<Self, Self::Error> {
        let mut table = AttributeTable::new(unchecked.element, unchecked.len);
        for column in unchecked.columns {
            table.push(column.name, column.data)?;
        }

        Ok(table)
    }
}

impl AttributeTable {
    pub fn new(element: impl Into<String>, len: usize) -> Self {
        Self {
            element: element.into(),
            len,
            columns: Vec::new(),
        }
    }

    pub fn vertex(len: usize) -> Self {
        Self::new("vertex", len)
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| &column.data)
    }

    pub fn f32(&self, name: &str) -> Option<&[f32]> {
        match self.column(name)? {
            ColumnData::F32(values) => Some(values.as_slice()),
            ColumnData::U8(_) => None,
        }
    }

    pub fn push(
        &mut self,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<(), IngestError> {
        let index = self.columns.len();
        self.insert(index, name, data)
    }

    pub fn insert(
        &mut self,
        index: usize,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<(), IngestError> {
        let name = name.into();

        if self.contains(&name) {
            return Err(IngestError::DuplicateField(name));
        }

        if data.len() != self.len {
            return Err(IngestError::ColumnLength {
                name,
                expected: self.len,
                actual: data.len(),
            });
        }

        let index = index.min(self.columns.len());
        self.columns.insert(index, Column { name, data });

        Ok(())
    }

    /// appends when `anchor` is absent
    pub fn insert_after(
        &mut self,
        anchor: &str,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<(), IngestError> {
        let index = self
            .position(anchor)
            .map_or(self.columns.len(), |i| i + 1);

        self.insert(index, name, data)
    }

    /// names from `required` that this table lacks, in `required` order
    pub fn missing(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.contains(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// reorder rows so that row `i` becomes the old row `order[i]`
    pub fn permute(&mut self, order: &[u32]) {
        debug_assert_eq!(order.len(), self.len);

        for column in self.columns.iter_mut() {
            column.data = column.data.permuted(order);
        }
    }

    pub fn summary(&self) -> TableSummary {
        let bounds = match (self.f32("x"), self.f32("y"), self.f32("z")) {
            (Some(x), Some(y), Some(z)) => PositionBounds::from_positions(x, y, z),
            _ => None,
        };

        TableSummary {
            element: self.element.clone(),
            count: self.len,
            fields: self.field_names().map(str::to_string).collect(),
            bounds,
        }
    }
}


#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Serialize,
    Deserialize,
)]
pub struct PositionBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl PositionBounds {
    /// bounds over finite positions only
    pub fn from_positions(x: &[f32], y: &[f32], z: &[f32]) -> Option<Self> {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        let mut any = false;

        for ((&x, &y), &z) in x.iter().zip(y).zip(z) {
            let position = [x, y, z];
            if !position.iter().all(|v| v.is_finite()) {
                continue;
            }

            any = true;
            for axis in 0..3 {
                min[axis] = min[axis].min(position[axis]);
                max[axis] = max[axis].max(position[axis]);
            }
        }

        any.then_some(Self { min, max })
    }
}


#[derive(
    Clone,
    Debug,
    PartialEq,
    Serialize,
    Deserialize,
)]
pub struct TableSummary {
    pub element: String,
    pub count: usize,
    pub fields: Vec<String>,
    pub bounds: Option<PositionBounds>,
}


#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(names: &[&str], len: usize) -> AttributeTable {
        let mut table = AttributeTable::vertex(len);
        for name in names {
            table.push(*name, ColumnData::F32(vec![0.0; len])).unwrap();
        }
        table
    }

    #[test]
    fn deserialize_checks_columns() {
        let table = table_with(&["x", "y"], 2);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(serde_json::from_str::<AttributeTable>(&json).unwrap(), table);

        let short = r#"{"element":"vertex","len":3,"columns":[{"name":"x","data":{"F32":[0.0]}}]}"#;
        let err = serde_json::from_str::<AttributeTable>(short).unwrap_err();
        assert!(err.to_string().contains("`x`"), "{err}");

        let duplicate = r#"{"element":"vertex","len":1,"columns":[
            {"name":"x","data":{"F32":[0.0]}},
            {"name":"x","data":{"U8":[1]}}
        ]}"#;
        assert!(serde_json::from_str::<AttributeTable>(duplicate).is_err());
    }

    #[test]
    fn insert_after_keeps_order() {
        let mut table = table_with(&["scale_0", "scale_1", "rot_0"], 2);
        table.insert_after("scale_1", "scale_2", ColumnData::F32(vec![1.0, 2.0])).unwrap();

        let names: Vec<_> = table.field_names().collect();
        assert_eq!(names, ["scale_0", "scale_1", "scale_2", "rot_0"]);
        assert_eq!(table.f32("scale_2"), Some([1.0, 2.0].as_slice()));
    }

    #[test]
    fn insert_after_missing_anchor_appends() {
        let mut table = table_with(&["x"], 1);
        table.insert_after("nope", "y", ColumnData::F32(vec![0.0])).unwrap();

        assert_eq!(table.position("y"), Some(1));
    }

    #[test]
    fn rejects_duplicate_fields() {
        let mut table = table_with(&["x"], 1);
        let err = table.push("x", ColumnData::F32(vec![0.0])).unwrap_err();

        assert!(matches!(err, IngestError::DuplicateField(name) if name == "x"));
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut table = AttributeTable::vertex(3);
        let err = table.push("x", ColumnData::U8(vec![0; 2])).unwrap_err();

        assert!(matches!(
            err,
            IngestError::ColumnLength { expected: 3, actual: 2, .. }
        ));
        assert_eq!(table.field_count(), 0);
    }

    #[test]
    fn missing_lists_every_absent_field() {
        let table = table_with(&["x", "z"], 1);

        assert_eq!(table.missing(&["x", "y", "z", "w"]), ["y", "w"]);
    }

    #[test]
    fn permute_moves_rows_in_every_column() {
        let mut table = AttributeTable::vertex(3);
        table.push("a", ColumnData::F32(vec![0.0, 1.0, 2.0])).unwrap();
        table.push("b", ColumnData::U8(vec![10, 11, 12])).unwrap();

        table.permute(&[2, 0, 1]);

        assert_eq!(table.f32("a"), Some([2.0, 0.0, 1.0].as_slice()));
        assert_eq!(table.column("b"), Some(&ColumnData::U8(vec![12, 10, 11])));
    }

    #[test]
    fn summary_bounds_skip_non_finite_positions() {
        let mut table = AttributeTable::vertex(3);
        table.push("x", ColumnData::F32(vec![-1.0, f32::NAN, 4.0])).unwrap();
        table.push("y", ColumnData::F32(vec![0.0, 0.0, 2.0])).unwrap();
        table.push("z", ColumnData::F32(vec![5.0, 0.0, -3.0])).unwrap();

        let summary = table.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(
            summary.bounds,
            Some(PositionBounds {
                min: [-1.0, 0.0, -3.0],
                max: [4.0, 2.0, 5.0],
            }),
        );
    }
}
