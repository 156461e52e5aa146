use crate::types::Pt;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// One column of a listing.
///
/// A *long* column may have its cell content divided across a page boundary;
/// every other column is repeated whole on each fragment of a split row. An
/// *expandable* column absorbs an equal share of unused width.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    base_width: Option<Pt>,
    width: Pt,
    align: ColumnAlign,
    long: bool,
    expandable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_width: None,
            width: Pt::ZERO,
            align: ColumnAlign::Left,
            long: false,
            expandable: false,
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        let width = Pt::from_f32(width).max(Pt::ZERO);
        self.base_width = Some(width);
        self.width = width;
        self
    }

    pub fn with_align(mut self, align: ColumnAlign) -> Self {
        self.align = align;
        self
    }

    pub fn long(mut self) -> Self {
        self.long = true;
        self
    }

    pub fn expandable(mut self) -> Self {
        self.expandable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared width; `None` when the producer left it out.
    pub fn base_width(&self) -> Option<Pt> {
        self.base_width
    }

    /// Width used for layout. Equals the declared width (zero when missing)
    /// until the owning listing distributes its slack.
    pub fn width(&self) -> Pt {
        self.width
    }

    pub fn align(&self) -> ColumnAlign {
        self.align
    }

    pub fn is_long(&self) -> bool {
        self.long
    }

    pub fn is_expandable(&self) -> bool {
        self.expandable
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    columns: Vec<Column>,
    gap: Pt,
}

impl ColumnSchema {
    pub fn new(columns: Vec<Column>, gap: Pt) -> Self {
        Self { columns, gap }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) fn set_gap(&mut self, gap: Pt) {
        self.gap = gap;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn widths(&self) -> Vec<Pt> {
        self.columns.iter().map(Column::width).collect()
    }

    /// Horizontal offset of each column relative to the listing's left edge.
    pub fn offsets(&self) -> Vec<Pt> {
        let mut offsets = Vec::with_capacity(self.columns.len());
        let mut x = Pt::ZERO;
        for column in &self.columns {
            offsets.push(x);
            x += column.width + self.gap;
        }
        offsets
    }

    /// Width the columns occupy, gaps included.
    pub fn needed_width(&self) -> Pt {
        let widths: Pt = self.columns.iter().map(Column::width).sum();
        widths + self.gap * (self.columns.len().saturating_sub(1) as i32)
    }

    /// Returns a copy whose expandable columns share the slack left in
    /// `available_width` equally. Without expandable columns the widths are
    /// returned untouched, even when they overflow.
    pub fn adjusted(&self, available_width: Pt) -> ColumnSchema {
        let expandables = self.columns.iter().filter(|c| c.expandable).count();
        if expandables == 0 {
            return self.clone();
        }

        let slack = available_width - self.needed_width();
        if slack.is_negative() {
            warn!(
                "listing columns need {} but only {} is available; shrinking {} expandable column(s)",
                self.needed_width(),
                available_width,
                expandables
            );
        }
        let share = slack / (expandables as i32);
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut column = column.clone();
                if column.expandable {
                    column.width = (column.width + share).max(Pt::ZERO);
                }
                column
            })
            .collect();
        ColumnSchema {
            columns,
            gap: self.gap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(expandable: &[bool]) -> ColumnSchema {
        let columns = expandable
            .iter()
            .enumerate()
            .map(|(i, &grow)| {
                let column = Column::new(format!("c{i}")).with_width(50.0);
                if grow { column.expandable() } else { column }
            })
            .collect();
        ColumnSchema::new(columns, Pt::from_i32(10))
    }

    #[test]
    fn expandable_columns_share_slack_equally() {
        let adjusted = schema(&[false, true, false, true]).adjusted(Pt::from_i32(300));
        assert_eq!(
            adjusted.widths(),
            vec![
                Pt::from_i32(50),
                Pt::from_i32(85),
                Pt::from_i32(50),
                Pt::from_i32(85)
            ]
        );
        assert_eq!(adjusted.needed_width(), Pt::from_i32(300));
    }

    #[test]
    fn fixed_columns_are_left_alone() {
        let original = schema(&[false, false]);
        assert_eq!(original.adjusted(Pt::from_i32(40)), original);
        assert_eq!(original.adjusted(Pt::from_i32(900)), original);
    }

    #[test]
    fn readjusting_at_the_same_width_is_a_no_op() {
        let once = schema(&[true, false, true]).adjusted(Pt::from_i32(400));
        let twice = once.adjusted(Pt::from_i32(400));
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_width_defaults_to_zero() {
        let columns = ColumnSchema::new(
            vec![
                Column::new("Field").with_width(40.0),
                Column::new("Operation").long().expandable(),
            ],
            Pt::from_i32(10),
        );
        assert_eq!(columns.column(1).and_then(Column::base_width), None);
        assert_eq!(columns.needed_width(), Pt::from_i32(50));
        let adjusted = columns.adjusted(Pt::from_i32(200));
        assert_eq!(adjusted.widths(), vec![Pt::from_i32(40), Pt::from_i32(150)]);
    }

    #[test]
    fn offsets_include_gaps() {
        let offsets = schema(&[false, false, false]).offsets();
        assert_eq!(
            offsets,
            vec![Pt::ZERO, Pt::from_i32(60), Pt::from_i32(120)]
        );
    }
}
