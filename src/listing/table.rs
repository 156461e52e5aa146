use crate::canvas::Canvas;
use crate::error::FlowlistError;
use crate::flowable::Flowable;
use crate::listing::column::{Column, ColumnSchema};
use crate::listing::entry::{CellContent, EntryMetrics, ListEntry};
use crate::listing::render;
use crate::listing::style::ListingStyle;
use crate::types::{Pt, Size};
use log::debug;
use std::sync::OnceLock;

/// Outcome of [`Listing::split_listing`].
#[derive(Debug, Clone)]
pub enum ListingSplit {
    /// Nothing can start here; the whole listing moves to the next page.
    Deferred,
    /// Splitting would not divide anything: there are no rows, or every row
    /// fits.
    Unchanged,
    Split {
        head: Listing,
        continuation: Listing,
    },
}

/// A table whose rows flow across pages.
///
/// Column widths are distributed once, at the first measurement, and the
/// resulting schema is handed unchanged to every fragment produced by
/// splitting.
#[derive(Debug, Clone)]
pub struct Listing {
    columns: ColumnSchema,
    resolved: OnceLock<ColumnSchema>,
    rows: Vec<ListEntry>,
    style: ListingStyle,
}

impl Listing {
    pub fn new(columns: Vec<Column>) -> Self {
        let style = ListingStyle::default();
        Self {
            columns: ColumnSchema::new(columns, style.column_gap),
            resolved: OnceLock::new(),
            rows: Vec::new(),
            style,
        }
    }

    pub fn with_style(mut self, style: ListingStyle) -> Result<Self, FlowlistError> {
        style.validate()?;
        self.columns.set_gap(style.column_gap);
        self.style = style;
        self.resolved = OnceLock::new();
        Ok(self)
    }

    pub fn add_row(&mut self, entry: ListEntry) -> Result<(), FlowlistError> {
        if entry.cells().len() != self.columns.len() {
            return Err(FlowlistError::ColumnCountMismatch {
                expected: self.columns.len(),
                found: entry.cells().len(),
            });
        }
        self.rows.push(entry);
        Ok(())
    }

    pub fn add_cells(&mut self, cells: Vec<CellContent>) -> Result<(), FlowlistError> {
        self.add_row(ListEntry::new(cells))
    }

    pub fn rows(&self) -> &[ListEntry] {
        &self.rows
    }

    pub fn style(&self) -> &ListingStyle {
        &self.style
    }

    /// Columns as declared by the producer.
    pub fn columns(&self) -> &ColumnSchema {
        &self.columns
    }

    /// Columns with their final widths. The first call fixes them for the
    /// lifetime of this listing and of every fragment split from it.
    pub fn resolve_columns(&self, avail_width: Pt) -> &ColumnSchema {
        self.resolved
            .get_or_init(|| self.columns.adjusted(avail_width))
    }

    pub fn measure_rows(&self, avail_width: Pt) -> Vec<EntryMetrics> {
        let columns = self.resolve_columns(avail_width);
        self.rows
            .iter()
            .map(|row| row.measure(columns, avail_width))
            .collect()
    }

    pub fn split_listing(&self, avail_width: Pt, avail_height: Pt) -> ListingSplit {
        if self.rows.is_empty() {
            return ListingSplit::Unchanged;
        }

        let columns = self.resolve_columns(avail_width);
        let threshold = self.style.short_row_threshold;
        let gap = self.style.row_gap;
        let metrics = self.measure_rows(avail_width);

        if avail_height < self.style.header_height + metrics[0].min_height(threshold) {
            debug!(
                "listing deferred: {} available, first row needs {} plus header",
                avail_height,
                metrics[0].min_height(threshold)
            );
            return ListingSplit::Deferred;
        }

        let mut remaining = avail_height - self.style.header_height;
        let mut head = Vec::new();
        let mut continuation = Vec::new();

        for (index, (row, m)) in self.rows.iter().zip(&metrics).enumerate() {
            let room = remaining - gap;
            if m.height <= room {
                head.push(row.clone());
                remaining -= m.height + gap;
                continue;
            }

            if m.min_height(threshold) >= room {
                debug!(
                    "listing row {index} deferred: min height {} leaves nothing of {room}",
                    m.min_height(threshold)
                );
                continuation.extend(self.rows[index..].iter().cloned());
                break;
            }

            match row.split(columns, room) {
                Some(parts) => {
                    debug!("listing row {index} split at {room} (height {})", m.height);
                    head.push(parts.head);
                    continuation.push(parts.continuation);
                    continuation.extend(self.rows[index + 1..].iter().cloned());
                }
                None => {
                    debug!("listing row {index} cannot start in {room}; deferred");
                    continuation.extend(self.rows[index..].iter().cloned());
                }
            }
            break;
        }

        if head.is_empty() {
            return ListingSplit::Deferred;
        }
        if continuation.is_empty() {
            return ListingSplit::Unchanged;
        }
        debug!(
            "listing split: {} row(s) placed, {} row(s) continued",
            head.len(),
            continuation.len()
        );
        ListingSplit::Split {
            head: self.fragment(head, columns),
            continuation: self.fragment(continuation, columns),
        }
    }

    fn fragment(&self, rows: Vec<ListEntry>, columns: &ColumnSchema) -> Listing {
        Listing {
            columns: self.columns.clone(),
            resolved: OnceLock::from(columns.clone()),
            rows,
            style: self.style.clone(),
        }
    }
}

impl Flowable for Listing {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let rows: Pt = self
            .measure_rows(avail_width)
            .iter()
            .map(|m| m.height + self.style.row_gap)
            .sum();
        Size {
            width: avail_width,
            height: self.style.header_height + rows,
        }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        match self.split_listing(avail_width, avail_height) {
            ListingSplit::Split { head, continuation } => {
                Some((Box::new(head), Box::new(continuation)))
            }
            ListingSplit::Deferred | ListingSplit::Unchanged => None,
        }
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        render::draw_listing(self, canvas, x, y, avail_width);
    }

    fn debug_name(&self) -> &'static str {
        "Listing"
    }

    fn check_fits(&self, avail_width: Pt, frame_height: Pt) -> Result<(), FlowlistError> {
        let columns = match self.resolved.get() {
            Some(columns) => columns.clone(),
            None => self.columns.adjusted(avail_width),
        };
        // Same rule `split_listing` applies on a fresh page: the row either
        // fits whole or its minimum must leave room to split.
        let room = frame_height - self.style.header_height - self.style.row_gap;
        for (index, row) in self.rows.iter().enumerate() {
            let metrics = row.measure(&columns, avail_width);
            let min_height = metrics.min_height(self.style.short_row_threshold);
            if metrics.height > room && min_height >= room {
                return Err(FlowlistError::UnplaceableRow {
                    index,
                    min_height,
                    page_height: frame_height,
                });
            }
        }
        Ok(())
    }
}
