//! Flowing tables: a fixed column schema and rows that may be split across
//! pages at long columns, repeating the other columns on every fragment.

mod column;
mod entry;
pub mod render;
mod style;
mod table;

pub use column::{Column, ColumnAlign, ColumnSchema};
pub use entry::{CellContent, EntryCallback, EntryMetrics, EntrySplit, ListEntry};
pub use style::ListingStyle;
pub use table::{Listing, ListingSplit};
