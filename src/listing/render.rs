//! Drawing of a measured listing fragment.
//!
//! Layout decisions are already taken by the time a fragment reaches this
//! module: rows are drawn top to bottom exactly as split, with the header
//! repeated on every fragment.

use crate::canvas::Canvas;
use crate::flowable::{TextStyle, huge_pt};
use crate::listing::column::{ColumnAlign, ColumnSchema};
use crate::listing::entry::ListEntry;
use crate::listing::table::Listing;
use crate::types::Pt;

/// Header rules sit this far inside the header's top and bottom edges.
const HEADER_RULE_INSET: i32 = 2;
/// Baseline of the header labels, measured from the header top.
const HEADER_LABEL_OFFSET: i32 = 15;
/// Row dividers sit this far above the top of the following row.
const DIVIDER_LIFT: i32 = 2;

pub fn draw_listing(listing: &Listing, canvas: &mut Canvas, x: Pt, y: Pt, width: Pt) {
    let columns = listing.resolve_columns(width);
    draw_header(listing, columns, canvas, x, y, width);

    let style = listing.style();
    let offsets = columns.offsets();
    let mut cursor = y + style.header_height;
    for row in listing.rows() {
        let metrics = row.measure(columns, width);
        draw_row(row, columns, &offsets, canvas, x, cursor);
        cursor += metrics.height + style.row_gap;
        draw_divider(listing, row, canvas, x, width, cursor - Pt::from_i32(DIVIDER_LIFT));
    }
}

pub fn draw_header(
    listing: &Listing,
    columns: &ColumnSchema,
    canvas: &mut Canvas,
    x: Pt,
    y: Pt,
    width: Pt,
) {
    let style = listing.style();
    let inset = Pt::from_i32(HEADER_RULE_INSET);
    canvas.save_state();
    canvas.set_stroke_color(style.divider_color);
    canvas.hline(x, x + width, y + inset);
    canvas.hline(x, x + width, y + style.header_height - inset);

    let text = TextStyle::sized(style.font_size).with_font(style.header_font.clone());
    canvas.set_fill_color(text.color);
    canvas.set_font_name(&text.font_name);
    canvas.set_font_size(text.font_size);
    let baseline = y + Pt::from_i32(HEADER_LABEL_OFFSET);
    for (column, offset) in columns.iter().zip(columns.offsets()) {
        let slack = (column.width() - text.text_width(column.name())).max(Pt::ZERO);
        let shift = match column.align() {
            ColumnAlign::Left => Pt::ZERO,
            ColumnAlign::Center => slack.mul_ratio(1, 2),
            ColumnAlign::Right => slack,
        };
        canvas.draw_string(x + offset + shift, baseline, column.name());
    }
    canvas.restore_state();
}

fn draw_row(
    row: &ListEntry,
    columns: &ColumnSchema,
    offsets: &[Pt],
    canvas: &mut Canvas,
    x: Pt,
    top: Pt,
) {
    if let Some(callback) = row.on_draw() {
        callback(canvas);
    }
    if let Some(key) = row.page_bookmark() {
        canvas.bookmark_page(key);
    }
    if let Some(key) = row.bookmark() {
        canvas.bookmark(key, top);
    }

    for ((column, offset), cell) in columns.iter().zip(offsets).zip(row.cells()) {
        let mut block_top = top;
        for block in cell.blocks() {
            let height = block.wrap(column.width(), huge_pt()).height;
            block.draw(canvas, x + *offset, block_top, column.width(), height);
            block_top += height;
        }
    }
}

fn draw_divider(listing: &Listing, row: &ListEntry, canvas: &mut Canvas, x: Pt, width: Pt, y: Pt) {
    let style = listing.style();
    canvas.save_state();
    canvas.set_stroke_color(style.divider_color);
    if row.was_split() {
        canvas.set_dash(style.split_dash.clone(), Pt::ZERO);
    }
    canvas.hline(x, x + width, y);
    canvas.restore_state();
}
