use crate::error::FlowlistError;
use crate::types::{Color, Pt};
use std::sync::Arc;

/// Presentation constants of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingStyle {
    /// Vertical space reserved for the column header on every fragment.
    pub header_height: Pt,
    /// Space below each row; its divider is drawn inside it.
    pub row_gap: Pt,
    pub column_gap: Pt,
    pub font_size: Pt,
    pub header_font: Arc<str>,
    /// Rows whose trimmable part (`height - min_needed_height`) is shorter
    /// than this are kept together instead of being split.
    pub short_row_threshold: Pt,
    pub divider_color: Color,
    /// Dash pattern of the divider under a row that continues on the next page.
    pub split_dash: Vec<Pt>,
}

impl Default for ListingStyle {
    fn default() -> Self {
        let row_gap = Pt::from_i32(5);
        Self {
            header_height: row_gap * 2 + Pt::from_i32(12),
            row_gap,
            column_gap: Pt::from_i32(10),
            font_size: Pt::from_i32(10),
            header_font: Arc::<str>::from("Helvetica-Bold"),
            short_row_threshold: Pt::from_i32(144),
            divider_color: Color::from_hex(0xE0E0E0),
            split_dash: vec![Pt::from_i32(1), Pt::from_i32(8)],
        }
    }
}

impl ListingStyle {
    pub fn with_header_height(mut self, height: f32) -> Self {
        self.header_height = Pt::from_f32(height);
        self
    }

    pub fn with_row_gap(mut self, gap: f32) -> Self {
        self.row_gap = Pt::from_f32(gap);
        self
    }

    pub fn with_column_gap(mut self, gap: f32) -> Self {
        self.column_gap = Pt::from_f32(gap);
        self
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Pt::from_f32(size);
        self
    }

    pub fn with_short_row_threshold(mut self, threshold: f32) -> Self {
        self.short_row_threshold = Pt::from_f32(threshold);
        self
    }

    pub fn validate(&self) -> Result<(), FlowlistError> {
        let lengths = [
            ("header_height", self.header_height),
            ("row_gap", self.row_gap),
            ("column_gap", self.column_gap),
            ("short_row_threshold", self.short_row_threshold),
        ];
        for (name, value) in lengths {
            if value.is_negative() {
                return Err(FlowlistError::InvalidConfiguration(format!(
                    "listing {name} must not be negative (got {value})"
                )));
            }
        }
        if self.font_size <= Pt::ZERO {
            return Err(FlowlistError::InvalidConfiguration(format!(
                "listing font_size must be positive (got {})",
                self.font_size
            )));
        }
        if self.split_dash.iter().any(|dash| dash.is_negative()) {
            return Err(FlowlistError::InvalidConfiguration(
                "listing split_dash entries must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
