use crate::canvas::Canvas;
use crate::error::FlowlistError;
use crate::flowable::{BreakInside, Flowable, Pagination, TextStyle};
use crate::types::{Color, Pt, Size};
use std::sync::Arc;

/// Titled band that opens a section of a report.
///
/// When less than `min_space` is left on the page the heading reports
/// `min_space` as its height, so the driver moves it (and whatever follows
/// it) to a fresh page instead of stranding the title at the bottom.
#[derive(Debug, Clone)]
pub struct SectionHeading {
    title: String,
    bookmark: Option<String>,
    min_space: Pt,
    height: Pt,
    background: Color,
    text: TextStyle,
}

impl SectionHeading {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bookmark: None,
            min_space: Pt::from_f32(1.5 * 72.0),
            height: Pt::from_i32(18),
            background: Color::from_hex(0xF0F0F0),
            text: TextStyle::sized(Pt::from_i32(12)).with_font(Arc::<str>::from("Helvetica-Bold")),
        }
    }

    pub fn with_bookmark(mut self, key: impl Into<String>) -> Self {
        self.bookmark = Some(key.into());
        self
    }

    pub fn with_min_space(mut self, min_space: f32) -> Self {
        self.min_space = Pt::from_f32(min_space).max(Pt::ZERO);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Flowable for SectionHeading {
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size {
        let height = if avail_height < self.min_space {
            self.min_space
        } else {
            self.height
        };
        Size {
            width: avail_width,
            height,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        canvas.save_state();
        canvas.set_fill_color(self.background);
        canvas.set_stroke_color(self.background);
        canvas.draw_rect(x, y, avail_width, self.height);
        canvas.fill();
        canvas.set_fill_color(self.text.color);
        canvas.set_font_name(&self.text.font_name);
        canvas.set_font_size(self.text.font_size);
        canvas.draw_string(
            x + Pt::from_i32(6),
            y + self.height - Pt::from_i32(4),
            self.title.clone(),
        );
        canvas.restore_state();
        if let Some(key) = &self.bookmark {
            canvas.bookmark(key.clone(), y);
        }
    }

    fn pagination(&self) -> Pagination {
        Pagination {
            break_inside: BreakInside::Avoid,
            ..Pagination::default()
        }
    }

    fn debug_name(&self) -> &'static str {
        "SectionHeading"
    }

    fn text_content(&self) -> Option<String> {
        Some(self.title.clone())
    }

    fn check_fits(&self, _avail_width: Pt, frame_height: Pt) -> Result<(), FlowlistError> {
        if self.min_space.max(self.height) > frame_height {
            return Err(FlowlistError::UnplaceableFlowable(format!(
                "SectionHeading \"{}\" demands {} but frames are only {} tall",
                self.title, self.min_space, frame_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;

    #[test]
    fn claims_minimum_space_near_the_page_bottom() {
        let heading = SectionHeading::new("Audit trail");
        let roomy = heading.wrap(Pt::from_i32(400), Pt::from_i32(300));
        assert_eq!(roomy.height, Pt::from_i32(18));
        let cramped = heading.wrap(Pt::from_i32(400), Pt::from_i32(100));
        assert_eq!(cramped.height, Pt::from_i32(108));
    }

    #[test]
    fn draws_band_title_and_bookmark() {
        let heading = SectionHeading::new("Audit trail").with_bookmark("audit");
        let mut canvas = Canvas::new(Size::letter());
        heading.draw(&mut canvas, Pt::from_i32(36), Pt::from_i32(100), Pt::from_i32(200), Pt::from_i32(500));
        let commands = canvas.current_commands();
        assert!(commands.contains(&Command::SetFillColor(Color::from_hex(0xF0F0F0))));
        assert!(commands.contains(&Command::DrawString {
            x: Pt::from_i32(42),
            y: Pt::from_i32(114),
            text: "Audit trail".to_string(),
        }));
        assert_eq!(
            commands.last(),
            Some(&Command::Bookmark {
                key: "audit".to_string(),
                y: Pt::from_i32(100)
            })
        );
    }

    #[test]
    fn rejects_frames_shorter_than_its_minimum() {
        let heading = SectionHeading::new("Audit trail");
        assert!(heading.check_fits(Pt::from_i32(400), Pt::from_i32(72)).is_err());
        assert!(heading.check_fits(Pt::from_i32(400), Pt::from_i32(720)).is_ok());
    }
}
