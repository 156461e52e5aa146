use crate::types::{Color, Pt, Rect, Size};

/// Drawing operations recorded by [`Canvas`]. Coordinates are page-relative
/// with the origin at the top-left corner and `y` growing downwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    // Non-rendered metadata used for page-aware reporting.
    Meta {
        key: String,
        value: String,
    },
    SetFillColor(Color),
    SetStrokeColor(Color),
    // An empty pattern restores a solid line.
    SetDash {
        pattern: Vec<Pt>,
        phase: Pt,
    },
    SetFontName(String),
    SetFontSize(Pt),
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    Fill,
    Stroke,
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    // Named destination anchored at a vertical position on the page.
    Bookmark {
        key: String,
        y: Pt,
    },
    // Named destination for the page as a whole.
    BookmarkPage {
        key: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    /// Text of every `DrawString` on the page, in drawing order.
    pub fn strings(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.strings().iter().any(|text| text.contains(needle))
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    font_size: Pt,
    font_name: String,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            font_size: Pt::from_f32(12.0),
            font_name: "Helvetica".to_string(),
        }
    }
}

pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state_stack: Vec<GraphicsState>,
    current_state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::default(),
            state_stack: Vec::new(),
            current_state: GraphicsState::default(),
        }
    }

    pub fn save_state(&mut self) {
        self.state_stack.push(self.current_state.clone());
        self.current.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
            self.current.commands.push(Command::RestoreState);
        }
    }

    pub fn record_flowable_bounds(&mut self, rect: Rect) {
        let value = format!(
            "{},{},{},{}",
            rect.x.to_milli_i64(),
            rect.y.to_milli_i64(),
            rect.width.to_milli_i64(),
            rect.height.to_milli_i64()
        );
        self.meta(crate::META_FLOWABLE_BOUNDS_KEY, value);
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.current.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.current_state.fill_color == color {
            return;
        }
        self.current_state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.current_state.stroke_color == color {
            return;
        }
        self.current_state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_dash(&mut self, pattern: Vec<Pt>, phase: Pt) {
        self.current
            .commands
            .push(Command::SetDash { pattern, phase });
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.current_state.font_name == name {
            return;
        }
        self.current_state.font_name = name.to_string();
        self.current
            .commands
            .push(Command::SetFontName(self.current_state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.current_state.font_size == size {
            return;
        }
        self.current_state.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn fill(&mut self) {
        self.current.commands.push(Command::Fill);
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    /// Strokes a single horizontal rule from `x0` to `x1` at `y`.
    pub fn hline(&mut self, x0: Pt, x1: Pt, y: Pt) {
        self.move_to(x0, y);
        self.line_to(x1, y);
        self.stroke();
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn bookmark(&mut self, key: impl Into<String>, y: Pt) {
        self.current
            .commands
            .push(Command::Bookmark { key: key.into(), y });
    }

    pub fn bookmark_page(&mut self, key: impl Into<String>) {
        self.current
            .commands
            .push(Command::BookmarkPage { key: key.into() });
    }

    pub fn show_page(&mut self) {
        let current = std::mem::take(&mut self.current);
        self.pages.push(current);
        self.state_stack.clear();
        self.current_state = GraphicsState::default();
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    /// Commands recorded on the page that has not been shown yet.
    pub fn current_commands(&self) -> &[Command] {
        &self.current.commands
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }

    pub fn finish_without_show(self) -> Document {
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_state_changes_are_elided() {
        let mut canvas = Canvas::new(Size::letter());
        canvas.set_stroke_color(Color::BLACK);
        canvas.set_font_size(Pt::from_i32(12));
        canvas.set_font_size(Pt::from_i32(10));
        canvas.set_font_size(Pt::from_i32(10));
        assert_eq!(
            canvas.current_commands(),
            &[Command::SetFontSize(Pt::from_i32(10))]
        );
    }

    #[test]
    fn restore_state_rewinds_tracked_state() {
        let mut canvas = Canvas::new(Size::letter());
        canvas.save_state();
        canvas.set_font_name("Helvetica-Bold");
        canvas.restore_state();
        canvas.set_font_name("Helvetica");
        assert_eq!(canvas.current_command_count(), 3);
    }

    #[test]
    fn finish_always_yields_a_page() {
        let doc = Canvas::new(Size::a4()).finish();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].commands.is_empty());
    }

    #[test]
    fn page_strings_are_in_draw_order() {
        let mut canvas = Canvas::new(Size::letter());
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "first");
        canvas.hline(Pt::ZERO, Pt::from_i32(10), Pt::ZERO);
        canvas.draw_string(Pt::ZERO, Pt::from_i32(12), "second");
        canvas.show_page();
        let doc = canvas.finish_without_show();
        assert_eq!(doc.pages[0].strings(), vec!["first", "second"]);
        assert!(doc.pages[0].contains_text("sec"));
    }
}
