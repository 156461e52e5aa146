use crate::canvas::Canvas;
use crate::error::FlowlistError;
use crate::types::{Color, Pt, Size};
use std::sync::{Arc, Mutex};

pub(crate) fn huge_pt() -> Pt {
    // Large but safe sentinel for "unbounded" layout measurements.
    Pt::from_f32(1.0e9)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakBefore {
    Auto,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakAfter {
    Auto,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakInside {
    Auto,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub break_before: BreakBefore,
    pub break_after: BreakAfter,
    pub break_inside: BreakInside,
    /// Minimum number of lines that must stay at the bottom of a page.
    pub orphans: usize,
    /// Minimum number of lines that must start the next page.
    pub widows: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            break_before: BreakBefore::Auto,
            break_after: BreakAfter::Auto,
            break_inside: BreakInside::Auto,
            orphans: 2,
            widows: 2,
        }
    }
}

impl Pagination {
    pub fn with_lines(orphans: usize, widows: usize) -> Self {
        Self {
            orphans,
            widows,
            ..Self::default()
        }
    }

    fn resolved_orphans(&self) -> usize {
        self.orphans.max(1)
    }

    fn resolved_widows(&self) -> usize {
        self.widows.max(1)
    }
}

/// A unit of content the pagination driver can measure, split and draw.
///
/// `wrap` must be a pure function of the inputs (implementations may memoize
/// it). `split` returns `None` when the flowable cannot be divided at
/// `avail_height`; the caller then treats it as one atomic block.
pub trait Flowable: Send + Sync {
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size;
    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)>;
    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, avail_height: Pt);

    fn pagination(&self) -> Pagination {
        Pagination::default()
    }

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Plain-text rendition used for diagnostics and content assertions.
    fn text_content(&self) -> Option<String> {
        None
    }

    /// Pre-flight check against the largest frame a document offers. Flowables
    /// that know up front they can never be placed report it here instead of
    /// failing half way through pagination.
    fn check_fits(&self, _avail_width: Pt, _frame_height: Pt) -> Result<(), FlowlistError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font_size: Pt,
    pub line_height: Pt,
    pub color: Color,
    pub font_name: Arc<str>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::sized(Pt::from_f32(12.0))
    }
}

impl TextStyle {
    pub fn sized(font_size: Pt) -> Self {
        Self {
            font_size,
            line_height: font_size.mul_ratio(6, 5),
            color: Color::BLACK,
            font_name: Arc::<str>::from("Helvetica"),
        }
    }

    pub fn with_line_height(mut self, line_height: Pt) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_font(mut self, name: impl Into<Arc<str>>) -> Self {
        self.font_name = name.into();
        self
    }

    /// Fixed advance per character; glyph-accurate metrics are not modelled.
    pub(crate) fn char_width(&self) -> Pt {
        (self.font_size * 0.6).max(Pt::from_f32(1.0))
    }

    pub(crate) fn text_width(&self, text: &str) -> Pt {
        self.char_width() * (text.chars().count() as i32)
    }
}

#[derive(Debug, Clone)]
struct LineLayout {
    text: String,
    width: Pt,
}

#[derive(Debug, Default)]
struct TextLayoutCache {
    entries: Vec<(i64, Arc<Vec<LineLayout>>)>,
}

impl TextLayoutCache {
    fn get(&self, key: i64) -> Option<Arc<Vec<LineLayout>>> {
        self.entries
            .iter()
            .find_map(|(k, v)| if *k == key { Some(v.clone()) } else { None })
    }

    fn insert(&mut self, key: i64, value: Arc<Vec<LineLayout>>) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        }
        self.entries.push((key, value));
        const MAX_ENTRIES: usize = 4;
        if self.entries.len() > MAX_ENTRIES {
            self.entries.remove(0);
        }
    }
}

/// Word-wrapped text block. Splits between lines, honouring orphans/widows.
#[derive(Debug, Clone)]
pub struct Paragraph {
    text: String,
    style: TextStyle,
    align: TextAlign,
    pagination: Pagination,
    layout_cache: Arc<Mutex<TextLayoutCache>>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            align: TextAlign::Left,
            pagination: Pagination::default(),
            layout_cache: Arc::new(Mutex::new(TextLayoutCache::default())),
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    fn layout_lines(&self, avail_width: Pt) -> Arc<Vec<LineLayout>> {
        let max_width = avail_width.max(Pt::from_f32(1.0));
        let key = max_width.to_milli_i64();
        if let Ok(cache) = self.layout_cache.lock() {
            if let Some(lines) = cache.get(key) {
                return lines;
            }
        }

        let mut lines = Vec::new();
        for source_line in self.text.split('\n') {
            let mut current = String::new();
            for word in source_line.split_whitespace() {
                let pieces = if self.style.text_width(word) > max_width {
                    split_long_word(&self.style, word, max_width)
                } else {
                    vec![word.to_string()]
                };
                for piece in pieces {
                    let candidate = if current.is_empty() {
                        piece.clone()
                    } else {
                        format!("{current} {piece}")
                    };
                    if current.is_empty() || self.style.text_width(&candidate) <= max_width {
                        current = candidate;
                    } else {
                        let width = self.style.text_width(&current);
                        lines.push(LineLayout {
                            text: std::mem::replace(&mut current, piece),
                            width,
                        });
                    }
                }
            }
            let width = self.style.text_width(&current);
            lines.push(LineLayout {
                text: current,
                width,
            });
        }

        let lines = Arc::new(lines);
        if let Ok(mut cache) = self.layout_cache.lock() {
            cache.insert(key, lines.clone());
        }
        lines
    }

    fn with_lines(&self, lines: &[LineLayout], pagination: Pagination) -> Paragraph {
        Paragraph {
            text: lines
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            style: self.style.clone(),
            align: self.align,
            pagination,
            layout_cache: Arc::new(Mutex::new(TextLayoutCache::default())),
        }
    }
}

fn split_long_word(style: &TextStyle, word: &str, max_width: Pt) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if style.text_width(&current) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

impl Flowable for Paragraph {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let lines = self.layout_lines(avail_width);
        let height = self.style.line_height * (lines.len() as i32);
        let width = lines
            .iter()
            .fold(Pt::ZERO, |acc, line| acc.max(line.width))
            .min(avail_width);
        Size { width, height }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let lines = self.layout_lines(avail_width);
        let lh = self.style.line_height.to_milli_i64();
        let ah = avail_height.to_milli_i64();
        if lh <= 0 || ah <= 0 {
            return None;
        }
        let total_lines = lines.len();
        let max_lines = (ah / lh) as usize;
        if max_lines == 0 || max_lines >= total_lines {
            return None;
        }

        let orphans = self.pagination.resolved_orphans();
        let widows = self.pagination.resolved_widows();
        let mut split_at = max_lines;
        if total_lines - split_at < widows {
            split_at = total_lines.saturating_sub(widows);
        }
        if split_at < orphans || split_at == 0 {
            return None;
        }

        let first = self.with_lines(
            &lines[..split_at],
            Pagination {
                break_after: BreakAfter::Auto,
                ..self.pagination
            },
        );
        let second = self.with_lines(
            &lines[split_at..],
            Pagination {
                break_before: BreakBefore::Auto,
                ..self.pagination
            },
        );
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let lines = self.layout_lines(avail_width);
        canvas.set_fill_color(self.style.color);
        canvas.set_font_name(&self.style.font_name);
        canvas.set_font_size(self.style.font_size);

        let mut cursor_y = y;
        for line in lines.iter() {
            let offset = match self.align {
                TextAlign::Left => Pt::ZERO,
                TextAlign::Center => (avail_width - line.width).max(Pt::ZERO).mul_ratio(1, 2),
                TextAlign::Right => (avail_width - line.width).max(Pt::ZERO),
            };
            if !line.text.is_empty() {
                canvas.draw_string(x + offset, cursor_y, line.text.clone());
            }
            cursor_y += self.style.line_height;
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn debug_name(&self) -> &'static str {
        "Paragraph"
    }

    fn text_content(&self) -> Option<String> {
        Some(self.text.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Spacer {
    height: Pt,
    pagination: Pagination,
}

impl Spacer {
    pub fn new(height: f32) -> Self {
        Self::new_pt(Pt::from_f32(height))
    }

    pub fn new_pt(height: Pt) -> Self {
        Self {
            height,
            pagination: Pagination::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }
}

impl Flowable for Spacer {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height.max(Pt::ZERO),
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt, _avail_height: Pt) {}

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn debug_name(&self) -> &'static str {
        "Spacer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;

    fn lined(text: &str, line_height: i32) -> Paragraph {
        Paragraph::new(text)
            .with_style(TextStyle::sized(Pt::from_i32(10)).with_line_height(Pt::from_i32(line_height)))
            .with_pagination(Pagination::with_lines(1, 1))
    }

    #[test]
    fn paragraph_wraps_words_greedily() {
        // 6pt per char at 10pt: 60pt fits ten characters.
        let para = lined("alpha beta gamma delta", 12);
        let size = para.wrap(Pt::from_i32(60), huge_pt());
        assert_eq!(size.height, Pt::from_i32(36));
        let lines = para.layout_lines(Pt::from_i32(60));
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn explicit_newlines_are_kept() {
        let para = lined("one\ntwo\nthree", 20);
        assert_eq!(para.wrap(Pt::from_i32(500), huge_pt()).height, Pt::from_i32(60));
    }

    #[test]
    fn long_words_are_broken_by_width() {
        let para = lined("abcdefghijklmnop", 12);
        let lines = para.layout_lines(Pt::from_i32(30));
        assert!(lines.iter().all(|line| line.width <= Pt::from_i32(30)));
        let joined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(joined, "abcdefghijklmnop");
    }

    #[test]
    fn split_keeps_every_line_once() {
        let para = lined("l1\nl2\nl3\nl4\nl5", 20);
        let (first, second) = para
            .split(Pt::from_i32(200), Pt::from_i32(45))
            .expect("paragraph should split");
        assert_eq!(first.text_content().as_deref(), Some("l1\nl2"));
        assert_eq!(second.text_content().as_deref(), Some("l3\nl4\nl5"));
        assert_eq!(first.wrap(Pt::from_i32(200), huge_pt()).height, Pt::from_i32(40));
    }

    #[test]
    fn split_honours_widows_and_orphans() {
        let para = lined("l1\nl2\nl3\nl4", 10).with_pagination(Pagination::with_lines(2, 2));
        // Three lines fit, but that would strand a single widow.
        let (first, second) = para
            .split(Pt::from_i32(200), Pt::from_i32(30))
            .expect("paragraph should split");
        assert_eq!(first.text_content().as_deref(), Some("l1\nl2"));
        assert_eq!(second.text_content().as_deref(), Some("l3\nl4"));
        // One line would be an orphan.
        assert!(para.split(Pt::from_i32(200), Pt::from_i32(15)).is_none());
    }

    #[test]
    fn split_refuses_when_everything_fits() {
        let para = lined("l1\nl2", 10);
        assert!(para.split(Pt::from_i32(200), Pt::from_i32(50)).is_none());
        assert!(para.split(Pt::from_i32(200), Pt::ZERO).is_none());
    }

    #[test]
    fn right_aligned_lines_hug_the_edge() {
        let para = lined("abc", 12).with_align(TextAlign::Right);
        let mut canvas = Canvas::new(Size::letter());
        para.draw(&mut canvas, Pt::ZERO, Pt::ZERO, Pt::from_i32(100), huge_pt());
        let x = canvas.current_commands().iter().find_map(|cmd| match cmd {
            Command::DrawString { x, .. } => Some(*x),
            _ => None,
        });
        assert_eq!(x, Some(Pt::from_i32(82)));
    }

    #[test]
    fn spacer_is_atomic() {
        let spacer = Spacer::new(10.0);
        assert_eq!(spacer.wrap(Pt::from_i32(100), Pt::ZERO).height, Pt::from_i32(10));
        assert!(spacer.split(Pt::from_i32(100), Pt::from_i32(5)).is_none());
    }
}
