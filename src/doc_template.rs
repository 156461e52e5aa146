use crate::canvas::{Canvas, Document};
use crate::debug::{DebugLogger, PageBreak};
use crate::doc_context::DocContext;
use crate::error::FlowlistError;
use crate::flowable::{BreakAfter, BreakBefore, Flowable};
use crate::frame::{AddResult, Frame};
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::page_template::PageTemplate;
use crate::types::Rect;
use log::debug;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Pagination driver: pours a story of flowables into the frames of
/// successive pages, splitting flowables at frame bottoms.
pub struct DocTemplate {
    page_templates: Vec<PageTemplate>,
    story: Vec<Box<dyn Flowable>>,
    debug: Option<Arc<DebugLogger>>,
    debug_doc_id: Option<usize>,
}

impl DocTemplate {
    pub fn new(page_templates: Vec<PageTemplate>) -> Self {
        Self {
            page_templates,
            story: Vec::new(),
            debug: None,
            debug_doc_id: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: Arc<DebugLogger>, doc_id: Option<usize>) -> Self {
        self.debug = Some(debug);
        self.debug_doc_id = doc_id;
        self
    }

    pub fn add_flowable(&mut self, flowable: Box<dyn Flowable>) {
        self.story.push(flowable);
    }

    pub fn build(self) -> Result<Document, FlowlistError> {
        Ok(self.build_with_metrics()?.0)
    }

    pub fn build_with_metrics(self) -> Result<(Document, DocumentMetrics), FlowlistError> {
        let largest = largest_frame(&self.page_templates)?;
        for flowable in &self.story {
            flowable.check_fits(largest.width, largest.height)?;
        }

        let mut pager = Pager::new(&self.page_templates, self.debug.clone(), self.debug_doc_id);
        let mut story: VecDeque<Box<dyn Flowable>> = self.story.into();

        while let Some(flowable) = story.pop_front() {
            let mut current = flowable;
            let mut suppress_break_before = false;
            loop {
                let current_name = current.debug_name();
                let pagination = current.pagination();
                if !suppress_break_before
                    && matches!(pagination.break_before, BreakBefore::Page)
                    && (pager.placed_on_page || pager.frame_index > 0)
                {
                    pager.next_page("break_before_page", Some(current_name));
                }

                if pager.frame_index >= pager.frames.len() {
                    pager.next_page("frame_exhausted", Some(current_name));
                }
                if pager.frames.is_empty() {
                    return Err(FlowlistError::MissingPageTemplate);
                }

                let is_last_frame = pager.frame_index + 1 >= pager.frames.len();
                let frame_rect = pager.frames[pager.frame_index].rect();
                let fresh = !pager.placed_on_page && is_last_frame;
                let details = fresh.then(|| unplaceable_details(current.as_ref(), frame_rect));

                let frame_index = pager.frame_index;
                match pager.frames[frame_index].add(current, &mut pager.canvas) {
                    AddResult::Placed => {
                        pager.placed_on_page = true;
                        pager.page_flowables += 1;
                        if matches!(pagination.break_after, BreakAfter::Page) {
                            pager.next_page("break_after_page", Some(current_name));
                        }
                        break;
                    }
                    AddResult::Split(remaining) => {
                        pager.placed_on_page = true;
                        pager.page_flowables += 1;
                        pager.page_splits += 1;
                        pager.log_break("flowable_split", is_last_frame, Some(current_name));
                        suppress_break_before = true;
                        current = remaining;
                        pager.frame_index += 1;
                    }
                    AddResult::Overflow(remaining) => {
                        if let Some(details) = details {
                            return Err(FlowlistError::UnplaceableFlowable(details));
                        }
                        pager.log_break("frame_overflow", is_last_frame, Some(current_name));
                        current = remaining;
                        pager.frame_index += 1;
                    }
                }
            }
        }

        Ok(pager.finish())
    }
}

/// Tallest frame any template offers; a flowable that cannot fit there cannot
/// fit anywhere.
fn largest_frame(page_templates: &[PageTemplate]) -> Result<Rect, FlowlistError> {
    if page_templates.iter().any(|t| t.frames().is_empty()) {
        return Err(FlowlistError::MissingPageTemplate);
    }
    page_templates
        .iter()
        .flat_map(|template| template.frames().iter().map(|spec| spec.rect))
        .reduce(|best, rect| if rect.height > best.height { rect } else { best })
        .ok_or(FlowlistError::MissingPageTemplate)
}

fn unplaceable_details(flowable: &dyn Flowable, frame: Rect) -> String {
    let size = flowable.wrap(frame.width, frame.height);
    let pagination = flowable.pagination();
    format!(
        "{} size={}x{}pt frame={}x{}pt break_inside={:?} break_before={:?} break_after={:?}",
        flowable.debug_name(),
        size.width.to_f32(),
        size.height.to_f32(),
        frame.width.to_f32(),
        frame.height.to_f32(),
        pagination.break_inside,
        pagination.break_before,
        pagination.break_after,
    )
}

/// Page selection rule: page `n` uses `templates[min(n - 1, len - 1)]`, so the
/// last template repeats.
fn select_template(page_templates: &[PageTemplate], page_number: usize) -> &PageTemplate {
    let idx = page_number
        .saturating_sub(1)
        .min(page_templates.len().saturating_sub(1));
    &page_templates[idx]
}

struct Pager<'a> {
    templates: &'a [PageTemplate],
    canvas: Canvas,
    page_number: usize,
    frames: Vec<Frame>,
    frame_index: usize,
    placed_on_page: bool,
    page_flowables: usize,
    page_splits: usize,
    page_start: Instant,
    metrics: DocumentMetrics,
    debug: Option<Arc<DebugLogger>>,
    debug_doc_id: Option<usize>,
}

impl<'a> Pager<'a> {
    // Callers guarantee `templates` is non-empty.
    fn new(
        templates: &'a [PageTemplate],
        debug: Option<Arc<DebugLogger>>,
        debug_doc_id: Option<usize>,
    ) -> Self {
        let first = select_template(templates, 1);
        let mut pager = Self {
            templates,
            canvas: Canvas::new(first.page_size),
            page_number: 1,
            frames: Vec::new(),
            frame_index: 0,
            placed_on_page: false,
            page_flowables: 0,
            page_splits: 0,
            page_start: Instant::now(),
            metrics: DocumentMetrics::default(),
            debug,
            debug_doc_id,
        };
        pager.begin_page();
        pager
    }

    fn begin_page(&mut self) {
        let template = select_template(self.templates, self.page_number);
        self.frames = template.instantiate_frames();
        self.frame_index = 0;
        self.placed_on_page = false;
        if let Some(callback) = template.on_page() {
            callback(
                &mut self.canvas,
                &DocContext::new(self.page_number, &template.name),
            );
        }
        self.canvas
            .meta(crate::META_PAGE_TEMPLATE_KEY, template.name.clone());
    }

    fn log_break(&self, reason: &str, leaves_page: bool, flowable: Option<&str>) {
        let to_page = self.page_number + usize::from(leaves_page);
        debug!(
            "page break ({reason}) {} -> {to_page} at frame {} [{}]",
            self.page_number,
            self.frame_index,
            flowable.unwrap_or("-")
        );
        if let Some(logger) = self.debug.as_deref() {
            logger.page_break(PageBreak {
                doc_id: self.debug_doc_id,
                reason,
                from_page: self.page_number,
                to_page,
                frame_index: self.frame_index,
                flowable,
            });
        }
    }

    fn next_page(&mut self, reason: &str, flowable: Option<&str>) {
        self.log_break(reason, true, flowable);
        self.finish_page();
        self.page_number += 1;
        self.begin_page();
    }

    fn finish_page(&mut self) {
        let elapsed = self.page_start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.total_render_ms += elapsed;
        self.metrics.total_splits += self.page_splits;
        self.metrics.pages.push(PageMetrics {
            page_number: self.page_number,
            render_ms: elapsed,
            command_count: self.canvas.current_command_count(),
            flowable_count: self.page_flowables,
            split_count: self.page_splits,
        });
        self.canvas.show_page();
        self.page_flowables = 0;
        self.page_splits = 0;
        self.page_start = Instant::now();
    }

    fn finish(mut self) -> (Document, DocumentMetrics) {
        self.finish_page();
        if let Some(logger) = self.debug.as_deref() {
            logger.increment("layout.pages", self.metrics.pages.len() as u64);
        }
        (self.canvas.finish_without_show(), self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowable::{Pagination, Paragraph, Spacer};
    use crate::types::{Margins, Pt, Size};

    fn template(height: f32) -> PageTemplate {
        PageTemplate::single_frame("body", Size::from_inches(4.0, height), Margins::all(36.0))
    }

    #[test]
    fn missing_templates_are_rejected() {
        let doc = DocTemplate::new(Vec::new());
        assert!(matches!(doc.build(), Err(FlowlistError::MissingPageTemplate)));
        let doc = DocTemplate::new(vec![PageTemplate::new("empty", Size::letter())]);
        assert!(matches!(doc.build(), Err(FlowlistError::MissingPageTemplate)));
    }

    #[test]
    fn overflow_moves_to_the_next_page() {
        // 3in page with half-inch margins leaves a 144pt frame.
        let mut doc = DocTemplate::new(vec![template(3.0)]);
        doc.add_flowable(Box::new(Spacer::new(100.0)));
        doc.add_flowable(Box::new(Spacer::new(100.0)));
        let (document, metrics) = doc.build_with_metrics().expect("layout");
        assert_eq!(document.pages.len(), 2);
        assert_eq!(metrics.pages[1].flowable_count, 1);
    }

    #[test]
    fn oversized_atomic_flowable_is_an_error() {
        let mut doc = DocTemplate::new(vec![template(3.0)]);
        doc.add_flowable(Box::new(Spacer::new(500.0)));
        match doc.build() {
            Err(FlowlistError::UnplaceableFlowable(details)) => {
                assert!(details.starts_with("Spacer"));
            }
            other => panic!("expected an unplaceable flowable, got {other:?}"),
        }
    }

    #[test]
    fn break_before_starts_a_new_page() {
        let mut doc = DocTemplate::new(vec![template(6.0)]);
        doc.add_flowable(Box::new(Paragraph::new("first")));
        doc.add_flowable(Box::new(Paragraph::new("second").with_pagination(Pagination {
            break_before: BreakBefore::Page,
            ..Pagination::default()
        })));
        let document = doc.build().expect("layout");
        assert_eq!(document.pages.len(), 2);
        assert!(document.pages[1].contains_text("second"));
    }

    #[test]
    fn page_callbacks_see_the_page_number() {
        let template = template(3.0).set_on_page(|canvas, ctx| {
            canvas.draw_string(Pt::ZERO, Pt::ZERO, format!("page {}", ctx.page_number));
        });
        let mut doc = DocTemplate::new(vec![template]);
        doc.add_flowable(Box::new(Spacer::new(100.0)));
        doc.add_flowable(Box::new(Spacer::new(100.0)));
        let document = doc.build().expect("layout");
        assert!(document.pages[0].contains_text("page 1"));
        assert!(document.pages[1].contains_text("page 2"));
    }

    #[test]
    fn splits_are_counted_per_page() {
        let text = (0..30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut doc = DocTemplate::new(vec![template(3.0)]);
        doc.add_flowable(Box::new(Paragraph::new(text)));
        let (document, metrics) = doc.build_with_metrics().expect("layout");
        assert!(document.pages.len() >= 3);
        assert_eq!(metrics.total_splits, document.pages.len() - 1);
    }
}
