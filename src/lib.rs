mod canvas;
mod debug;
mod doc_context;
mod doc_template;
mod error;
mod flowable;
mod frame;
pub mod listing;
mod metrics;
mod page_template;
mod section;
mod types;

pub use canvas::{Canvas, Command, Document, Page};
use debug::DebugLogger;
pub use doc_context::DocContext;
pub use doc_template::DocTemplate;
pub use error::FlowlistError;
pub use flowable::{
    BreakAfter, BreakBefore, BreakInside, Flowable, Pagination, Paragraph, Spacer, TextAlign,
    TextStyle,
};
pub use frame::{AddResult, Frame};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use page_template::{FrameSpec, OnPageCallback, PageTemplate};
pub use section::SectionHeading;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
pub use types::{Color, Margins, Pt, Rect, Size};

/// Meta key carrying the bounds of every placed flowable as
/// `x,y,width,height` in milli-points.
pub const META_FLOWABLE_BOUNDS_KEY: &str = "fl.flowable_bounds";
/// Meta key naming the page template a page was drawn from.
pub const META_PAGE_TEMPLATE_KEY: &str = "fl.page_template";

/// A story: the flowables of one document, in reading order.
pub type Story = Vec<Box<dyn Flowable>>;

/// Paginates stories onto pages built from one page geometry.
pub struct Engine {
    page_templates: Vec<PageTemplate>,
    debug: Option<Arc<DebugLogger>>,
}

#[derive(Clone)]
pub struct EngineBuilder {
    page_size: Size,
    margins: Margins,
    page_margins: BTreeMap<usize, Margins>,
    on_page: Option<OnPageCallback>,
    debug_path: Option<PathBuf>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn page_templates(&self) -> &[PageTemplate] {
        &self.page_templates
    }

    fn emit_debug_summary(&self, context: &str) {
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary(context);
            logger.flush();
        }
    }

    fn layout(
        &self,
        doc_id: Option<usize>,
        story: Story,
    ) -> Result<(Document, DocumentMetrics), FlowlistError> {
        let mut doc = DocTemplate::new(self.page_templates.clone());
        if let Some(logger) = self.debug.clone() {
            doc = doc.with_debug(logger, doc_id);
        }
        for flowable in story {
            doc.add_flowable(flowable);
        }
        doc.build_with_metrics()
    }

    pub fn render(&self, story: Story) -> Result<Document, FlowlistError> {
        let result = self.layout(None, story);
        self.emit_debug_summary("render");
        Ok(result?.0)
    }

    pub fn render_with_metrics(
        &self,
        story: Story,
    ) -> Result<(Document, DocumentMetrics), FlowlistError> {
        let result = self.layout(None, story);
        self.emit_debug_summary("render_with_metrics");
        result
    }

    /// Renders independent documents in parallel. Results keep the order of
    /// `stories`; the first failing document aborts the batch.
    pub fn render_batch(&self, stories: Vec<Story>) -> Result<Vec<Document>, FlowlistError> {
        use rayon::prelude::*;

        let mut results: Vec<(usize, Result<Document, FlowlistError>)> = stories
            .into_par_iter()
            .enumerate()
            .map(|(idx, story)| (idx, self.layout(Some(idx), story).map(|(doc, _)| doc)))
            .collect();
        results.sort_by_key(|(idx, _)| *idx);
        self.emit_debug_summary("render_batch");

        let mut documents = Vec::with_capacity(results.len());
        for (_, res) in results {
            documents.push(res?);
        }
        Ok(documents)
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            page_size: Size::letter(),
            margins: Margins::all(36.0),
            page_margins: BTreeMap::new(),
            on_page: None,
            debug_path: None,
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.margins = Margins::all(value);
        self
    }

    /// Overrides the margins of one page (1-based). Pages after the last
    /// override use the default margins.
    pub fn page_margins(mut self, page_number: usize, margins: Margins) -> Self {
        self.page_margins.insert(page_number.max(1), margins);
        self
    }

    pub fn on_page<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Canvas, &DocContext) + Send + Sync + 'static,
    {
        self.on_page = Some(Arc::new(callback));
        self
    }

    /// Writes JSON-lines pagination traces to `path`.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Engine, FlowlistError> {
        let mut page_templates =
            build_page_templates(self.page_size, self.margins, &self.page_margins)?;
        if let Some(callback) = &self.on_page {
            page_templates = page_templates
                .into_iter()
                .map(|template| {
                    let callback = callback.clone();
                    template.set_on_page(move |canvas, ctx| callback(canvas, ctx))
                })
                .collect();
        }
        let debug = match self.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };
        Ok(Engine {
            page_templates,
            debug,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn build_page_templates(
    page_size: Size,
    base_margins: Margins,
    page_margins: &BTreeMap<usize, Margins>,
) -> Result<Vec<PageTemplate>, FlowlistError> {
    let last_override = page_margins.keys().max().copied().unwrap_or(0);
    // One template per overridden page, then the base template repeats.
    let mut templates = Vec::with_capacity(last_override + 1);
    for page_number in 1..=last_override + 1 {
        let margins = page_margins
            .get(&page_number)
            .copied()
            .unwrap_or(base_margins);
        let frame = margins.content_rect(page_size);
        if frame.width <= Pt::ZERO || frame.height <= Pt::ZERO {
            return Err(FlowlistError::InvalidConfiguration(format!(
                "margins leave no room on page {page_number}: frame {}x{}",
                frame.width, frame.height
            )));
        }
        templates.push(PageTemplate::new(format!("Page{page_number}"), page_size).with_frame(frame));
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{CellContent, Column, ListEntry, Listing, ListingStyle};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn line(text: &str) -> Paragraph {
        Paragraph::new(text)
            .with_style(TextStyle::sized(Pt::from_i32(10)).with_line_height(Pt::from_i32(12)))
            .with_pagination(Pagination::with_lines(1, 1))
    }

    fn audit_listing(records: usize, ops_per_record: usize) -> Listing {
        let mut listing = Listing::new(vec![
            Column::new("Date").with_width(72.0),
            Column::new("User").with_width(60.0),
            Column::new("Field").with_width(90.0),
            Column::new("Operation").long().expandable(),
        ])
        .with_style(ListingStyle::default().with_short_row_threshold(36.0))
        .expect("valid style");
        for record in 0..records {
            let entry = ListEntry::new(vec![
                CellContent::block(line("2024-03-01")),
                CellContent::block(line(&format!("user{record}"))),
                CellContent::block(line("status")),
                CellContent::sequence(
                    (0..ops_per_record).map(|op| line(&format!("r{record} op{op}"))),
                ),
            ])
            .with_bookmark(format!("record-{record}"));
            listing.add_row(entry).expect("four cells");
        }
        listing
    }

    fn operations(document: &Document) -> Vec<String> {
        document
            .pages
            .iter()
            .flat_map(|page| page.strings())
            .filter(|text| text.contains(" op"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn listing_flows_across_pages_without_loss() {
        init_logging();
        let engine = Engine::builder()
            .page_size(Size::from_inches(6.0, 4.0))
            .build()
            .expect("engine");
        let story: Story = vec![
            Box::new(SectionHeading::new("Audit trail").with_bookmark("audit")),
            Box::new(audit_listing(6, 15)),
        ];
        let (document, metrics) = engine.render_with_metrics(story).expect("layout");

        assert!(document.pages.len() > 2);
        assert!(metrics.total_splits > 0);
        let expected: Vec<String> = (0..6)
            .flat_map(|r| (0..15).map(move |op| format!("r{r} op{op}")))
            .collect();
        assert_eq!(operations(&document), expected);

        for page in &document.pages {
            assert!(page.contains_text("Operation"), "header repeats on every page");
        }
        let bookmarks = document
            .pages
            .iter()
            .flat_map(|page| page.commands.iter())
            .filter(|cmd| matches!(cmd, Command::Bookmark { key, .. } if key.starts_with("record-")))
            .count();
        assert_eq!(bookmarks, 6);
    }

    #[test]
    fn row_taller_than_any_page_is_reported_up_front() {
        init_logging();
        let engine = Engine::builder()
            .page_size(Size::from_inches(6.0, 3.0))
            .build()
            .expect("engine");
        let mut listing = audit_listing(1, 2);
        listing
            .add_cells(vec![
                CellContent::block(Spacer::new(400.0)),
                CellContent::block(line("bob")),
                CellContent::block(line("status")),
                CellContent::block(line("r1 op0")),
            ])
            .expect("four cells");
        let err = engine
            .render(vec![Box::new(listing)])
            .expect_err("row cannot fit");
        assert!(matches!(err, FlowlistError::UnplaceableRow { index: 1, .. }));
    }

    #[test]
    fn batch_rendering_keeps_story_order() {
        init_logging();
        let engine = Engine::builder().build().expect("engine");
        let stories: Vec<Story> = (0..4)
            .map(|i| vec![Box::new(Paragraph::new(format!("document {i}"))) as Box<dyn Flowable>])
            .collect();
        let documents = engine.render_batch(stories).expect("batch");
        assert_eq!(documents.len(), 4);
        for (i, document) in documents.iter().enumerate() {
            assert!(document.pages[0].contains_text(&format!("document {i}")));
        }
    }

    #[test]
    fn margins_must_leave_a_frame() {
        let err = Engine::builder()
            .page_size(Size::from_inches(1.0, 1.0))
            .margin_all(40.0)
            .build()
            .err()
            .expect("margins swallow the page");
        assert!(matches!(err, FlowlistError::InvalidConfiguration(_)));
    }

    #[test]
    fn per_page_margins_become_templates() {
        let engine = Engine::builder()
            .page_margins(1, Margins::all(72.0))
            .build()
            .expect("engine");
        let templates = engine.page_templates();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].frames()[0].rect.x, Pt::from_i32(72));
        assert_eq!(templates[1].frames()[0].rect.x, Pt::from_i32(36));
    }

    #[test]
    fn page_callback_runs_on_every_page() {
        let engine = Engine::builder()
            .page_size(Size::from_inches(6.0, 3.0))
            .on_page(|canvas, ctx| {
                canvas.draw_string(Pt::ZERO, Pt::from_i32(20), format!("Page {}", ctx.page_number))
            })
            .build()
            .expect("engine");
        let document = engine
            .render(vec![Box::new(audit_listing(3, 12))])
            .expect("layout");
        for (i, page) in document.pages.iter().enumerate() {
            assert!(page.contains_text(&format!("Page {}", i + 1)));
        }
    }

    #[test]
    fn debug_log_records_page_breaks() {
        let path = std::env::temp_dir().join(format!("flowlist-engine-{}.jsonl", std::process::id()));
        let engine = Engine::builder()
            .page_size(Size::from_inches(6.0, 3.0))
            .debug_log(&path)
            .build()
            .expect("engine");
        engine
            .render(vec![Box::new(audit_listing(2, 20))])
            .expect("layout");
        let written = std::fs::read_to_string(&path).expect("read log");
        let _ = std::fs::remove_file(&path);
        assert!(written.contains("\"type\":\"layout.page_break\""));
        assert!(written.contains("\"flowable\":\"Listing\""));
        assert!(written.contains("\"type\":\"debug.summary\",\"context\":\"render\""));
    }
}
