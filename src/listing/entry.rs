use crate::canvas::Canvas;
use crate::flowable::{Flowable, huge_pt};
use crate::listing::column::ColumnSchema;
use crate::types::Pt;
use log::trace;
use std::sync::{Arc, Mutex};

/// Content of one cell. Blocks are shared read-only, so handing the same
/// cell to several fragments never aliases mutable state.
#[derive(Clone)]
pub enum CellContent {
    Block(Arc<dyn Flowable>),
    /// Successive blocks stacked top to bottom. Only a long column may divide
    /// a sequence between fragments.
    Sequence(Vec<Arc<dyn Flowable>>),
}

impl CellContent {
    pub fn block(flowable: impl Flowable + 'static) -> Self {
        CellContent::Block(Arc::new(flowable))
    }

    pub fn sequence<F>(flowables: impl IntoIterator<Item = F>) -> Self
    where
        F: Flowable + 'static,
    {
        CellContent::Sequence(
            flowables
                .into_iter()
                .map(|f| Arc::new(f) as Arc<dyn Flowable>)
                .collect(),
        )
    }

    pub fn blocks(&self) -> &[Arc<dyn Flowable>] {
        match self {
            CellContent::Block(block) => std::slice::from_ref(block),
            CellContent::Sequence(blocks) => blocks,
        }
    }

    /// Stacked height of every block at `width`.
    pub fn stacked_height(&self, width: Pt) -> Pt {
        self.blocks()
            .iter()
            .map(|block| block.wrap(width, huge_pt()).height)
            .sum()
    }
}

impl std::fmt::Debug for CellContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.blocks().iter().map(|b| b.debug_name()).collect();
        match self {
            CellContent::Block(_) => write!(f, "Block({})", names.join(", ")),
            CellContent::Sequence(_) => write!(f, "Sequence[{}]", names.join(", ")),
        }
    }
}

pub type EntryCallback = Arc<dyn Fn(&mut Canvas) + Send + Sync>;

/// Measured size of a row at one listing width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryMetrics {
    pub width: Pt,
    pub height: Pt,
    /// Tallest non-long column: the least a page must hold to show the row's
    /// context columns in full.
    pub min_needed_height: Pt,
}

impl EntryMetrics {
    /// Smallest space a page must offer before the row may be started.
    pub fn min_height(&self, short_row_threshold: Pt) -> Pt {
        if self.height - self.min_needed_height < short_row_threshold {
            self.height
        } else {
            self.min_needed_height
        }
    }
}

/// Head and continuation produced by splitting a row.
#[derive(Debug, Clone)]
pub struct EntrySplit {
    pub head: ListEntry,
    pub continuation: ListEntry,
}

/// One row of a listing.
#[derive(Clone)]
pub struct ListEntry {
    cells: Vec<CellContent>,
    was_split: bool,
    continuation: bool,
    bookmark: Option<String>,
    page_bookmark: Option<String>,
    on_draw: Option<EntryCallback>,
    metrics: Arc<Mutex<Option<CachedMeasure>>>,
}

// Column widths take part in the key: a listing measured at one width may
// have had its columns resolved at another.
#[derive(Debug, Clone)]
struct CachedMeasure {
    column_widths: Vec<Pt>,
    metrics: EntryMetrics,
}

impl ListEntry {
    pub fn new(cells: Vec<CellContent>) -> Self {
        Self {
            cells,
            was_split: false,
            continuation: false,
            bookmark: None,
            page_bookmark: None,
            on_draw: None,
            metrics: Arc::new(Mutex::new(None)),
        }
    }

    /// Named destination at the row's top edge.
    pub fn with_bookmark(mut self, key: impl Into<String>) -> Self {
        self.bookmark = Some(key.into());
        self
    }

    /// Named destination for the page the row starts on.
    pub fn with_page_bookmark(mut self, key: impl Into<String>) -> Self {
        self.page_bookmark = Some(key.into());
        self
    }

    /// Called once, when the row (or the head fragment of it) is drawn.
    pub fn with_on_draw<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Canvas) + Send + Sync + 'static,
    {
        self.on_draw = Some(Arc::new(callback));
        self
    }

    pub fn cells(&self) -> &[CellContent] {
        &self.cells
    }

    pub fn was_split(&self) -> bool {
        self.was_split
    }

    pub fn is_continuation(&self) -> bool {
        self.continuation
    }

    pub fn bookmark(&self) -> Option<&str> {
        self.bookmark.as_deref()
    }

    pub fn page_bookmark(&self) -> Option<&str> {
        self.page_bookmark.as_deref()
    }

    pub(crate) fn on_draw(&self) -> Option<&EntryCallback> {
        self.on_draw.as_ref()
    }

    /// Measures the row against `columns`. Memoized per `width`.
    pub fn measure(&self, columns: &ColumnSchema, width: Pt) -> EntryMetrics {
        let column_widths = columns.widths();
        if let Ok(cache) = self.metrics.lock() {
            if let Some(cached) = cache.as_ref() {
                if cached.metrics.width == width && cached.column_widths == column_widths {
                    return cached.metrics;
                }
            }
        }

        let mut height = Pt::ZERO;
        let mut min_needed_height = Pt::ZERO;
        for (column, cell) in columns.iter().zip(&self.cells) {
            let column_height = cell.stacked_height(column.width());
            height = height.max(column_height);
            if !column.is_long() {
                min_needed_height = min_needed_height.max(column_height);
            }
        }
        let metrics = EntryMetrics {
            width,
            height,
            min_needed_height,
        };
        trace!(
            "measured listing entry: height={} min_needed={} at width={}",
            height, min_needed_height, width
        );
        if let Ok(mut cache) = self.metrics.lock() {
            *cache = Some(CachedMeasure {
                column_widths,
                metrics,
            });
        }
        metrics
    }

    /// Divides the row so that the head fits in `available_height`.
    ///
    /// Non-long cells are repeated on both parts. Each long cell keeps the
    /// blocks that fit; the first block that does not fit is split itself when
    /// it allows it, otherwise it moves whole to the continuation together with
    /// everything after it. Returns `None` when no long content would land on
    /// the head, since such a split cannot make progress.
    pub fn split(
        &self,
        columns: &ColumnSchema,
        available_height: Pt,
    ) -> Option<EntrySplit> {
        let mut head_cells = Vec::with_capacity(self.cells.len());
        let mut continuation_cells = Vec::with_capacity(self.cells.len());
        let mut progressed = false;

        for (column, cell) in columns.iter().zip(&self.cells) {
            if !column.is_long() {
                head_cells.push(cell.clone());
                continuation_cells.push(cell.clone());
                continue;
            }

            let (head, rest) = split_blocks(cell.blocks(), column.width(), available_height);
            progressed |= !head.is_empty();
            head_cells.push(CellContent::Sequence(head));
            continuation_cells.push(CellContent::Sequence(rest));
        }

        if !progressed {
            return None;
        }

        let head = ListEntry {
            cells: head_cells,
            was_split: true,
            continuation: self.continuation,
            bookmark: self.bookmark.clone(),
            page_bookmark: self.page_bookmark.clone(),
            on_draw: self.on_draw.clone(),
            metrics: Arc::new(Mutex::new(None)),
        };
        let continuation = ListEntry {
            cells: continuation_cells,
            was_split: false,
            continuation: true,
            bookmark: None,
            page_bookmark: None,
            on_draw: None,
            metrics: Arc::new(Mutex::new(None)),
        };
        Some(EntrySplit { head, continuation })
    }
}

fn split_blocks(
    blocks: &[Arc<dyn Flowable>],
    width: Pt,
    budget: Pt,
) -> (Vec<Arc<dyn Flowable>>, Vec<Arc<dyn Flowable>>) {
    let mut remaining = budget;
    let mut head = Vec::new();
    let mut rest = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        let height = block.wrap(width, huge_pt()).height;
        if height <= remaining {
            head.push(block.clone());
            remaining -= height;
            continue;
        }

        match block.split(width, remaining) {
            Some((first, second))
                if first.wrap(width, huge_pt()).height <= remaining =>
            {
                head.push(Arc::from(first));
                rest.push(Arc::from(second));
            }
            _ => rest.push(block.clone()),
        }
        rest.extend(blocks[index + 1..].iter().cloned());
        break;
    }
    (head, rest)
}

impl std::fmt::Debug for ListEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEntry")
            .field("cells", &self.cells)
            .field("was_split", &self.was_split)
            .field("continuation", &self.continuation)
            .field("bookmark", &self.bookmark)
            .field("page_bookmark", &self.page_bookmark)
            .field("on_draw", &self.on_draw.is_some())
            .finish()
    }
}
