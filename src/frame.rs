use crate::canvas::Canvas;
use crate::flowable::{BreakInside, Flowable};
use crate::types::{Pt, Rect};

pub enum AddResult {
    Placed,
    /// The head was drawn; the continuation goes to the next frame.
    Split(Box<dyn Flowable>),
    /// Nothing was drawn.
    Overflow(Box<dyn Flowable>),
}

/// A rectangular region of a page filled top to bottom.
pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: Pt::ZERO,
        }
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.height - self.cursor_y).max(Pt::ZERO)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_y <= Pt::ZERO
    }

    pub fn add(&mut self, flowable: Box<dyn Flowable>, canvas: &mut Canvas) -> AddResult {
        let avail_width = self.rect.width;
        let avail_height = self.remaining_height();
        if avail_height <= Pt::ZERO {
            return AddResult::Overflow(flowable);
        }

        let pagination = flowable.pagination();
        let size = flowable.wrap(avail_width, avail_height);
        if matches!(pagination.break_inside, BreakInside::Avoid)
            && size.height > avail_height
            && size.height <= self.rect.height
            && !self.is_empty()
        {
            return AddResult::Overflow(flowable);
        }

        if size.height <= avail_height {
            self.place(flowable.as_ref(), size.width, size.height, canvas);
            return AddResult::Placed;
        }

        if let Some((first, second)) = flowable.split(avail_width, avail_height) {
            let first_size = first.wrap(avail_width, avail_height);
            if first_size.height > Pt::ZERO && first_size.height <= avail_height {
                self.place(first.as_ref(), first_size.width, first_size.height, canvas);
                return AddResult::Split(second);
            }
        }

        // Overfull content is never forced onto the page; the document driver
        // reports it when even an empty frame cannot take it.
        AddResult::Overflow(flowable)
    }

    fn place(&mut self, flowable: &dyn Flowable, width: Pt, height: Pt, canvas: &mut Canvas) {
        let top = self.rect.y + self.cursor_y;
        flowable.draw(
            canvas,
            self.rect.x,
            top,
            self.rect.width,
            self.remaining_height(),
        );
        canvas.record_flowable_bounds(Rect {
            x: self.rect.x,
            y: top,
            width,
            height,
        });
        self.cursor_y += height;
    }
}
