use crate::canvas::Canvas;
use crate::doc_context::DocContext;
use crate::frame::Frame;
use crate::types::{Margins, Rect, Size};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct FrameSpec {
    pub rect: Rect,
}

/// Called at the start of every page drawn from a template, before any
/// flowable. Used for running headers and watermarks.
pub type OnPageCallback = Arc<dyn Fn(&mut Canvas, &DocContext) + Send + Sync>;

#[derive(Clone)]
pub struct PageTemplate {
    pub name: String,
    pub page_size: Size,
    frames: Vec<FrameSpec>,
    on_page: Option<OnPageCallback>,
}

impl PageTemplate {
    pub fn new(name: impl Into<String>, page_size: Size) -> Self {
        Self {
            name: name.into(),
            page_size,
            frames: Vec::new(),
            on_page: None,
        }
    }

    /// Template with a single frame covering the page inside `margins`.
    pub fn single_frame(name: impl Into<String>, page_size: Size, margins: Margins) -> Self {
        Self::new(name, page_size).with_frame(margins.content_rect(page_size))
    }

    pub fn with_frame(mut self, rect: Rect) -> Self {
        self.frames.push(FrameSpec { rect });
        self
    }

    pub fn set_on_page<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Canvas, &DocContext) + Send + Sync + 'static,
    {
        self.on_page = Some(Arc::new(callback));
        self
    }

    pub fn on_page(&self) -> Option<&OnPageCallback> {
        self.on_page.as_ref()
    }

    pub fn frames(&self) -> &[FrameSpec] {
        &self.frames
    }

    pub fn instantiate_frames(&self) -> Vec<Frame> {
        self.frames
            .iter()
            .map(|spec| Frame::new(spec.rect))
            .collect()
    }
}

impl std::fmt::Debug for PageTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTemplate")
            .field("name", &self.name)
            .field("page_size", &self.page_size)
            .field("frames", &self.frames)
            .field("on_page", &self.on_page.is_some())
            .finish()
    }
}
