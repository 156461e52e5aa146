use crate::types::Pt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowlistError {
    #[error("no page template available")]
    MissingPageTemplate,
    #[error("flowable cannot fit on any page: {0}")]
    UnplaceableFlowable(String),
    #[error("listing row {index} needs at least {min_height} but a fresh page only offers {page_height}")]
    UnplaceableRow {
        index: usize,
        min_height: Pt,
        page_height: Pt,
    },
    #[error("row has {found} cells but the listing defines {expected} columns")]
    ColumnCountMismatch { expected: usize, found: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
