//! Client-side view state
//!
//! - PaginationController: intended page and sort order
//! - InteractionState: open reply editor and expanded threads
//! - LightboxState: the image currently shown full size

pub mod interaction;
pub mod lightbox;
pub mod pagination;

pub use interaction::InteractionState;
pub use lightbox::LightboxState;
pub use pagination::{
    FetchDescriptor, PageState, PageTarget, PaginationController, SortDirection, SortKey,
    SortState, DEFAULT_PAGE_SIZE,
};
