//! Business logic services
//!
//! The store owns every mutation; the timeline service serves the derived
//! read views. Both borrow a shared [`StoreContext`].

pub mod context;
pub mod error;
pub mod store;
pub mod timeline;

pub use context::{StoreContext, StoreContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use store::ReactionStore;
pub use timeline::{TimelinePage, TimelineService};
