//! # reaction-service
//!
//! Application layer: the reaction store (upsert, remove, get), the timeline
//! and aggregate views built on it, store settings and DTOs.

pub mod dto;
pub mod services;
pub mod settings;

pub use services::{
    ReactionStore, ServiceError, ServiceResult, StoreContext, StoreContextBuilder, TimelinePage,
    TimelineService,
};
pub use settings::{EditPolicy, ReactionTypeCatalog, StoreSettings};
