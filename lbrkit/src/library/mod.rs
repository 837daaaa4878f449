//! Deviceset editing
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐
//! │   Template   │───▶│   Variants   │──┐
//! │   Resolver   │    │   (clones)   │  │
//! └──────────────┘    └──────────────┘  │   ┌──────────────┐
//!                                       ├──▶│ Merge/Create │──▶ attribute upsert
//! ┌──────────────┐                      │   └──────────────┘
//! │ Library-wide │──────────────────────┘
//! │    Search    │
//! └──────────────┘
//! ```
//!
//! All operations take the document or the node they act on explicitly and
//! only ever mutate clones of template and search results.

pub mod attribute;
pub mod create;
pub mod device;
pub mod merge;
pub mod search;
pub mod summary;
pub mod template;

pub use attribute::upsert;
pub use create::create;
pub use device::{MetadataMap, PartMetadata, VariantMap};
pub use merge::{merge, MergeCounts};
pub use search::find_existing_variant;
pub use summary::{summarize_deviceset, DeviceSummary, DevicesetSummary};
pub use template::{
    extract_variants, find_template, find_template_named, get_existing_deviceset,
    list_devicesets, require_deviceset, template_footprints, TEMPLATE_NAME,
};
