/// History Module
///
/// Bounded store of finalized profiles and the render-window filter guarding consumers with a
/// limited backward reference depth.
pub mod render_filter;
pub mod store;
pub mod structs;

pub use render_filter::{is_safe, RenderWindowFilter};
pub use store::HistoryStore;
pub use structs::{RenderableRecord, StoredRecord};
