pub mod category;
pub mod snapshot;

pub use category::Category;
pub use snapshot::Snapshot;
