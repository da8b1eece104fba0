pub mod registry;
pub mod service;
pub mod status;
pub mod summary;
pub mod system;


pub use registry::Health;
pub use service::{CallableService, Service};
pub use status::{Status, StatusSummary};
pub use summary::Summary;
pub use system::MemoryService;
