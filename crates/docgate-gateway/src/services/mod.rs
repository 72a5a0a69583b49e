//! Built-in operation services.

pub mod documents;
pub mod system;

pub use documents::DocumentService;
pub use system::SystemService;
