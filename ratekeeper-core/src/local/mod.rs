//! In-process implementations of the ports.
//!
//! These back the command-line panel's simulated page and the test suites.

pub mod bridge;
pub mod page;
pub mod store;

pub use bridge::LocalBridge;
pub use page::{LocalDocument, LocalVideo};
pub use store::MemoryStore;
