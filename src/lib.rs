pub mod error;
pub mod config;
pub mod identity;
pub mod tree;
pub mod acl;
pub mod graph;
pub mod search;
pub mod content;
pub mod notify;
pub mod catalog;
pub mod ingest;

pub use error::{StoreError, StoreResult};
pub use catalog::Catalog;
pub use ingest::{do_ingest, IngestReport};

// Test-only printing helper: expands to eprintln! during tests and debug builds.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
