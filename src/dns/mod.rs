//! DNS resolution.
//!
//! This module provides:
//! - [`DnsResolver`]: the query seam, with [`HickoryResolver`] for production and
//!   [`StaticResolver`] for fixtures
//! - [`ResolverAdapter`]: per-query timeout and single retry on transient failure
//! - [`RawRecordSet`]: raw answers keyed by [`RecordType`]

mod adapter;
mod resolver;
mod static_resolver;
mod types;

// Re-export public API
pub use adapter::ResolverAdapter;
pub use resolver::{DnsResolver, HickoryResolver};
pub use static_resolver::StaticResolver;
pub use types::{RawRecordSet, RecordType};
