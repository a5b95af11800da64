//! Clock-based 63-bit unique IDs for many concurrent callers in one process,
//! kept disjoint across processes by a per-node identity instead of a central
//! allocator.
//!
//! ```
//! use nodeflake::{GeneratorConfig, IdGenerator};
//!
//! let generator = IdGenerator::from_host(GeneratorConfig::default()).unwrap();
//! if generator.identity().is_fallback() {
//!     // no usable network interface: the shared fallback datacenter ID is in use
//! }
//! let id = generator.next_id().unwrap();
//! println!("{id} -> {}", generator.decode(id));
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod entity;
mod error;
mod generator;
pub mod identity;
mod layout;
mod time;

pub use crate::entity::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::identity::{
    FALLBACK_DATACENTER_ID, IdentityResolver, IdentitySource, InterfaceSource, NetworkInterface,
    NodeIdentity, SystemInterfaces,
};
pub use crate::layout::*;
pub use crate::time::*;
