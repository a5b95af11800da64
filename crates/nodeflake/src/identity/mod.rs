//! Start-up derivation of the `(datacenter_id, worker_id)` pair.
//!
//! Instances of a service pick their identity without talking to each other:
//! the datacenter ID comes from the hardware address of the first usable
//! network interface, and the worker ID from a hash of that datacenter ID and
//! the process id. Neither step can fail. When no usable interface exists the
//! datacenter ID falls back to [`FALLBACK_DATACENTER_ID`], which means every
//! such instance shares it and only the process-id hash keeps their worker
//! IDs apart. That collision risk is accepted in exchange for always being
//! able to start; it is reported through [`IdentitySource::Fallback`].

mod interfaces;
#[cfg(test)]
mod tests;

pub use interfaces::*;

use crate::BitLayout;

/// Datacenter ID used when no qualifying interface is found.
pub const FALLBACK_DATACENTER_ID: i64 = 1;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Where a [`NodeIdentity`]'s datacenter ID came from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentitySource {
    /// Derived from the hardware address of the named interface.
    HardwareAddress { interface: String },
    /// No qualifying interface; [`FALLBACK_DATACENTER_ID`] was used.
    Fallback,
    /// Supplied explicitly by the operator.
    Configured,
}

/// The node identity embedded in every generated ID.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    pub datacenter_id: i64,
    pub worker_id: i64,
    pub source: IdentitySource,
}

impl NodeIdentity {
    /// Resolves the identity from the host's interfaces and the current
    /// process id.
    ///
    /// Call this once at start-up; the result is not refreshed if interfaces
    /// change later.
    pub fn resolve(layout: &BitLayout) -> Self {
        IdentityResolver::new(SystemInterfaces).resolve(layout)
    }

    /// Uses operator-supplied identifiers as-is. Range checks happen when the
    /// generator is built.
    pub fn fixed(datacenter_id: i64, worker_id: i64) -> Self {
        Self {
            datacenter_id,
            worker_id,
            source: IdentitySource::Configured,
        }
    }

    /// Whether the datacenter ID is the shared fallback value.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, IdentitySource::Fallback)
    }
}

/// Derives a [`NodeIdentity`] from an [`InterfaceSource`] and a process id.
#[derive(Clone, Debug)]
pub struct IdentityResolver<S> {
    source: S,
    process_id: u32,
}

impl<S: InterfaceSource> IdentityResolver<S> {
    /// Creates a resolver reading `source` and the current process id.
    pub fn new(source: S) -> Self {
        Self {
            source,
            process_id: std::process::id(),
        }
    }

    /// Overrides the process id mixed into the worker ID.
    pub fn with_process_id(mut self, process_id: u32) -> Self {
        self.process_id = process_id;
        self
    }

    /// Resolves both identifiers for `layout`.
    pub fn resolve(&self, layout: &BitLayout) -> NodeIdentity {
        let (datacenter_id, source) = self.resolve_datacenter_id(layout.max_datacenter_id());
        let worker_id = worker_id(datacenter_id, self.process_id, layout.max_worker_id());

        #[cfg(feature = "tracing")]
        tracing::debug!(datacenter_id, worker_id, ?source, "resolved node identity");

        NodeIdentity {
            datacenter_id,
            worker_id,
            source,
        }
    }

    fn resolve_datacenter_id(&self, max_datacenter_id: i64) -> (i64, IdentitySource) {
        let interfaces = match self.source.interfaces() {
            Ok(interfaces) => interfaces,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "failed to enumerate network interfaces");
                Vec::new()
            }
        };

        match select_interface(&interfaces) {
            Some(iface) => (
                datacenter_id(&iface.hardware_address, max_datacenter_id),
                IdentitySource::HardwareAddress {
                    interface: iface.name.clone(),
                },
            ),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    datacenter_id = FALLBACK_DATACENTER_ID,
                    "no usable non-loopback interface, falling back to the shared datacenter ID"
                );
                (
                    fallback_datacenter_id(max_datacenter_id),
                    IdentitySource::Fallback,
                )
            }
        }
    }
}

/// Folds the last two bytes of a hardware address into a datacenter ID.
///
/// Computes `((mac[n-2] | mac[n-1] << 8) >> 6) % (max + 1)`. Addresses
/// shorter than two bytes yield the fallback.
pub fn datacenter_id(hardware_address: &[u8], max_datacenter_id: i64) -> i64 {
    let [.., lo, hi] = hardware_address else {
        return fallback_datacenter_id(max_datacenter_id);
    };
    let id = (i64::from(*lo) | (i64::from(*hi) << 8)) >> 6;
    id % (max_datacenter_id + 1)
}

// Only a zero-width datacenter field moves the fallback off 1.
fn fallback_datacenter_id(max_datacenter_id: i64) -> i64 {
    FALLBACK_DATACENTER_ID % (max_datacenter_id + 1)
}

/// Hashes the decimal datacenter ID and process id into a worker ID.
///
/// The two numbers are concatenated as decimal strings (no separator), hashed
/// with 32-bit FNV-1a, masked to 16 bits and reduced modulo `max + 1`.
pub fn worker_id(datacenter_id: i64, process_id: u32, max_worker_id: i64) -> i64 {
    let key = format!("{datacenter_id}{process_id}");
    i64::from(fnv1a_32(key.as_bytes()) & 0xFFFF) % (max_worker_id + 1)
}

/// 32-bit FNV-1a.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV32_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV32_PRIME)
    })
}
