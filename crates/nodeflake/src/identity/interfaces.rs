use std::io;

/// What the resolver needs to know about one network interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    /// Administratively up.
    pub is_up: bool,
    pub is_loopback: bool,
    /// Link-layer address; empty when the interface has none.
    pub hardware_address: Vec<u8>,
    /// Carries at least one IPv4 or IPv6 address outside the loopback range.
    pub has_non_loopback_ip: bool,
}

impl NetworkInterface {
    /// Whether this interface may supply the node's hardware address.
    pub fn qualifies(&self) -> bool {
        self.is_up && !self.is_loopback && self.has_non_loopback_ip && !self.hardware_address.is_empty()
    }
}

/// Enumerates the host's network interfaces.
///
/// The resolver only reads through this trait, so tests can hand it a fixed
/// interface table.
pub trait InterfaceSource {
    /// Returns every interface in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to enumerate interfaces. The
    /// resolver treats this the same as having no qualifying interface.
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>>;
}

impl<S: InterfaceSource + ?Sized> InterfaceSource for &S {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        (**self).interfaces()
    }
}

impl InterfaceSource for Vec<NetworkInterface> {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        Ok(self.clone())
    }
}

/// Returns the first interface that is up, not loopback, carries a routable
/// address and has a hardware address.
pub fn select_interface(interfaces: &[NetworkInterface]) -> Option<&NetworkInterface> {
    interfaces.iter().find(|iface| iface.qualifies())
}

/// Interfaces as reported by the operating system.
///
/// Backed by `getifaddrs(3)` on Linux, Android, macOS, iOS and FreeBSD. Other
/// platforms report no interfaces, which sends the resolver to its fallback.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemInterfaces;

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd"
))]
impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        use nix::{ifaddrs::getifaddrs, net::if_::InterfaceFlags};

        // getifaddrs yields one entry per (interface, address) pair; fold them
        // per interface name while keeping first-seen order.
        let mut interfaces: Vec<NetworkInterface> = Vec::new();
        for ifaddr in getifaddrs().map_err(io::Error::from)? {
            let idx = match interfaces
                .iter()
                .position(|iface| iface.name == ifaddr.interface_name)
            {
                Some(idx) => idx,
                None => {
                    interfaces.push(NetworkInterface {
                        name: ifaddr.interface_name.clone(),
                        ..NetworkInterface::default()
                    });
                    interfaces.len() - 1
                }
            };
            let entry = &mut interfaces[idx];
            entry.is_up |= ifaddr.flags.contains(InterfaceFlags::IFF_UP);
            entry.is_loopback |= ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK);

            let Some(address) = ifaddr.address.as_ref() else {
                continue;
            };
            if let Some(link) = address.as_link_addr() {
                if entry.hardware_address.is_empty() {
                    if let Some(mac) = link.addr() {
                        entry.hardware_address = mac.to_vec();
                    }
                }
            } else if let Some(v4) = address.as_sockaddr_in() {
                entry.has_non_loopback_ip |= !v4.ip().is_loopback();
            } else if let Some(v6) = address.as_sockaddr_in6() {
                entry.has_non_loopback_ip |= !v6.ip().is_loopback();
            }
        }
        Ok(interfaces)
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd"
)))]
impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        Ok(Vec::new())
    }
}
