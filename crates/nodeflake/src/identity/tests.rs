use super::*;
use std::io;

struct FailingInterfaces;

impl InterfaceSource for FailingInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        Err(io::Error::other("enumeration denied"))
    }
}

fn loopback() -> NetworkInterface {
    NetworkInterface {
        name: "lo".into(),
        is_up: true,
        is_loopback: true,
        hardware_address: vec![0; 6],
        has_non_loopback_ip: false,
    }
}

fn ethernet(name: &str, mac: [u8; 6]) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        is_up: true,
        is_loopback: false,
        hardware_address: mac.to_vec(),
        has_non_loopback_ip: true,
    }
}

const MAC: [u8; 6] = [0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e];

#[test]
fn fnv1a_matches_reference_vectors() {
    assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
    assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
    assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
}

#[test]
fn datacenter_id_folds_last_two_bytes() {
    // (0x4d | 0x5e << 8) >> 6 = 377, 377 % 32 = 25
    assert_eq!(datacenter_id(&MAC, 31), 25);
    assert_eq!(datacenter_id(&MAC, 1023), 377);
}

#[test]
fn datacenter_id_short_address_falls_back() {
    assert_eq!(datacenter_id(&[0xff], 31), FALLBACK_DATACENTER_ID);
    assert_eq!(datacenter_id(&[], 31), FALLBACK_DATACENTER_ID);
}

#[test]
fn worker_id_hashes_decimal_concatenation() {
    // fnv1a("14242") & 0xffff = 36388, 36388 % 32 = 4
    assert_eq!(worker_id(1, 4242, 31), 4);
    // fnv1a("254242") & 0xffff = 53944, 53944 % 32 = 24
    assert_eq!(worker_id(25, 4242, 31), 24);
    assert_eq!(worker_id(25, 4242, 0xFFFF), 53944);
}

#[test]
fn resolver_picks_first_qualifying_interface() {
    let down = NetworkInterface {
        is_up: false,
        ..ethernet("eth9", [0xff; 6])
    };
    let no_ip = NetworkInterface {
        has_non_loopback_ip: false,
        ..ethernet("veth0", [0xee; 6])
    };
    let interfaces = vec![loopback(), down, no_ip, ethernet("eth0", MAC), ethernet("eth1", [1; 6])];

    let identity = IdentityResolver::new(interfaces)
        .with_process_id(4242)
        .resolve(&BitLayout::REFERENCE);

    assert_eq!(identity.datacenter_id, 25);
    assert_eq!(identity.worker_id, 24);
    assert_eq!(
        identity.source,
        IdentitySource::HardwareAddress {
            interface: "eth0".into()
        }
    );
    assert!(!identity.is_fallback());
}

#[test]
fn resolver_falls_back_without_usable_interface() {
    let identity = IdentityResolver::new(vec![loopback()])
        .with_process_id(4242)
        .resolve(&BitLayout::REFERENCE);

    assert_eq!(identity.datacenter_id, FALLBACK_DATACENTER_ID);
    assert_eq!(identity.worker_id, 4);
    assert!(identity.is_fallback());
}

#[test]
fn resolver_falls_back_when_enumeration_fails() {
    let identity = IdentityResolver::new(FailingInterfaces)
        .with_process_id(4242)
        .resolve(&BitLayout::REFERENCE);

    assert_eq!(identity.datacenter_id, FALLBACK_DATACENTER_ID);
    assert_eq!(identity.source, IdentitySource::Fallback);
}

#[test]
fn resolver_without_hardware_address_falls_back() {
    let no_mac = NetworkInterface {
        hardware_address: Vec::new(),
        ..ethernet("tun0", MAC)
    };
    let identity = IdentityResolver::new(vec![no_mac]).resolve(&BitLayout::REFERENCE);
    assert!(identity.is_fallback());
}

#[test]
fn zero_width_datacenter_field_keeps_fallback_in_range() {
    let layout = BitLayout::new(46, 0, 5, 12).unwrap();
    let identity = IdentityResolver::new(Vec::new()).resolve(&layout);
    assert_eq!(identity.datacenter_id, 0);
    assert!(identity.is_fallback());
}

#[test]
fn resolved_ids_fit_their_fields() {
    let layout = BitLayout::REFERENCE;
    let identity = NodeIdentity::resolve(&layout);
    assert!((0..=layout.max_datacenter_id()).contains(&identity.datacenter_id));
    assert!((0..=layout.max_worker_id()).contains(&identity.worker_id));
}

#[test]
fn fixed_identity_is_configured() {
    let identity = NodeIdentity::fixed(3, 7);
    assert_eq!(identity.source, IdentitySource::Configured);
    assert!(!identity.is_fallback());
}
