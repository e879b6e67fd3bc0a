//! Accelerator device load and request tests

mod common;

use acap_api::{Error, status_code};
use acap_zocl::aperture::UNASSIGNED_CU;
use acap_zocl::{MAX_APERTURES, SectionKind, ZoclConfig, ZoclDevice};
use common::{XclbinBuilder, sample_xclbin};
use uuid::Uuid;

fn device() -> ZoclDevice {
    ZoclDevice::new(ZoclConfig::default()).unwrap()
}

#[test]
fn test_load_commits_slot() {
    let device = device();
    assert_eq!(device.load_axlf(1, &sample_xclbin(0x10)), Ok(()));
    assert_eq!(device.slot_uuid(1), Ok(Some(Uuid::from_bytes([0x10; 16]))));
    assert_eq!(device.slot_uuid(0), Ok(None));

    let apertures = device.apertures_for_slot(1);
    assert_eq!(apertures.len(), 3);
    assert!(apertures.iter().all(|a| a.cu_index == UNASSIGNED_CU));

    let ip_count = device
        .with_slot(1, |slot| slot.sections().map(|s| s.ip_layout().count()))
        .unwrap();
    assert_eq!(ip_count, Some(3));
}

#[test]
fn test_reload_same_uuid_is_rejected() {
    let device = device();
    device.load_axlf(0, &sample_xclbin(0x20)).unwrap();
    let before = device.apertures().entries().to_vec();
    let block = device
        .with_slot(0, |slot| slot.sections().map(|s| s.as_bytes().to_vec()))
        .unwrap();

    let reload = device.load_axlf(0, &XclbinBuilder::new(0x20).kernels(9).build());
    assert_eq!(reload, Err(Error::AlreadyLoaded));
    assert_eq!(status_code(&reload), 11);
    assert_eq!(device.apertures().entries(), &before[..]);
    assert_eq!(
        device
            .with_slot(0, |slot| slot.sections().map(|s| s.as_bytes().to_vec()))
            .unwrap(),
        block
    );
}

#[test]
fn test_same_uuid_in_another_slot() {
    let device = device();
    device.load_axlf(0, &sample_xclbin(0x21)).unwrap();
    assert_eq!(device.load_axlf(1, &sample_xclbin(0x21)), Ok(()));
    assert_eq!(device.apertures().len(), 6);
}

#[test]
fn test_new_container_replaces_slot_sections() {
    let device = device();
    device.load_axlf(0, &sample_xclbin(0x30)).unwrap();
    device
        .load_axlf(0, &XclbinBuilder::new(0x31).kernels(1).build())
        .unwrap();
    assert_eq!(device.slot_uuid(0), Ok(Some(Uuid::from_bytes([0x31; 16]))));
    assert_eq!(
        device.with_slot(0, |s| s.sections().map(|s| s.ip_layout().count())),
        Ok(Some(1))
    );
    // Apertures of the earlier container stay in the table
    assert_eq!(device.apertures_for_slot(0).len(), 4);
}

#[test]
fn test_rejects_non_flat_mode() {
    let device = device();
    let buf = XclbinBuilder::new(0x40).kernels(1).mode(1).build();
    assert_eq!(device.load_axlf(0, &buf), Err(Error::InvalidArgument));
    assert_eq!(device.slot_uuid(0), Ok(None));
}

#[test]
fn test_requires_aie_resources() {
    let device = device();
    let buf = XclbinBuilder::new(0x41)
        .kernels(2)
        .without(SectionKind::AieResources)
        .build();
    assert_eq!(device.load_axlf(0, &buf), Err(Error::NotFound));
    assert_eq!(device.slot_uuid(0), Ok(None));
    assert!(device.apertures().is_empty());
}

#[test]
fn test_bad_magic() {
    let device = device();
    let mut buf = sample_xclbin(0x42);
    buf[0] = b'X';
    assert_eq!(device.load_axlf(0, &buf), Err(Error::InvalidHeader));
}

#[test]
fn test_invalid_sections_leave_slot_empty() {
    let device = device();
    let mut ip_layout = XclbinBuilder::new(0x43).kernels(1).ip_layout_bytes();
    ip_layout.push(0);
    let buf = XclbinBuilder::new(0x43)
        .raw_section(SectionKind::IpLayout, ip_layout)
        .build();
    assert_eq!(device.load_axlf(0, &buf), Err(Error::InvalidFormat));
    assert!(device.with_slot(0, |s| !s.is_loaded()).unwrap());
}

#[test]
fn test_failed_load_rolls_back_apertures() {
    let device = device();
    device
        .load_axlf(0, &XclbinBuilder::new(0x50).kernels(200).build())
        .unwrap();

    let overflow = XclbinBuilder::new(0x51).kernels(40).monitors(20).build();
    assert_eq!(device.load_axlf(1, &overflow), Err(Error::OutOfSpace));
    assert_eq!(device.apertures().len(), 200);
    assert!(device.apertures_for_slot(1).is_empty());
    assert_eq!(device.slot_uuid(1), Ok(None));

    let fits = XclbinBuilder::new(0x52).kernels(40).monitors(16).build();
    assert_eq!(device.load_axlf(1, &fits), Ok(()));
    assert_eq!(device.apertures().len(), MAX_APERTURES);
}

#[test]
fn test_xclbinid_request() {
    let device = device();
    device.load_axlf(2, &sample_xclbin(0xAB)).unwrap();
    device.load_axlf(0, &sample_xclbin(0x01)).unwrap();

    let mut buf = [0u8; 128];
    let written = device.request("xclbinid", &mut buf).unwrap();
    let text = std::str::from_utf8(&buf[..written]).unwrap();
    assert_eq!(
        text,
        "0 01010101-0101-0101-0101-010101010101\n\
         2 abababab-abab-abab-abab-abababababab\n"
    );
    assert!(buf[written..].iter().all(|&b| b == 0));
}

#[test]
fn test_xclbinid_request_overflow() {
    let device = device();
    device.load_axlf(0, &sample_xclbin(0x01)).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(
        device.request("xclbinid", &mut buf),
        Err(Error::BufferTooSmall)
    );
}

#[test]
fn test_unknown_request() {
    let device = device();
    let mut buf = [0u8; 8];
    assert_eq!(device.request("kds_custat", &mut buf), Err(Error::InvalidArgument));
    assert_eq!(device.request("kds_custat_raw", &mut buf), Ok(0));
}

#[test]
fn test_concurrent_loads_into_different_slots() {
    let device = device();
    std::thread::scope(|scope| {
        for slot in 0..4usize {
            let device = &device;
            scope.spawn(move || {
                let buf = XclbinBuilder::new(0x60 + slot as u8)
                    .kernels(10)
                    .monitors(5)
                    .build();
                device.load_axlf(slot, &buf).unwrap();
            });
        }
    });

    assert_eq!(device.xclbin_ids().len(), 4);
    assert_eq!(device.apertures().len(), 60);
    for slot in 0..4 {
        assert_eq!(device.apertures_for_slot(slot).len(), 15);
    }
}

#[test]
fn test_version() {
    let version = device().version();
    assert_eq!(version.name, "zocl");
    assert_eq!(version.desc, "ZOCL Versal");
    let json = serde_json::to_value(version).unwrap();
    assert_eq!(json["major"], 1);
}
