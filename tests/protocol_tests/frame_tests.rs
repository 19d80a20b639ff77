//! Frame Tests
//!
//! Opcode table, status classification and frame constructors.

use binhammer::protocol::{Opcode, RequestFrame, ResponseFrame, Status};
use binhammer::Operation;

#[test]
fn test_opcode_wire_codes() {
    assert_eq!(Opcode::Get as u8, 0x00);
    assert_eq!(Opcode::Set as u8, 0x01);
    assert_eq!(Opcode::Add as u8, 0x02);
    assert_eq!(Opcode::Delete as u8, 0x04);
    assert_eq!(Opcode::GetQ as u8, 0x09);
    assert_eq!(Opcode::Noop as u8, 0x0a);
    assert_eq!(Opcode::AddQ as u8, 0x12);
    assert_eq!(Opcode::DeleteQ as u8, 0x14);
}

#[test]
fn test_opcode_from_u8() {
    for opcode in [
        Opcode::Get, Opcode::Set, Opcode::Add, Opcode::Delete,
        Opcode::GetQ, Opcode::Noop, Opcode::SetQ, Opcode::AddQ, Opcode::DeleteQ,
    ] {
        assert_eq!(Opcode::from_u8(opcode as u8), Some(opcode));
    }
    assert_eq!(Opcode::from_u8(0x03), None);
    assert_eq!(Opcode::from_u8(0xFF), None);
}

#[test]
fn test_quiet_variants() {
    assert_eq!(Opcode::Get.quiet(), Opcode::GetQ);
    assert_eq!(Opcode::Add.quiet(), Opcode::AddQ);
    assert_eq!(Opcode::Delete.quiet(), Opcode::DeleteQ);
    assert_eq!(Opcode::Noop.quiet(), Opcode::Noop);
    assert!(Opcode::SetQ.is_quiet());
    assert!(!Opcode::Set.is_quiet());
    assert!(!Opcode::Noop.is_quiet());
}

#[test]
fn test_operation_opcodes() {
    assert_eq!(Operation::Fetch.opcode(false), Opcode::Get);
    assert_eq!(Operation::Insert.opcode(false), Opcode::Add);
    assert_eq!(Operation::Delete.opcode(false), Opcode::Delete);
    assert_eq!(Operation::Fetch.opcode(true), Opcode::GetQ);
    assert_eq!(Operation::Insert.opcode(true), Opcode::AddQ);
    assert_eq!(Operation::Delete.opcode(true), Opcode::DeleteQ);
}

#[test]
fn test_status_codes() {
    assert_eq!(Status::from_u16(0), Status::NoError);
    assert_eq!(Status::from_u16(1), Status::KeyNotFound);
    assert_eq!(Status::from_u16(2), Status::KeyExists);
    assert_eq!(Status::from_u16(0x82), Status::OutOfMemory);
    assert_eq!(Status::from_u16(0x1234), Status::Other(0x1234));
    assert_eq!(Status::Other(0x1234).as_u16(), 0x1234);
    assert_eq!(Status::NotStored.as_u16(), 5);
    assert!(Status::NoError.is_success());
    assert!(!Status::KeyExists.is_success());
}

#[test]
fn test_store_extras_layout() {
    let request = RequestFrame::store(Opcode::Add, &b"k"[..], 0xAABBCCDD, 0x11223344, &b""[..]);
    assert_eq!(
        &request.extras[..],
        &[0xAA, 0xBB, 0xCC, 0xDD, 0x11, 0x22, 0x33, 0x44]
    );
    assert_eq!(request.total_body_len(), 9);
}

#[test]
fn test_fetch_and_delete_have_no_extras() {
    assert!(RequestFrame::get(&b"k"[..]).extras.is_empty());
    assert!(RequestFrame::delete(&b"k"[..]).extras.is_empty());
    assert!(RequestFrame::get(&b"k"[..]).body.is_empty());
}

#[test]
fn test_response_builders() {
    let response = ResponseFrame::new(Opcode::Add as u8, Status::KeyExists)
        .with_opaque(9)
        .with_body(&b"Data exists for key."[..]);
    assert_eq!(response.status, 2);
    assert_eq!(response.opaque, 9);
    assert_eq!(response.total_body_len(), 20);
}
