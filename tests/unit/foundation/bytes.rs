use super::*;

#[test]
fn writer_emits_least_significant_byte_first() {
    let mut buf = [0u8; 12];
    let mut w = FieldWriter::new(&mut buf);
    w.tag(b"RIFF").unwrap();
    w.u32_le(0x1234_5678).unwrap();
    w.u16_le(0xABCD).unwrap();
    w.i16_le(-2).unwrap();
    assert_eq!(w.position(), 12);
    assert_eq!(
        buf,
        [b'R', b'I', b'F', b'F', 0x78, 0x56, 0x34, 0x12, 0xCD, 0xAB, 0xFE, 0xFF]
    );
}

#[test]
fn writer_refuses_to_overrun() {
    let mut buf = [0u8; 3];
    let mut w = FieldWriter::new(&mut buf);
    w.u16_le(1).unwrap();
    let err = w.u16_le(2).unwrap_err();
    assert!(matches!(err, Nsf2WavError::Validation(_)));
    assert_eq!(w.position(), 2);
}

#[test]
fn reader_decodes_fields_in_order() {
    let data = [0x01, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF, b'a', b'b', 0, b'c'];
    let mut r = FieldReader::new(&data);
    assert_eq!(r.u8("a").unwrap(), 1);
    assert_eq!(r.u16_le("b").unwrap(), 0x1234);
    assert_eq!(r.i32_le("c").unwrap(), -1);
    assert_eq!(r.cstr(), "ab");
    assert_eq!(r.cstr(), "c");
    assert_eq!(r.remaining(), 0);
}

#[test]
fn reader_reports_truncation_with_field_name() {
    let mut r = FieldReader::new(&[1, 2]);
    let err = r.u32_le("chunk length").unwrap_err();
    assert!(matches!(err, Nsf2WavError::Input(_)));
    assert!(err.to_string().contains("chunk length"));
    assert_eq!(r.position(), 0);
}

#[test]
fn padded_str_stops_at_nul() {
    let mut field = [0u8; 32];
    field[..5].copy_from_slice(b"Title");
    assert_eq!(padded_str(&field), "Title");
    assert_eq!(padded_str(b"full"), "full");
}

#[test]
fn reader_decodes_three_byte_lengths() {
    let mut r = FieldReader::new(&[0x56, 0x34, 0x12, 0xAA]);
    assert_eq!(r.u24_le("program length").unwrap(), 0x12_3456);
    assert_eq!(r.position(), 3);
    assert!(r.u24_le("program length").is_err());
    assert_eq!(r.position(), 3);
}

#[test]
fn i32_array_ignores_trailing_partial_value() {
    let mut body = Vec::new();
    body.extend_from_slice(&1000i32.to_le_bytes());
    body.extend_from_slice(&(-1i32).to_le_bytes());
    body.extend_from_slice(&[0x01, 0x02]);
    assert_eq!(i32_array_le(&body), vec![1000, -1]);
    assert!(i32_array_le(&[]).is_empty());
}

#[test]
fn rest_and_cstr_share_the_cursor() {
    let mut r = FieldReader::new(b"ab\0tail");
    assert_eq!(r.cstr(), "ab");
    assert_eq!(r.rest(), b"tail");
    assert_eq!(r.remaining(), 0);
    assert_eq!(r.cstr(), "");
}
