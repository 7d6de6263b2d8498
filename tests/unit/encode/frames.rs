use super::*;
use crate::foundation::bytes::FieldReader;

fn decode(bytes: &[u8]) -> Vec<i16> {
    let mut r = FieldReader::new(bytes);
    let mut out = Vec::new();
    while r.remaining() > 0 {
        out.push(r.i16_le("sample").unwrap());
    }
    out
}

#[test]
fn packs_little_endian() {
    let mut out = [0u8; 4];
    let n = encode_frames(&[0x0102, -1], ChannelLayout::Stereo, &mut out).unwrap();
    assert_eq!(n, 4);
    assert_eq!(out, [0x02, 0x01, 0xFF, 0xFF]);
}

#[test]
fn extremes_survive_decoding() {
    let samples = [i16::MIN, -1, 0, 1, i16::MAX, 0x00FF, -256];
    let mut out = [0u8; 14];
    encode_frames(&samples, ChannelLayout::Mono, &mut out).unwrap();
    assert_eq!(decode(&out), samples);
}

#[test]
fn partial_frames_are_rejected() {
    let mut out = [0u8; 6];
    let err = encode_frames(&[1, 2, 3], ChannelLayout::Stereo, &mut out).unwrap_err();
    assert!(matches!(err, Nsf2WavError::Validation(_)));
}

#[test]
fn undersized_output_is_rejected() {
    let mut out = [0u8; 3];
    assert!(encode_frames(&[1, 2], ChannelLayout::Mono, &mut out).is_err());
}

#[test]
fn frame_buffer_reuses_one_allocation() {
    let mut buf = FrameBuffer::new(ChannelLayout::Stereo);
    assert_eq!(buf.capacity_frames(), FRAMES_PER_CHUNK);
    let first = buf.samples_mut(FRAMES_PER_CHUNK).unwrap().as_ptr();
    buf.samples_mut(3).unwrap().copy_from_slice(&[1, 2, 3, 4, 5, 6]);
    let bytes = buf.encode(3).unwrap();
    assert_eq!(bytes.len(), 12);
    assert_eq!(decode(bytes), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(buf.samples_mut(1).unwrap().as_ptr(), first);
}

#[test]
fn frame_buffer_is_bounds_checked() {
    let mut buf = FrameBuffer::new(ChannelLayout::Mono);
    assert!(buf.samples_mut(FRAMES_PER_CHUNK + 1).is_err());
    assert!(buf.encode(FRAMES_PER_CHUNK + 1).is_err());
    assert!(buf.silence(3, 1).is_err());
}

#[test]
fn silence_zeroes_a_frame_range() {
    let mut buf = FrameBuffer::new(ChannelLayout::Stereo);
    buf.samples_mut(3).unwrap().fill(7);
    buf.silence(1, 3).unwrap();
    assert_eq!(buf.samples_mut(3).unwrap(), &[7, 7, 0, 0, 0, 0]);
}
