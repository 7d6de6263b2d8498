use super::*;

#[test]
fn header_layout_is_canonical() {
    let h = WavHeader::for_frames(44_100, ChannelLayout::Mono, 44_100.0).unwrap();
    assert_eq!(h.data_len, 88_200);
    let b = h.encode().unwrap();
    assert_eq!(b.len(), WAV_HEADER_LEN);
    assert_eq!(&b[0..4], b"RIFF");
    assert_eq!(u32::from_le_bytes(b[4..8].try_into().unwrap()), 88_200 + 36);
    assert_eq!(&b[8..16], b"WAVEfmt ");
    assert_eq!(u32::from_le_bytes(b[16..20].try_into().unwrap()), 16);
    assert_eq!(u16::from_le_bytes([b[20], b[21]]), 1);
    assert_eq!(u16::from_le_bytes([b[22], b[23]]), 1);
    assert_eq!(u32::from_le_bytes(b[24..28].try_into().unwrap()), 44_100);
    assert_eq!(u32::from_le_bytes(b[28..32].try_into().unwrap()), 88_200);
    assert_eq!(u16::from_le_bytes([b[32], b[33]]), 2);
    assert_eq!(u16::from_le_bytes([b[34], b[35]]), 16);
    assert_eq!(&b[36..40], b"data");
    assert_eq!(u32::from_le_bytes(b[40..44].try_into().unwrap()), 88_200);
}

#[test]
fn stereo_header_decodes_back() {
    let h = WavHeader::for_frames(1_000, ChannelLayout::Stereo, 48_000.7).unwrap();
    assert_eq!(h.sample_rate, 48_000);
    assert_eq!(h.data_len, 4_000);
    let back = WavHeader::decode(&h.encode().unwrap()).unwrap();
    assert_eq!(back, h);
    assert_eq!(back.total_frames(), 1_000);
}

#[test]
fn corrupted_header_fails_to_decode() {
    let mut b = WavHeader::for_frames(10, ChannelLayout::Mono, 8_000.0)
        .unwrap()
        .encode()
        .unwrap();
    b[34] = 8;
    assert!(WavHeader::decode(&b).is_err());
    assert!(WavHeader::decode(&b[..20]).is_err());
}

#[test]
fn oversized_payload_is_a_validation_error() {
    let err = WavHeader::for_frames(u64::from(u32::MAX), ChannelLayout::Stereo, 48_000.0)
        .unwrap_err();
    assert!(matches!(err, Nsf2WavError::Validation(_)));
    // Payload fits but RIFF size would not.
    let frames = (u64::from(u32::MAX) - 30) / 2;
    assert!(WavHeader::for_frames(frames, ChannelLayout::Mono, 48_000.0).is_err());
}

#[test]
fn writer_streams_header_then_payload() {
    let mut w = WavWriter::new(Vec::new());
    w.write_header(2, ChannelLayout::Stereo, 8_000.0).unwrap();
    w.write_frames(&[1, 0, 2, 0], 1).unwrap();
    w.write_frames(&[3, 0, 4, 0], 1).unwrap();
    w.finish().unwrap();
    let out = w.into_inner();
    assert_eq!(out.len(), WAV_HEADER_LEN + 8);
    assert_eq!(&out[WAV_HEADER_LEN..], &[1, 0, 2, 0, 3, 0, 4, 0]);
    assert_eq!(WavHeader::decode(&out).unwrap().data_len, 8);
}

#[test]
fn writer_enforces_ordering_and_sizes() {
    let mut w = WavWriter::new(Vec::new());
    assert!(w.write_frames(&[0, 0], 1).is_err());
    w.write_header(1, ChannelLayout::Mono, 8_000.0).unwrap();
    assert!(w.write_header(1, ChannelLayout::Mono, 8_000.0).is_err());
    assert!(w.write_frames(&[0, 0, 0], 1).is_err());
    assert!(w.write_frames(&[0, 0, 0, 0], 2).is_err());
    w.write_frames(&[0, 0], 1).unwrap();
    assert!(w.write_frames(&[0, 0], 1).is_err());
    assert_eq!(w.written_frames(), 1);
}

#[test]
fn finish_rejects_a_short_payload() {
    let mut w = WavWriter::new(Vec::new());
    w.write_header(3, ChannelLayout::Mono, 8_000.0).unwrap();
    w.write_frames(&[0, 0], 1).unwrap();
    assert!(matches!(w.finish(), Err(Nsf2WavError::Validation(_))));
}

struct Full;

impl std::io::Write for Full {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Ok(0)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn short_write_is_an_io_error() {
    let mut w = WavWriter::new(Full);
    let err = w.write_header(1, ChannelLayout::Mono, 8_000.0).unwrap_err();
    assert!(matches!(err, Nsf2WavError::Io { .. }));
    assert!(w.header().is_none());
}

#[test]
fn sink_impl_delegates_to_writer() {
    let mut w = WavWriter::new(Vec::new());
    PcmSink::begin(
        &mut w,
        SinkConfig {
            total_frames: 1,
            channels: ChannelLayout::Mono,
            sample_rate: 22_050.0,
        },
    )
    .unwrap();
    w.push_frames(&[9, 0], 1).unwrap();
    PcmSink::end(&mut w).unwrap();
    assert_eq!(w.header().unwrap().sample_rate, 22_050);
}
