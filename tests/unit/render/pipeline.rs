use super::*;
use crate::encode::InMemorySink;
use crate::engine::{EngineCall, ScriptedEngine, SessionState};
use crate::fixtures::{NsfeBuilder, nsf_image};
use crate::foundation::core::ChannelLayout;
use crate::foundation::bytes::FieldReader;
use crate::options::mask::FULL_GAIN;
use crate::options::{ChannelDirective, MaskCompiler};

fn plain() -> Source {
    Source::parse(&nsf_image(3, 1, "Game", "", "")).unwrap()
}

fn render(
    engine: ScriptedEngine,
    source: &Source,
    options: RenderOptions,
) -> (RenderReport, InMemorySink, ScriptedEngine) {
    let mut rl = RenderLoop::new(engine);
    let plan = rl.resolve(source, options).unwrap();
    let mut sink = InMemorySink::new();
    let sink_ref = &mut sink;
    let report = rl.execute(source, plan, move |_| Ok(sink_ref)).unwrap();
    assert_eq!(rl.phase(), RenderPhase::Done);
    assert_eq!(rl.session().state(), SessionState::Exhausted);
    (report, sink, rl.into_engine())
}

impl PcmSink for &mut InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> Nsf2WavResult<()> {
        (**self).begin(cfg)
    }

    fn push_frames(&mut self, bytes: &[u8], frames: usize) -> Nsf2WavResult<()> {
        (**self).push_frames(bytes, frames)
    }

    fn end(&mut self) -> Nsf2WavResult<()> {
        (**self).end()
    }
}

#[test]
fn forced_render_streams_exact_frames_in_chunks() {
    let opts = RenderOptions {
        force_length: true,
        length_ms: 1_000,
        fade_ms: 0,
        sample_rate: 10_000.0,
        channels: ChannelLayout::Stereo,
        ..RenderOptions::default()
    };
    let (report, sink, engine) = render(ScriptedEngine::new(0), &plain(), opts);
    assert_eq!(report.total_frames, 10_000);
    assert_eq!(report.outcome, DetectOutcome::Forced);
    assert_eq!(report.chunks, 3);
    assert_eq!(sink.frames(), 10_000);
    assert_eq!(
        sink.chunks().iter().map(Vec::len).collect::<Vec<_>>(),
        vec![4_096 * 4, 4_096 * 4, 1_808 * 4]
    );
    assert_eq!(sink.config().unwrap().total_frames, 10_000);
    assert!(sink.is_ended());
    assert_eq!(engine.rendered_frames(), 10_000);

    // The ramp continues across chunk boundaries.
    let payload = sink.payload();
    let mut r = FieldReader::new(&payload);
    for frame in 0..10_000u32 {
        let l = r.i16_le("l").unwrap();
        let rr = r.i16_le("r").unwrap();
        assert_eq!(l, frame as u16 as i16);
        assert_eq!(l, rr);
    }
}

#[test]
fn detected_loop_sets_the_header_length() {
    let opts = RenderOptions {
        length_ms: 60_000,
        fade_ms: 1_000,
        sample_rate: 8_000.0,
        ..RenderOptions::default()
    };
    let engine = ScriptedEngine::new(20_000).with_loop(500);
    let (report, sink, engine) = render(engine, &plain(), opts);
    assert_eq!(report.total_frames, 20_000 + 4_000);
    assert_eq!(sink.config().unwrap().total_frames, 24_000);
    assert_eq!(sink.frames(), 24_000);
    let final_settings = engine.settings().unwrap();
    assert!(!final_settings.auto_detect);
    assert_eq!(final_settings.stop_after_secs, Some(3));
}

#[test]
fn configuration_follows_detection_then_resets() {
    let masks = MaskCompiler::compile([
        ChannelDirective::Select(3),
        ChannelDirective::CommitMute,
        ChannelDirective::Select(0),
    ])
    .unwrap();
    let opts = RenderOptions {
        force_length: true,
        length_ms: 1,
        fade_ms: 0,
        sample_rate: 1_000.0,
        track: 2,
        trigger: true,
        ..RenderOptions::default()
    }
    .with_masks(masks);
    let (report, _sink, engine) = render(ScriptedEngine::new(0), &plain(), opts);
    assert_eq!(report.track.song_index, 1);
    assert_eq!(report.total_frames, 1);

    let calls = engine.calls();
    assert_eq!(calls[4], EngineCall::Song(1));
    let tail: Vec<_> = calls[6..].to_vec();
    assert_eq!(
        tail,
        vec![EngineCall::Configure, EngineCall::Reset, EngineCall::Render(1)]
    );

    let s = engine.settings().unwrap();
    assert!(s.mask.contains(0) && !s.mask.contains(3));
    assert_eq!(s.channel_volume[3], 0);
    assert_eq!(s.channel_volume[0], FULL_GAIN);
    assert!(s.trigger);
    assert_eq!(s.mixing, Mixing::linear());
}

#[test]
fn short_engine_chunks_are_padded_with_silence() {
    let opts = RenderOptions {
        force_length: true,
        length_ms: 1_000,
        fade_ms: 0,
        sample_rate: 5_000.0,
        ..RenderOptions::default()
    };
    let engine = ScriptedEngine::new(0).with_short_render(1_000);
    let (_, sink, _) = render(engine, &plain(), opts);
    assert_eq!(sink.frames(), 5_000);
    let first = &sink.chunks()[0];
    assert_eq!(first.len(), 4_096 * 2);
    assert_eq!(&first[1_998..2_000], &(999i16).to_le_bytes());
    assert!(first[2_000..].iter().all(|&b| b == 0));
}

#[test]
fn load_failure_never_opens_the_sink() {
    let mut rl = RenderLoop::new(ScriptedEngine::new(0).failing_load("corrupt"));
    let src = plain();
    let plan = rl.resolve(&src, RenderOptions::default()).unwrap();
    let mut opened = false;
    let err = rl
        .execute(&src, plan, |_| {
            opened = true;
            Ok(InMemorySink::new())
        })
        .unwrap_err();
    assert!(matches!(err, Nsf2WavError::Input(_)));
    assert!(!opened);
    assert_eq!(rl.phase(), RenderPhase::Failed);
}

#[test]
fn failed_loop_rejects_further_calls() {
    let mut rl = RenderLoop::new(ScriptedEngine::new(0));
    let src = plain();
    let bad = RenderOptions {
        track: 0,
        ..RenderOptions::default()
    };
    assert!(matches!(rl.resolve(&src, bad), Err(Nsf2WavError::Usage(_))));
    assert_eq!(rl.phase(), RenderPhase::Failed);
    assert!(matches!(
        rl.resolve(&src, RenderOptions::default()),
        Err(Nsf2WavError::Engine(_))
    ));
}

#[test]
fn sink_errors_fail_the_loop() {
    let mut rl = RenderLoop::new(ScriptedEngine::new(0));
    let src = plain();
    let plan = rl
        .resolve(
            &src,
            RenderOptions {
                force_length: true,
                length_ms: 10,
                fade_ms: 0,
                sample_rate: 1_000.0,
                ..RenderOptions::default()
            },
        )
        .unwrap();
    let err = rl
        .execute(&src, plan, |_| -> Nsf2WavResult<InMemorySink> {
            Err(Nsf2WavError::io(
                "creating out.wav",
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        })
        .unwrap_err();
    assert!(matches!(err, Nsf2WavError::Io { .. }));
    assert_eq!(rl.phase(), RenderPhase::Failed);
}

#[test]
fn playlist_track_is_reported_with_playlist_order() {
    let data = NsfeBuilder::new()
        .info_and_data(3, 0)
        .labels(&["a", "b", "c"])
        .playlist(&[2, 1, 0])
        .build();
    let src = Source::parse(&data).unwrap();
    let opts = RenderOptions {
        force_length: true,
        length_ms: 1,
        fade_ms: 0,
        sample_rate: 1_000.0,
        track: 1,
        ..RenderOptions::default()
    };
    let (report, _, engine) = render(ScriptedEngine::new(0), &src, opts);
    assert_eq!(report.track.label, "c");
    assert!(engine.calls().contains(&EngineCall::Song(2)));
}

#[test]
fn report_carries_durations_after_detection() {
    let opts = RenderOptions {
        length_ms: 10_000,
        fade_ms: 2_000,
        sample_rate: 1_000.0,
        trigger: true,
        ..RenderOptions::default()
    };
    let looping = || ScriptedEngine::new(500).with_loop(1_500);
    let (report, sink, _) = render(looping(), &plain(), opts.clone());
    assert!(matches!(report.outcome, DetectOutcome::Detected { .. }));
    assert_eq!(report.total_frames, 2_000);
    assert_eq!(report.length_ms, 11_500);
    assert_eq!(report.fade_ms, 0);
    assert_eq!(sink.frames(), 2_000);

    let plain_opts = RenderOptions {
        trigger: false,
        ..opts
    };
    let (report, _, _) = render(looping(), &plain(), plain_opts);
    assert_eq!(report.length_ms, 10_000);
    assert_eq!(report.fade_ms, 2_000);
}
