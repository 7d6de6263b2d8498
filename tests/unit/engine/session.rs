use super::*;
use crate::engine::{EngineCall, ScriptedEngine};
use crate::fixtures::nsf_image;

fn source() -> Source {
    Source::parse(&nsf_image(2, 1, "Game", "", "")).unwrap()
}

fn ready(engine: ScriptedEngine) -> EngineSession<ScriptedEngine> {
    let mut session = EngineSession::new(engine);
    session
        .setup(
            &source(),
            &EngineSettings::default(),
            44_100.0,
            ChannelLayout::Stereo,
            1,
        )
        .unwrap();
    session
}

#[test]
fn setup_configures_before_loading_then_resets() {
    let session = ready(ScriptedEngine::new(100));
    assert_eq!(session.state(), SessionState::Configured);
    assert_eq!(
        session.engine().calls(),
        &[
            EngineCall::Configure,
            EngineCall::Load,
            EngineCall::SampleRate(44_100.0),
            EngineCall::Channels(ChannelLayout::Stereo),
            EngineCall::Song(1),
            EngineCall::Reset,
        ]
    );
}

#[test]
fn load_failure_is_an_input_error_with_engine_message() {
    let mut session = EngineSession::new(ScriptedEngine::new(0).failing_load("bad bank"));
    let err = session
        .setup(
            &source(),
            &EngineSettings::default(),
            48_000.0,
            ChannelLayout::Mono,
            0,
        )
        .unwrap_err();
    match err {
        Nsf2WavError::Input(msg) => assert_eq!(msg, "bad bank"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Unconfigured);
}

#[test]
fn invalid_settings_never_reach_the_engine() {
    let mut session = EngineSession::new(ScriptedEngine::new(0));
    let bad = EngineSettings {
        auto_detect: true,
        loop_count: 0,
        ..EngineSettings::default()
    };
    assert!(
        session
            .setup(&source(), &bad, 48_000.0, ChannelLayout::Mono, 0)
            .is_err()
    );
    assert!(session.engine().calls().is_empty());
}

#[test]
fn render_before_setup_is_rejected() {
    let mut session = EngineSession::new(ScriptedEngine::new(0));
    let mut buf = [0i16; 8];
    let err = session.render(&mut buf, 8).unwrap_err();
    assert!(matches!(err, Nsf2WavError::Engine(_)));
}

#[test]
fn configuration_is_frozen_once_rendering() {
    let mut session = ready(ScriptedEngine::new(100));
    session.skip(10).unwrap();
    session.reconfigure(&EngineSettings::default()).unwrap();
    let mut buf = [0i16; 8];
    session.render(&mut buf, 4).unwrap();
    assert_eq!(session.state(), SessionState::Rendering);
    assert!(session.reconfigure(&EngineSettings::default()).is_err());
    assert!(session.skip(1).is_err());
    session.finish().unwrap();
    assert_eq!(session.state(), SessionState::Exhausted);
    assert!(session.render(&mut buf, 4).is_err());
}

#[test]
fn reconfigure_restarts_progress() {
    let mut session = ready(ScriptedEngine::new(100));
    assert_eq!(session.skip(40).unwrap().total_frames, 40);
    session.reconfigure(&EngineSettings::default()).unwrap();
    assert_eq!(session.progress().total_frames, 0);
    assert_eq!(session.state(), SessionState::Configured);
}
