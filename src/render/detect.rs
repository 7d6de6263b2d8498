use crate::engine::{
    DETECT_INTERVAL_MS, DETECT_LOOP_COUNT, Engine, EngineSession, EngineSettings,
};
use crate::foundation::core::{FRAMES_PER_CHUNK, MILLIS_PER_SECOND, ms_to_frames};
use crate::foundation::error::Nsf2WavResult;
use crate::options::RenderOptions;

/// How the final frame count was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectOutcome {
    /// Detection was skipped; the candidate length is final.
    Forced,
    /// The engine found the loop point.
    Detected {
        /// Frames skipped when the fade began.
        loop_frames: u64,
        /// Fade time announced by the engine.
        fade_ms: i32,
        /// Safety ceiling handed to the engine.
        stop_after_secs: u32,
    },
    /// No loop was found within the candidate budget.
    Fallback {
        /// Frames skipped before giving up.
        skipped_frames: u64,
    },
}

/// Result of [`detect`].
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Final number of frames to render.
    pub total_frames: u64,
    /// How `total_frames` was obtained.
    pub outcome: DetectOutcome,
    /// Engine settings for the real render pass.
    pub settings: EngineSettings,
}

/// Naive render length: `floor((length_ms + fade_ms) * sample_rate / 1000)`.
pub fn candidate_frames(length_ms: i32, fade_ms: i32, sample_rate: f64) -> u64 {
    ms_to_frames(i64::from(length_ms) + i64::from(fade_ms), sample_rate)
}

/// `settings` with loop detection switched on.
pub fn detection_settings(settings: &EngineSettings) -> EngineSettings {
    EngineSettings {
        auto_detect: true,
        loop_count: DETECT_LOOP_COUNT,
        detect_interval_ms: DETECT_INTERVAL_MS,
        ..settings.clone()
    }
}

/// Hard stop bound in whole seconds.
///
/// The fade is divided by 1000 before it joins the frame count; that mix of units is
/// kept as-is.
pub fn stop_after_secs(loop_frames: u64, fade_ms: i32, sample_rate: f64) -> u32 {
    let fade = u64::try_from(fade_ms).unwrap_or(0) / MILLIS_PER_SECOND;
    let secs = ((loop_frames + fade) as f64 / sample_rate).ceil();
    secs.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Dry-run the session to find the loop point and settle the frame count.
///
/// The session must already be set up with [`detection_settings`] unless
/// `options.force_length` is set. `base` holds the settings the real pass starts from; the
/// returned settings have detection disabled when a loop was found.
#[tracing::instrument(
    skip_all,
    fields(candidate = tracing::field::Empty, force = options.force_length)
)]
pub fn detect<E: Engine>(
    session: &mut EngineSession<E>,
    base: &EngineSettings,
    options: &RenderOptions,
) -> Nsf2WavResult<Detection> {
    let sample_rate = options.sample_rate;
    let candidate = candidate_frames(options.length_ms, options.fade_ms, sample_rate);
    tracing::Span::current().record("candidate", candidate);
    let mut settings = base.clone();

    if options.force_length {
        return Ok(Detection {
            total_frames: candidate,
            outcome: DetectOutcome::Forced,
            settings,
        });
    }

    let mut budget = candidate;
    while budget > 0 && !session.progress().fading {
        let chunk = budget.min(FRAMES_PER_CHUNK as u64);
        session.skip(chunk as u32)?;
        budget -= chunk;
    }

    let progress = session.progress();
    if !progress.loop_detected {
        tracing::debug!(skipped = progress.total_frames, "no loop detected");
        return Ok(Detection {
            total_frames: candidate,
            outcome: DetectOutcome::Fallback {
                skipped_frames: progress.total_frames,
            },
            settings,
        });
    }

    let total_frames =
        progress.total_frames + ms_to_frames(progress.fade_time_ms.into(), sample_rate);
    let stop = stop_after_secs(progress.total_frames, progress.fade_time_ms, sample_rate);
    settings.auto_detect = false;
    settings.loop_count = 0;
    settings.stop_after_secs = Some(stop);
    if options.trigger {
        settings.play_time_ms = settings.play_time_ms.saturating_add(progress.fade_time_ms);
        settings.fade_time_ms = 0;
    }
    tracing::info!(total_frames, stop_after_secs = stop, "Detected loop time");

    Ok(Detection {
        total_frames,
        outcome: DetectOutcome::Detected {
            loop_frames: progress.total_frames,
            fade_ms: progress.fade_time_ms,
            stop_after_secs: stop,
        },
        settings,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/detect.rs"]
mod tests;
