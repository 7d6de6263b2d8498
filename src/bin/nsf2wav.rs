use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use nsf2wav::foundation::core::{DEFAULT_FADETIME_MS, DEFAULT_PLAYTIME_MS, DEFAULT_SAMPLE_RATE};
use nsf2wav::foundation::error::EXIT_USAGE;
use nsf2wav::{
    ChannelDirective, ChannelLayout, MaskCompiler, Nsf2WavError, Nsf2WavResult, PlaylistEntry,
    RenderLoop, RenderOptions, SilentEngine, Source, SourceFormat, TrackListing, TrackSelection,
    WavWriter,
};

#[derive(Parser, Debug)]
#[command(name = "nsf2wav", version, about = "Render NSF/NSFe music to 16-bit PCM WAV")]
struct Cli {
    /// Source file, or a NEZ M3U entry (`path::NSF,track,title,time,loop,fade`).
    source: String,

    /// Output WAV path. Without it, the source's tracks are listed.
    output: Option<PathBuf>,

    /// Output channels (1 or 2).
    #[arg(short = 'c', long = "channels", default_value_t = 1)]
    channels: u32,

    /// Fade time in ms when the source does not carry one.
    #[arg(
        short = 'f',
        long = "fade_ms",
        default_value_t = DEFAULT_FADETIME_MS,
        allow_negative_numbers = true
    )]
    fade_ms: i32,

    /// Play time in ms when the source does not carry one.
    #[arg(
        short = 'l',
        long = "length_ms",
        default_value_t = DEFAULT_PLAYTIME_MS,
        allow_negative_numbers = true
    )]
    length_ms: i32,

    /// Render exactly length + fade, without loop detection.
    #[arg(short = 'y', long = "length_force")]
    length_force: bool,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Output sample rate in Hz.
    #[arg(short = 's', long = "samplerate", default_value_t = DEFAULT_SAMPLE_RATE)]
    samplerate: f64,

    /// Track to render (1-based; ignored for playlist entries).
    #[arg(short = 't', long = "track", default_value_t = 1, allow_negative_numbers = true)]
    track: i32,

    /// Add a channel to the working mask (repeatable).
    #[arg(short = 'm', long = "mask", value_name = "CHANNEL", action = ArgAction::Append)]
    mask: Vec<u32>,

    /// Complement the working mask (repeatable).
    #[arg(
        short = 'r',
        long = "mask_reverse",
        action = ArgAction::Append,
        num_args = 0,
        default_missing_value = "true"
    )]
    mask_reverse: Vec<bool>,

    /// Turn the working mask into the mute set and start a new mask (repeatable).
    #[arg(
        short = 'u',
        long = "mute",
        action = ArgAction::Append,
        num_args = 0,
        default_missing_value = "true"
    )]
    mute: Vec<bool>,

    /// Render trigger waveforms instead of the mix.
    #[arg(short = 'w', long = "trigger")]
    trigger: bool,

    /// Print the track listing as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(serde::Serialize)]
struct SourceInfo<'a> {
    format: SourceFormat,
    title: &'a str,
    artist: &'a str,
    copyright: &'a str,
    ripper: &'a str,
    playlist_mode: bool,
    tracks: Vec<TrackListing>,
}

fn main() -> ExitCode {
    let matches = match Cli::command().try_get_matches() {
        Ok(m) => m,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    init_logging(cli.quiet);

    match run(&cli, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if matches!(err, Nsf2WavError::Usage(_)) {
                eprintln!("{}", Cli::command().render_usage());
            }
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn run(cli: &Cli, matches: &ArgMatches) -> Nsf2WavResult<()> {
    let masks = MaskCompiler::compile(directives(matches))?;
    let options = RenderOptions {
        length_ms: cli.length_ms,
        fade_ms: cli.fade_ms,
        sample_rate: cli.samplerate,
        channels: ChannelLayout::try_from(cli.channels)?,
        track: cli.track,
        force_length: cli.length_force,
        trigger: cli.trigger,
        quiet: cli.quiet,
        ..RenderOptions::default()
    }
    .with_masks(masks);
    options.validate()?;
    if cli.output.is_some() && !PlaylistEntry::is_entry(&cli.source) {
        TrackSelection::validate_requested(cli.track)?;
    }

    let source = Source::load(&cli.source)?;
    match &cli.output {
        None => print_info(&source, cli),
        Some(path) => render(&source, options, path),
    }
}

/// Mask directives in command-line order.
fn directives(matches: &ArgMatches) -> Vec<ChannelDirective> {
    let mut ordered: Vec<(usize, ChannelDirective)> = Vec::new();
    if let (Some(idx), Some(channels)) =
        (matches.indices_of("mask"), matches.get_many::<u32>("mask"))
    {
        ordered.extend(idx.zip(channels.map(|&c| ChannelDirective::Select(c))));
    }
    for (id, directive) in [
        ("mask_reverse", ChannelDirective::Invert),
        ("mute", ChannelDirective::CommitMute),
    ] {
        if let Some(idx) = matches.indices_of(id) {
            ordered.extend(idx.map(|i| (i, directive)));
        }
    }
    ordered.sort_by_key(|&(i, _)| i);
    ordered.into_iter().map(|(_, d)| d).collect()
}

fn print_info(source: &Source, cli: &Cli) -> Nsf2WavResult<()> {
    if cli.quiet {
        return Ok(());
    }
    let tracks = source.listing();
    if cli.json {
        let info = SourceInfo {
            format: source.format,
            title: &source.title,
            artist: &source.artist,
            copyright: &source.copyright,
            ripper: &source.ripper,
            playlist_mode: source.is_playlist_mode(),
            tracks,
        };
        let json = serde_json::to_string_pretty(&info).context("encoding source info")?;
        println!("{json}");
        return Ok(());
    }
    println!("Title: {}", source.title);
    println!("Artist: {}", source.artist);
    println!("Copyright: {}", source.copyright);
    println!("Ripper: {}", source.ripper);
    for t in tracks {
        println!("Track {:03}: {}", t.number, t.label);
    }
    Ok(())
}

fn render(source: &Source, options: RenderOptions, path: &Path) -> Nsf2WavResult<()> {
    let quiet = options.quiet;
    let mut render_loop = RenderLoop::new(SilentEngine::new());
    let plan = render_loop.resolve(source, options)?;
    if !quiet {
        println!("Track {:03}: {}", plan.track.number, plan.track.label);
        println!("  length: {} ms", plan.options.length_ms);
        println!("    fade: {} ms", plan.options.fade_ms);
    }

    let report = render_loop.execute(source, plan, |_| {
        let file = File::create(path)
            .map_err(|e| Nsf2WavError::io(format!("creating '{}'", path.display()), e))?;
        Ok(WavWriter::new(BufWriter::new(file)))
    })?;
    tracing::debug!(
        frames = report.total_frames,
        chunks = report.chunks,
        outcome = ?report.outcome,
        path = %path.display(),
        "render finished"
    );
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/bin/nsf2wav.rs"]
mod tests;
