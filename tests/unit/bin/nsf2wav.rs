use super::*;
use nsf2wav::ChannelSet;

fn parse(flags: &[&str]) -> ArgMatches {
    let mut argv = vec!["nsf2wav"];
    argv.extend_from_slice(flags);
    argv.push("game.nsf");
    Cli::command().try_get_matches_from(argv).unwrap()
}

fn set(channels: &[u32]) -> ChannelSet {
    channels.iter().copied().collect()
}

fn masks(flags: &[&str]) -> nsf2wav::ChannelMasks {
    MaskCompiler::compile(directives(&parse(flags))).unwrap()
}

#[test]
fn directives_follow_command_line_order() {
    use ChannelDirective::*;
    assert_eq!(
        directives(&parse(&["-m", "0", "-m", "1", "-u", "-m", "3"])),
        vec![Select(0), Select(1), CommitMute, Select(3)]
    );
    assert_eq!(
        directives(&parse(&["-ru", "-m", "1"])),
        vec![Invert, CommitMute, Select(1)]
    );
    assert_eq!(
        directives(&parse(&["--mask_reverse", "--mask", "2", "--mute"])),
        vec![Invert, Select(2), CommitMute]
    );
    assert!(directives(&parse(&[])).is_empty());
}

#[test]
fn commit_mute_freezes_earlier_selections() {
    let m = masks(&["-m", "0", "-m", "1", "-u", "-m", "3"]);
    assert_eq!(m.mute, set(&[0, 1]));
    assert_eq!(m.mask, set(&[3]));
}

#[test]
fn invert_position_changes_the_mask() {
    let solo = masks(&["-m", "0", "-r"]);
    let added = masks(&["-r", "-m", "0"]);
    assert_ne!(solo, added);
    assert_eq!(solo.mask, set(&[0]).complement());
    assert!(!solo.mask.contains(0));
    assert_eq!(added.mask, set(&[]).complement());
    assert!(solo.mute.is_empty() && added.mute.is_empty());
}
