use crate::foundation::bytes::{FieldReader, i32_array_le, padded_str};
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};
use crate::source::{Source, SourceFormat, TrackEntry};

/// Magic bytes at the start of a classic NSF image.
pub const NSF_MAGIC: &[u8; 5] = b"NESM\x1a";
/// Magic bytes at the start of an NSFe image.
pub const NSFE_MAGIC: &[u8; 4] = b"NSFE";
/// Size of the classic NSF header.
pub const NSF_HEADER_LEN: usize = 0x80;

const NSF2_METADATA_FLAG: u8 = 0x80;

/// Parse an NSF or NSFe image, dispatching on the magic bytes.
pub fn parse(data: &[u8]) -> Nsf2WavResult<Source> {
    if data.starts_with(NSF_MAGIC) {
        parse_nsf(data)
    } else if data.starts_with(NSFE_MAGIC) {
        parse_nsfe(data)
    } else {
        Err(Nsf2WavError::input("not an NSF or NSFe file (bad magic)"))
    }
}

/// Metadata gathered from chunks before the song count is necessarily known.
#[derive(Debug, Default)]
struct ChunkMeta {
    labels: Vec<String>,
    times: Vec<i32>,
    fades: Vec<i32>,
    playlist: Option<Vec<u8>>,
    auth: Option<[String; 4]>,
}

fn parse_nsf(data: &[u8]) -> Nsf2WavResult<Source> {
    let mut r = FieldReader::new(data);
    r.take(NSF_MAGIC.len(), "magic")?;
    let version = r.u8("version")?;
    let total_songs = r.u8("song count")?;
    let start_song = r.u8("start song")?;
    let load_addr = r.u16_le("load address")?;
    let init_addr = r.u16_le("init address")?;
    let play_addr = r.u16_le("play address")?;
    let title = padded_str(r.take(32, "title")?);
    let artist = padded_str(r.take(32, "artist")?);
    let copyright = padded_str(r.take(32, "copyright")?);
    let _ntsc_speed = r.u16_le("NTSC speed")?;
    let mut bankswitch = [0u8; 8];
    bankswitch.copy_from_slice(r.take(8, "bankswitch")?);
    let _pal_speed = r.u16_le("PAL speed")?;
    let region = r.u8("region")?;
    let expansion = r.u8("expansion")?;
    let nsf2_flags = r.u8("NSF2 flags")?;
    let program_len = r.u24_le("program length")?;
    debug_assert_eq!(r.position(), NSF_HEADER_LEN);

    if total_songs == 0 {
        return Err(Nsf2WavError::input("NSF declares no songs"));
    }

    let mut meta = ChunkMeta::default();
    let program = if version >= 2 && nsf2_flags & NSF2_METADATA_FLAG != 0 && program_len != 0 {
        let program = r.take(program_len as usize, "NSF2 program data")?.to_vec();
        walk_chunks(r.rest(), |id, body| match id {
            b"INFO" | b"DATA" | b"BANK" | b"RATE" => Ok(()),
            _ => apply_metadata_chunk(id, body, &mut meta),
        })?;
        program
    } else {
        r.rest().to_vec()
    };
    if program.is_empty() {
        return Err(Nsf2WavError::input("NSF has no program data"));
    }

    let mut source = Source {
        format: SourceFormat::Nsf,
        title,
        artist,
        copyright,
        total_songs,
        start_song: zero_based_start(start_song.saturating_sub(1), total_songs),
        load_addr,
        init_addr,
        play_addr,
        region,
        expansion,
        bankswitch,
        program,
        ..Source::default()
    };
    finish(&mut source, meta)?;
    Ok(source)
}

fn parse_nsfe(data: &[u8]) -> Nsf2WavResult<Source> {
    let mut source = Source {
        format: SourceFormat::Nsfe,
        total_songs: 1,
        ..Source::default()
    };
    let mut meta = ChunkMeta::default();
    let mut seen_info = false;
    let mut seen_data = false;

    walk_chunks(&data[NSFE_MAGIC.len()..], |id, body| match id {
        b"INFO" => {
            if body.len() < 8 {
                return Err(Nsf2WavError::input("NSFe INFO chunk is too short"));
            }
            let mut r = FieldReader::new(body);
            source.load_addr = r.u16_le("load address")?;
            source.init_addr = r.u16_le("init address")?;
            source.play_addr = r.u16_le("play address")?;
            source.region = r.u8("region")?;
            source.expansion = r.u8("expansion")?;
            if r.remaining() > 0 {
                source.total_songs = r.u8("song count")?;
            }
            if r.remaining() > 0 {
                source.start_song = r.u8("start song")?;
            }
            seen_info = true;
            Ok(())
        }
        b"DATA" => {
            source.program = body.to_vec();
            seen_data = true;
            Ok(())
        }
        b"BANK" => {
            let n = body.len().min(8);
            source.bankswitch[..n].copy_from_slice(&body[..n]);
            Ok(())
        }
        b"RATE" => Ok(()),
        _ => apply_metadata_chunk(id, body, &mut meta),
    })?;

    if !seen_info {
        return Err(Nsf2WavError::input("NSFe is missing its INFO chunk"));
    }
    if !seen_data || source.program.is_empty() {
        return Err(Nsf2WavError::input("NSFe is missing its DATA chunk"));
    }
    if source.total_songs == 0 {
        return Err(Nsf2WavError::input("NSFe declares no songs"));
    }
    source.start_song = zero_based_start(source.start_song, source.total_songs);
    finish(&mut source, meta)?;
    Ok(source)
}

fn zero_based_start(start: u8, total: u8) -> u8 {
    if start < total { start } else { 0 }
}

/// Walk an NSFe-style chunk stream, stopping at `NEND` or the end of the data.
fn walk_chunks(
    data: &[u8],
    mut visit: impl FnMut(&[u8; 4], &[u8]) -> Nsf2WavResult<()>,
) -> Nsf2WavResult<()> {
    let mut r = FieldReader::new(data);
    while r.remaining() > 0 {
        let len = r.u32_le("chunk length")? as usize;
        let id = r.tag("chunk id")?;
        if &id == b"NEND" {
            return Ok(());
        }
        let name = String::from_utf8_lossy(&id).into_owned();
        let body = r.take(len, &format!("'{name}' chunk"))?;
        visit(&id, body)?;
    }
    tracing::debug!("chunk stream ended without NEND");
    Ok(())
}

fn apply_metadata_chunk(id: &[u8; 4], body: &[u8], meta: &mut ChunkMeta) -> Nsf2WavResult<()> {
    match id {
        b"tlbl" => meta.labels = split_cstrs(body),
        b"time" => meta.times = i32_array_le(body),
        b"fade" => meta.fades = i32_array_le(body),
        b"plst" => meta.playlist = Some(body.to_vec()),
        b"auth" => {
            let mut r = FieldReader::new(body);
            meta.auth = Some([r.cstr(), r.cstr(), r.cstr(), r.cstr()]);
        }
        _ if id[0].is_ascii_uppercase() => {
            return Err(Nsf2WavError::input(format!(
                "unsupported required chunk '{}'",
                String::from_utf8_lossy(id)
            )));
        }
        _ => tracing::debug!(chunk = %String::from_utf8_lossy(id), "skipping optional chunk"),
    }
    Ok(())
}

fn split_cstrs(body: &[u8]) -> Vec<String> {
    let mut r = FieldReader::new(body);
    let mut out = Vec::new();
    while r.remaining() > 0 {
        out.push(r.cstr());
    }
    out
}

fn finish(source: &mut Source, meta: ChunkMeta) -> Nsf2WavResult<()> {
    if let Some([title, artist, copyright, ripper]) = meta.auth {
        source.title = title;
        source.artist = artist;
        source.copyright = copyright;
        source.ripper = ripper;
    }
    if let Some(plst) = &meta.playlist
        && let Some(&bad) = plst.iter().find(|&&s| s >= source.total_songs)
    {
        return Err(Nsf2WavError::input(format!(
            "playlist references song {} but only {} exist",
            u32::from(bad) + 1,
            source.total_songs
        )));
    }
    source.playlist = meta.playlist;
    source.entries = (0..usize::from(source.total_songs))
        .map(|i| TrackEntry {
            label: meta.labels.get(i).cloned().unwrap_or_default(),
            time_ms: meta.times.get(i).copied().filter(|&t| t >= 0),
            fade_ms: meta.fades.get(i).copied().filter(|&f| f >= 0),
        })
        .collect();
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/source/nsf.rs"]
mod tests;
