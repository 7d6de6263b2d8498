use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// One NEZ Plug M3U line: `path::NSF,track,title,time,loop,fade[,loops]`.
///
/// Only the fields that affect rendering are kept; the loop point and loop count are
/// accepted and ignored.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PlaylistEntry {
    /// Path of the NSF the entry refers to.
    pub path: String,
    /// Zero-based song index (the line stores it 1-based).
    pub song: u32,
    /// Track title, if given.
    pub title: Option<String>,
    /// Play time in milliseconds, if given.
    pub time_ms: Option<i32>,
    /// Fade time in milliseconds, if given.
    pub fade_ms: Option<i32>,
}

impl PlaylistEntry {
    /// `true` when a command-line source argument names a playlist entry rather than a file.
    pub fn is_entry(arg: &str) -> bool {
        arg.contains("::")
    }

    /// Parse an entry line.
    pub fn parse(line: &str) -> Nsf2WavResult<Self> {
        let (path, rest) = line
            .split_once("::")
            .ok_or_else(|| Nsf2WavError::input("playlist entry is missing '::'"))?;
        if path.is_empty() {
            return Err(Nsf2WavError::input("playlist entry has an empty file path"));
        }

        let fields = split_fields(rest.trim_end());
        let kind = fields.first().map(String::as_str).unwrap_or_default();
        if !kind.trim().eq_ignore_ascii_case("NSF") {
            return Err(Nsf2WavError::input(format!(
                "unsupported playlist entry type '{kind}' (expected NSF)"
            )));
        }

        let track = fields
            .get(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Nsf2WavError::input("playlist entry has no track number"))?;
        let number = parse_track_number(track)?;
        if number == 0 {
            return Err(Nsf2WavError::input(
                "playlist entry track numbers start at 1",
            ));
        }

        let field = |i: usize| fields.get(i).map(|s| s.trim()).unwrap_or_default();
        let title = Some(field(2).to_string()).filter(|t| !t.is_empty());

        Ok(Self {
            path: path.to_string(),
            song: number - 1,
            title,
            time_ms: parse_time_ms(field(3))?,
            fade_ms: parse_time_ms(field(5))?,
        })
    }
}

/// Split on commas, honoring `\,` (and any other backslash escape).
fn split_fields(s: &str) -> Vec<String> {
    let mut out = vec![String::new()];
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next()
                    && let Some(cur) = out.last_mut()
                {
                    cur.push(next);
                }
            }
            ',' => out.push(String::new()),
            _ => {
                if let Some(cur) = out.last_mut() {
                    cur.push(c);
                }
            }
        }
    }
    out
}

fn parse_track_number(s: &str) -> Nsf2WavResult<u32> {
    let parsed = match s.strip_prefix('$') {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|_| Nsf2WavError::input(format!("invalid playlist track number '{s}'")))
}

/// Parse `[[h:]m:]s[.fff]` into milliseconds; an empty field is unset.
pub fn parse_time_ms(s: &str) -> Nsf2WavResult<Option<i32>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let bad = || Nsf2WavError::input(format!("invalid playlist time '{s}'"));

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return Err(bad());
    }
    let (last, leading) = parts.split_last().ok_or_else(bad)?;

    let (secs, frac) = last.split_once('.').unwrap_or((*last, ""));
    let mut total_ms: i64 = secs.parse::<u32>().map_err(|_| bad())?.into();
    total_ms *= 1000;
    if !frac.is_empty() {
        if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let scale = 10i64.pow(3 - frac.len() as u32);
        total_ms += frac.parse::<i64>().map_err(|_| bad())? * scale;
    }

    let mut unit_ms: i64 = 60_000;
    for part in leading.iter().rev() {
        let v: i64 = part.parse::<u32>().map_err(|_| bad())?.into();
        total_ms += v * unit_ms;
        unit_ms *= 60;
    }

    i32::try_from(total_ms).map(Some).map_err(|_| bad())
}

#[cfg(test)]
#[path = "../../tests/unit/source/playlist.rs"]
mod tests;
