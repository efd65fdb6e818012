use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reelgap_model::MediaType;

static LEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[\[【][^\]】]*[\]】]\s*").unwrap());
static FILE_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mkv|mp4|avi|mov|wmv|flv|webm|m4v|mpg|mpeg|ts|iso)$")
        .unwrap()
});
static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,3})(?:\s*E(\d{1,4}))?\b").unwrap()
});
static SEASON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSeason\s*(\d{1,3})\b").unwrap());
// A bare `E` must touch its digits, so `WALL E 2008` keeps its year.
static EPISODE_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:E|EP\s*|Episode\s*)(\d{1,3})\b").unwrap()
});
static CJK_SEASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"第\s*([0-9一二三四五六七八九十百两]+)\s*季").unwrap()
});
static CJK_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"第\s*([0-9一二三四五六七八九十百两]+)\s*[集话話]").unwrap()
});
static YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d])([\(\[（]?)(19\d{2}|20\d{2})([\)\]）]?)(?:[^\d]|$)")
        .unwrap()
});
static QUALITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|1080i|720p|480p|4k|uhd|blu-?ray|web-?dl|webrip|hdrip|hdtv|dvdrip|remux|x264|x265|h\.?26[45]|hevc|avc|10bit|hdr10?)\b",
    )
    .unwrap()
});

/// Values recovered from a free-text title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTitle {
    pub name: String,
    pub year: Option<u16>,
    pub season: Option<u16>,
    pub episode: Option<u16>,
    pub media_type: MediaType,
}

/// Splits a title such as `Show.X.S02E05.1080p` or `Movie Y (2019)` into a
/// clean name plus the year, season and episode markers it carried.
pub fn parse_title(raw: &str) -> ParsedTitle {
    let stripped = FILE_EXTENSION.replace(raw.trim(), "");
    let untagged = LEADING_TAG.replace(&stripped, "");
    let text = untagged.replace(['.', '_'], " ");

    let mut cutoff = text.len();
    let mut season = None;
    let mut episode = None;

    if let Some(caps) = SEASON_EPISODE.captures(&text) {
        season = capture_number(&caps, 1);
        episode = capture_number(&caps, 2);
        cutoff = cutoff.min(match_start(&caps));
    }
    if let Some(caps) = SEASON_WORD.captures(&text) {
        season = season.or_else(|| capture_number(&caps, 1));
        cutoff = cutoff.min(match_start(&caps));
    }
    if let Some(caps) = CJK_SEASON.captures(&text) {
        season = season.or_else(|| capture_cjk(&caps, 1));
        cutoff = cutoff.min(match_start(&caps));
    }
    if let Some(caps) = CJK_EPISODE.captures(&text) {
        episode = episode.or_else(|| capture_cjk(&caps, 1));
        cutoff = cutoff.min(match_start(&caps));
    }
    if episode.is_none()
        && let Some(caps) = EPISODE_WORD.captures(&text)
        && match_start(&caps) > 0
    {
        episode = capture_number(&caps, 1);
        cutoff = cutoff.min(match_start(&caps));
    }
    if let Some(m) = QUALITY.find(&text)
        && m.start() > 0
    {
        cutoff = cutoff.min(m.start());
    }

    let year = pick_year(&text).map(|(year, start)| {
        cutoff = cutoff.min(start);
        year
    });

    let mut name = clean_name(&text[..cutoff]);
    if name.is_empty() {
        name = collapse_whitespace(&text);
    }

    let media_type = if season.is_some() || episode.is_some() {
        MediaType::Tv
    } else {
        MediaType::Unknown
    };

    ParsedTitle {
        name,
        year,
        season,
        episode,
        media_type,
    }
}

/// Chooses the release year: a bracketed year wins, otherwise the last
/// free-standing one. A year that makes up the whole title is a name.
fn pick_year(text: &str) -> Option<(u16, usize)> {
    let mut bracketed = None;
    let mut last = None;

    for caps in YEAR.captures_iter(text) {
        let (Some(open), Some(digits), Some(close)) =
            (caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let start = open.start().min(digits.start());
        if text[..start].trim().is_empty() {
            continue;
        }
        let Ok(year) = digits.as_str().parse::<u16>() else {
            continue;
        };
        if !open.as_str().is_empty() || !close.as_str().is_empty() {
            bracketed = Some((year, start));
        } else {
            last = Some((year, start));
        }
    }

    bracketed.or(last)
}

fn match_start(caps: &Captures<'_>) -> usize {
    caps.get(0).map(|m| m.start()).unwrap_or(0)
}

fn capture_number(caps: &Captures<'_>, index: usize) -> Option<u16> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn capture_cjk(caps: &Captures<'_>, index: usize) -> Option<u16> {
    caps.get(index).and_then(|m| parse_cjk_number(m.as_str()))
}

/// Reads ascii digits or Chinese numerals up to the hundreds.
pub fn parse_cjk_number(raw: &str) -> Option<u16> {
    if let Ok(value) = raw.parse::<u16>() {
        return Some(value);
    }

    let digit = |c: char| -> Option<u16> {
        Some(match c {
            '一' => 1,
            '二' | '两' => 2,
            '三' => 3,
            '四' => 4,
            '五' => 5,
            '六' => 6,
            '七' => 7,
            '八' => 8,
            '九' => 9,
            _ => return None,
        })
    };

    let mut total = 0u16;
    let mut pending = 0u16;
    for c in raw.chars() {
        match c {
            '百' => {
                total = total.saturating_add(pending.max(1).saturating_mul(100));
                pending = 0;
            }
            '十' => {
                total = total.saturating_add(pending.max(1).saturating_mul(10));
                pending = 0;
            }
            '0'..='9' => {
                pending = pending
                    .saturating_mul(10)
                    .saturating_add(c as u16 - '0' as u16)
            }
            other => pending = digit(other)?,
        }
    }
    let value = total.saturating_add(pending);
    (value > 0).then_some(value)
}

fn clean_name(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    collapsed
        .trim_end_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '(' | '[' | '（' | '【' | ':')
        })
        .trim()
        .to_string()
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
