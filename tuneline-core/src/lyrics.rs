//! Time-indexed lyric model parsed from LRC-style sources.

/// Number of lines shown on each side of the highlighted line by default.
pub const DEFAULT_WINDOW_RADIUS: usize = 2;

/// A single timed lyric line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Absolute start time in milliseconds
    pub timestamp_ms: u64,
    /// Lyric text, never empty
    pub text: String,
}

/// LRC metadata from ID tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrcMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    pub offset_ms: i64, // can be negative
}

/// Sorted, searchable sequence of timed lyric lines.
///
/// The index is rebuilt wholesale on every [`parse`](Self::parse); there are
/// no incremental edits.
#[derive(Debug, Clone, Default)]
pub struct LyricsIndex {
    metadata: LrcMetadata,
    lines: Vec<LyricLine>,
}

/// A contiguous run of lines around a highlighted line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricWindow {
    /// Index (into the full lyric sequence) of the first line in `lines`
    pub first_index: usize,
    /// Index of the highlighted line, `None` for an empty window
    pub highlighted: Option<usize>,
    pub lines: Vec<LyricLine>,
}

impl LyricWindow {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The highlighted line, if the window has one
    #[must_use]
    pub fn highlighted_line(&self) -> Option<&LyricLine> {
        let idx = self.highlighted?.checked_sub(self.first_index)?;
        self.lines.get(idx)
    }

    /// Iterate as `(absolute index, line, is_highlighted)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LyricLine, bool)> + '_ {
        self.lines.iter().enumerate().map(move |(offset, line)| {
            let index = self.first_index + offset;
            (index, line, self.highlighted == Some(index))
        })
    }
}

impl LyricsIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from an LRC string
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        let mut index = Self::new();
        index.parse(source);
        index
    }

    /// Replace the index contents with the lines parsed from `source`.
    ///
    /// Lines that don't start with a `[minutes:seconds(.fraction)]` tag, and
    /// lines whose text is empty after trimming, are dropped.
    pub fn parse(&mut self, source: &str) {
        self.clear();
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Try to parse as lyric line(s)
            if let Some(parsed) = parse_lyric_line(line) {
                self.lines.extend(parsed);
                continue;
            }

            if let Some((tag, value)) = parse_id_tag(line) {
                match tag.to_lowercase().as_str() {
                    "ti" => self.metadata.title = Some(value),
                    "ar" => self.metadata.artist = Some(value),
                    "al" => self.metadata.album = Some(value),
                    "by" | "au" => self.metadata.author = Some(value),
                    "offset" => {
                        if let Ok(offset) = value.parse::<i64>() {
                            self.metadata.offset_ms = offset;
                        }
                    }
                    _ => {} // Ignore unknown tags
                }
            }
        }

        if self.metadata.offset_ms != 0 {
            let offset = self.metadata.offset_ms;
            for line in &mut self.lines {
                line.timestamp_ms = apply_offset(line.timestamp_ms, offset);
            }
        }

        // Stable: equal timestamps keep their input order
        self.lines.sort_by_key(|l| l.timestamp_ms);
    }

    /// Empty the index
    pub fn clear(&mut self) {
        self.lines.clear();
        self.metadata = LrcMetadata::default();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub const fn metadata(&self) -> &LrcMetadata {
        &self.metadata
    }

    /// Index of the last line starting at or before `position_ms`.
    ///
    /// When several lines share a timestamp, the last listed one is current.
    #[must_use]
    pub fn current_index_for(&self, position_ms: u64) -> Option<usize> {
        self.lines
            .partition_point(|line| line.timestamp_ms <= position_ms)
            .checked_sub(1)
    }

    /// Lines from `index - radius` to `index + radius`, clamped to the sequence
    #[must_use]
    pub fn window_around(&self, index: usize, radius: usize) -> LyricWindow {
        if index >= self.lines.len() {
            return LyricWindow::default();
        }

        let start = index.saturating_sub(radius);
        let end = index.saturating_add(radius).min(self.lines.len() - 1);

        LyricWindow {
            first_index: start,
            highlighted: Some(index),
            lines: self.lines[start..=end].to_vec(),
        }
    }
}

/// A change of the resolved lyric line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

/// Remembers the last resolved line so position ticks only report transitions.
#[derive(Debug, Clone, Default)]
pub struct LyricsCursor {
    current: Option<usize>,
}

impl LyricsCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently resolved line
    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    /// Resolve `position_ms` against `lyrics`, returning a change only when the line moved
    pub fn advance(&mut self, lyrics: &LyricsIndex, position_ms: u64) -> Option<LineChange> {
        let resolved = lyrics.current_index_for(position_ms);
        if resolved == self.current {
            return None;
        }

        let change = LineChange {
            previous: self.current,
            current: resolved,
        };
        self.current = resolved;
        Some(change)
    }

    /// Forget the resolved line (new track or new lyrics)
    pub fn reset(&mut self) {
        self.current = None;
    }
}

/// Convert a fractional-second string of up to three digits into milliseconds.
///
/// `"5"` is 500 ms, `"50"` is 500 ms, `"500"` is 500 ms. An empty fraction is zero.
pub(crate) fn fraction_to_millis(fraction: &str) -> Option<u64> {
    if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if fraction.is_empty() {
        return Some(0);
    }

    let value: u64 = fraction.parse().ok()?;
    Some(match fraction.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    })
}

/// Parse a timestamp like `01:02`, `01:02.5`, `01:02.50`, or `01:02.500` into milliseconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let (minutes, rest) = s.split_once(':')?;
    let (seconds, fraction) = rest.split_once('.').unwrap_or((rest, ""));

    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    let millis = fraction_to_millis(fraction)?;

    minutes
        .checked_mul(60_000)?
        .checked_add(seconds.checked_mul(1000)?)?
        .checked_add(millis)
}

/// Parse a non-empty run of ASCII digits (no sign, no whitespace)
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a lyric line like `[00:12.34]Hello` or `[00:12.34][00:15.67]Same lyrics`
fn parse_lyric_line(line: &str) -> Option<Vec<LyricLine>> {
    let mut remaining = line;
    let mut timestamps = Vec::new();

    // Extract all timestamps at the beginning
    while let Some(rest) = remaining.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            break;
        };
        let Some(time) = parse_timestamp(&rest[..end]) else {
            break;
        };
        timestamps.push(time);
        remaining = &rest[end + 1..];
    }

    if timestamps.is_empty() {
        return None;
    }

    let text = remaining.trim();
    if text.is_empty() {
        // Silent line
        return Some(Vec::new());
    }

    Some(
        timestamps
            .into_iter()
            .map(|timestamp_ms| LyricLine {
                timestamp_ms,
                text: text.to_string(),
            })
            .collect(),
    )
}

/// Parse an ID tag like `[ti:Title]` or `[offset:500]`
fn parse_id_tag(line: &str) -> Option<(String, String)> {
    let content = line.strip_prefix('[')?.strip_suffix(']')?;
    let (tag, value) = content.split_once(':')?;

    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some((tag.to_string(), value.trim().to_string()))
}

/// Apply a millisecond offset to a timestamp (can be negative)
fn apply_offset(timestamp_ms: u64, offset_ms: i64) -> u64 {
    if offset_ms >= 0 {
        timestamp_ms.saturating_add(offset_ms.unsigned_abs())
    } else {
        timestamp_ms.saturating_sub(offset_ms.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(index: &LyricsIndex) -> Vec<&str> {
        index.lines().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_parse_simple_lrc() {
        let index = LyricsIndex::from_source("[00:12.34]Hello world");
        assert_eq!(index.len(), 1);
        assert_eq!(index.lines()[0].timestamp_ms, 12_340);
        assert_eq!(index.lines()[0].text, "Hello world");
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let index = LyricsIndex::from_source("\u{feff}[00:01.00]first\n[00:02.00]second");
        assert_eq!(texts(&index), vec!["first", "second"]);
        assert_eq!(index.lines()[0].timestamp_ms, 1000);

        let tagged = LyricsIndex::from_source("\u{feff}[ti:Song]\n[00:01.00]first");
        assert_eq!(tagged.metadata().title.as_deref(), Some("Song"));
    }

    #[test]
    fn test_fraction_normalization() {
        for source in ["[00:01.5]x", "[00:01.50]x", "[00:01.500]x"] {
            let index = LyricsIndex::from_source(source);
            assert_eq!(index.lines()[0].timestamp_ms, 1500, "source: {source}");
        }

        let a = LyricsIndex::from_source("[01:02.50]Hello");
        let b = LyricsIndex::from_source("[1:2.5]Hello");
        assert_eq!(a.lines()[0].timestamp_ms, 62_500);
        assert_eq!(b.lines()[0].timestamp_ms, 62_500);
    }

    #[test]
    fn test_wide_minutes_and_no_fraction() {
        let index = LyricsIndex::from_source("[123:04]Long one");
        assert_eq!(index.lines()[0].timestamp_ms, 123 * 60_000 + 4000);
    }

    #[test]
    fn test_empty_text_lines_dropped() {
        let input = "[00:05.00]First\n[00:10]\n[00:12.00]   \n[00:15.00]Second";
        let index = LyricsIndex::from_source(input);
        assert_eq!(texts(&index), vec!["First", "Second"]);
    }

    #[test]
    fn test_malformed_lines_dropped() {
        let input = r"
plain text
[aa:bb]nope
[00:xx.10]nope
[00:01.1234]too many fraction digits
[00:02.25]kept
";
        let index = LyricsIndex::from_source(input);
        assert_eq!(texts(&index), vec!["kept"]);
    }

    #[test]
    fn test_sorted_regardless_of_input_order() {
        let input = "[00:15.00]Third\n[00:05.00]First\n[00:10.00]Second";
        let index = LyricsIndex::from_source(input);
        assert_eq!(texts(&index), vec!["First", "Second", "Third"]);
        assert!(index
            .lines()
            .windows(2)
            .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    }

    #[test]
    fn test_parse_clears_previous_state() {
        let mut index = LyricsIndex::from_source("[ti:Old]\n[00:01.00]Old line");
        index.parse("[00:02.00]New line");
        assert_eq!(texts(&index), vec!["New line"]);
        assert_eq!(index.metadata().title, None);
    }

    #[test]
    fn test_parse_id_tags() {
        let input = r"
[ti:Song Title]
[ar:Artist Name]
[al:Album Name]
[by:Someone]
[00:05.00]Lyrics here
";
        let index = LyricsIndex::from_source(input);
        assert_eq!(index.metadata().title.as_deref(), Some("Song Title"));
        assert_eq!(index.metadata().artist.as_deref(), Some("Artist Name"));
        assert_eq!(index.metadata().album.as_deref(), Some("Album Name"));
        assert_eq!(index.metadata().author.as_deref(), Some("Someone"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_parse_offset() {
        let index = LyricsIndex::from_source("[offset:500]\n[00:10.00]Test");
        assert_eq!(index.lines()[0].timestamp_ms, 10_500);

        let index = LyricsIndex::from_source("[offset:-20000]\n[00:10.00]Test");
        assert_eq!(index.lines()[0].timestamp_ms, 0);
    }

    #[test]
    fn test_parse_multi_timestamp_line() {
        let index = LyricsIndex::from_source("[00:15.00][00:05.00]Repeated lyric");
        assert_eq!(index.len(), 2);
        assert_eq!(index.lines()[0].timestamp_ms, 5000);
        assert_eq!(index.lines()[1].timestamp_ms, 15_000);
        assert!(index.lines().iter().all(|l| l.text == "Repeated lyric"));
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let index = LyricsIndex::from_source("[00:09.86]对这个世界如果你有太多的抱怨");
        assert_eq!(index.lines()[0].text, "对这个世界如果你有太多的抱怨");
        assert_eq!(index.lines()[0].timestamp_ms, 9860);
    }

    #[test]
    fn test_current_index_for() {
        let input = "[00:05.00]First\n[00:10.00]Second\n[00:15.00]Third";
        let index = LyricsIndex::from_source(input);

        assert_eq!(index.current_index_for(0), None);
        assert_eq!(index.current_index_for(4999), None);
        assert_eq!(index.current_index_for(5000), Some(0));
        assert_eq!(index.current_index_for(12_000), Some(1));
        assert_eq!(index.current_index_for(60_000), Some(2));
        assert_eq!(LyricsIndex::new().current_index_for(1000), None);
    }

    #[test]
    fn test_current_index_exact_timestamps() {
        let input = "[00:01.250]a\n[00:02.500]b\n[00:03.750]c\n[01:00.001]d";
        let index = LyricsIndex::from_source(input);
        for (i, line) in index.lines().iter().enumerate() {
            assert_eq!(index.current_index_for(line.timestamp_ms), Some(i));
        }
    }

    #[test]
    fn test_tied_timestamps_last_listed_wins() {
        let input = "[00:05.00]before\n[00:10.00]first\n[00:10.00]second\n[00:20.00]after";
        let index = LyricsIndex::from_source(input);
        assert_eq!(texts(&index), vec!["before", "first", "second", "after"]);
        assert_eq!(index.current_index_for(10_000), Some(2));
        assert_eq!(index.current_index_for(15_000), Some(2));
    }

    #[test]
    fn test_window_around_middle() {
        let input = (1..=9)
            .map(|i| format!("[00:{i:02}.00]Line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let index = LyricsIndex::from_source(&input);

        let window = index.window_around(4, DEFAULT_WINDOW_RADIUS);
        assert_eq!(window.len(), 5);
        assert_eq!(window.first_index, 2);
        assert_eq!(window.highlighted_line().map(|l| l.text.as_str()), Some("Line 5"));

        let highlighted: Vec<_> = window.iter().filter(|(_, _, hl)| *hl).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].0, 4);
    }

    #[test]
    fn test_window_around_edges_clamped() {
        let input = "[00:01]a\n[00:02]b\n[00:03]c\n[00:04]d\n[00:05]e\n[00:06]f";
        let index = LyricsIndex::from_source(input);

        let start = index.window_around(0, 2);
        assert_eq!(start.first_index, 0);
        assert_eq!(start.len(), 3);

        let end = index.window_around(5, 2);
        assert_eq!(end.first_index, 3);
        assert_eq!(end.len(), 3);
        assert_eq!(end.highlighted, Some(5));

        for i in 0..index.len() {
            let window = index.window_around(i, 2);
            assert!(window.len() >= 3);
            assert!(window.iter().all(|(idx, _, _)| idx < index.len()));
        }
    }

    #[test]
    fn test_window_around_small_and_out_of_range() {
        let index = LyricsIndex::from_source("[00:01]only");
        assert_eq!(index.window_around(0, 2).len(), 1);
        assert!(index.window_around(1, 2).is_empty());
        assert!(LyricsIndex::new().window_around(0, 2).is_empty());
    }

    #[test]
    fn test_cursor_reports_transitions_only() {
        let index = LyricsIndex::from_source("[00:01]a\n[00:03]b");
        let mut cursor = LyricsCursor::new();

        assert_eq!(cursor.advance(&index, 500), None);
        assert_eq!(
            cursor.advance(&index, 1000),
            Some(LineChange { previous: None, current: Some(0) })
        );
        assert_eq!(cursor.advance(&index, 1500), None);
        assert_eq!(cursor.advance(&index, 2999), None);
        assert_eq!(
            cursor.advance(&index, 3000),
            Some(LineChange { previous: Some(0), current: Some(1) })
        );

        // Seeking backwards is a transition too
        assert_eq!(
            cursor.advance(&index, 0),
            Some(LineChange { previous: Some(1), current: None })
        );

        cursor.reset();
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn test_clear() {
        let mut index = LyricsIndex::from_source("[ar:x]\n[00:01]a");
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.metadata(), &LrcMetadata::default());
    }
}
