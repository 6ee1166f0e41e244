//! Allowlist of audio formats the player will hand to the engine.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Formats every platform decodes
const CORE_FORMATS: &[(&str, &str)] = &[
    ("mp3", "MP3 Audio"),
    ("wav", "WAV Audio"),
    ("flac", "FLAC Audio"),
    ("ogg", "Ogg Vorbis"),
    ("wma", "Windows Media Audio"),
    ("aac", "AAC Audio"),
    ("m4a", "MPEG-4 Audio"),
];

#[cfg(target_os = "windows")]
const PLATFORM_FORMATS: &[(&str, &str)] = &[("ac3", "Dolby Digital"), ("dts", "DTS Audio")];

#[cfg(target_os = "macos")]
const PLATFORM_FORMATS: &[(&str, &str)] = &[("aiff", "AIFF Audio"), ("caf", "Core Audio Format")];

#[cfg(target_os = "linux")]
const PLATFORM_FORMATS: &[(&str, &str)] = &[("opus", "Opus Audio")];

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
const PLATFORM_FORMATS: &[(&str, &str)] = &[];

static SUPPORTED_FORMATS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    CORE_FORMATS
        .iter()
        .chain(PLATFORM_FORMATS)
        .copied()
        .collect()
});

/// Lower-cased extension of `path`, if it has one
#[must_use]
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Check whether the file's extension is in the allowlist (case-insensitive)
#[must_use]
pub fn is_supported(path: impl AsRef<Path>) -> bool {
    describe(path).is_some()
}

/// Human-readable name of the file's format, if supported
#[must_use]
pub fn describe(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = extension_of(path.as_ref())?;
    SUPPORTED_FORMATS.get(ext.as_str()).copied()
}

/// All supported extensions with their descriptions, sorted by extension
#[must_use]
pub fn supported_formats() -> Vec<(&'static str, &'static str)> {
    let mut formats: Vec<_> = SUPPORTED_FORMATS
        .iter()
        .map(|(ext, description)| (*ext, *description))
        .collect();
    formats.sort_unstable();
    formats
}
