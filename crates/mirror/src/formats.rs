//! File formats handled by the mirror.
//!
//! Classifies files by extension (case-insensitive), derives converted
//! file names, and recognizes the `" (1)"` duplicate naming convention.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extension of files that must be transcoded.
pub const CONVERTIBLE_EXTENSION: &str = "wma";

/// Extension of files already in the target format.
pub const PASS_THROUGH_EXTENSION: &str = "mp3";

/// Suffix placed before the extension by tools that refuse to overwrite.
pub const DUPLICATE_SUFFIX: &str = " (1)";

/// How the mirror treats a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Already in the target format, copied verbatim.
    PassThrough,
    /// In the source format, transcoded.
    Convertible,
    /// Anything else. Ignored.
    Other,
}

/// Checks if a path has the given extension (case-insensitive).
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Classifies a file by its extension.
pub fn classify(path: &Path) -> FileKind {
    if has_extension(path, PASS_THROUGH_EXTENSION) {
        FileKind::PassThrough
    } else if has_extension(path, CONVERTIBLE_EXTENSION) {
        FileKind::Convertible
    } else {
        FileKind::Other
    }
}

/// File name a convertible file takes once transcoded.
///
/// `/music/Album/Track 01.wma` -> `Track 01.mp3`
pub fn converted_file_name(source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or_else(|| OsStr::new(""));
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(PASS_THROUGH_EXTENSION);
    PathBuf::from(name)
}

/// If `path` is named `<stem> (1).mp3`, returns the path of `<stem>.mp3` in
/// the same directory. Other numeric suffixes are not recognized.
pub fn canonical_of_duplicate(path: &Path) -> Option<PathBuf> {
    if !has_extension(path, PASS_THROUGH_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    let original_stem = stem.strip_suffix(DUPLICATE_SUFFIX)?;
    if original_stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(format!("{}.{}", original_stem, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(Path::new("/music/a.mp3")), FileKind::PassThrough);
        assert_eq!(classify(Path::new("/music/a.MP3")), FileKind::PassThrough);
        assert_eq!(classify(Path::new("/music/a.wma")), FileKind::Convertible);
        assert_eq!(classify(Path::new("/music/a.Wma")), FileKind::Convertible);
        assert_eq!(classify(Path::new("/music/cover.jpg")), FileKind::Other);
        assert_eq!(classify(Path::new("/music/wma")), FileKind::Other); // no extension
        assert_eq!(classify(Path::new("/music/a.wma.txt")), FileKind::Other);
    }

    #[test]
    fn test_converted_file_name() {
        assert_eq!(
            converted_file_name(Path::new("/music/Album/Track 01.wma")),
            PathBuf::from("Track 01.mp3")
        );
        assert_eq!(
            converted_file_name(Path::new("/music/live.2004.WMA")),
            PathBuf::from("live.2004.mp3")
        );
    }

    #[test]
    fn test_canonical_of_duplicate() {
        assert_eq!(
            canonical_of_duplicate(Path::new("/music/track (1).mp3")),
            Some(PathBuf::from("/music/track.mp3"))
        );
        assert_eq!(
            canonical_of_duplicate(Path::new("/music/track (1).MP3")),
            Some(PathBuf::from("/music/track.MP3"))
        );
    }

    #[test]
    fn test_canonical_of_duplicate_narrow_match() {
        assert_eq!(canonical_of_duplicate(Path::new("/music/track (2).mp3")), None);
        assert_eq!(canonical_of_duplicate(Path::new("/music/track(1).mp3")), None);
        assert_eq!(canonical_of_duplicate(Path::new("/music/track (1).wma")), None);
        assert_eq!(canonical_of_duplicate(Path::new("/music/track.mp3")), None);
        assert_eq!(canonical_of_duplicate(Path::new("/music/ (1).mp3")), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_converted_name_keeps_stem(
            stem in "[a-zA-Z0-9 _.-]{0,20}[a-zA-Z0-9]",
            ext in prop_oneof![Just("wma"), Just("WMA"), Just("Wma")],
        ) {
            let source = PathBuf::from(format!("/music/{}.{}", stem, ext));
            let converted = converted_file_name(&source);
            prop_assert_eq!(converted, PathBuf::from(format!("{}.mp3", stem)));
        }

        #[test]
        fn prop_duplicate_maps_back_to_sibling(
            dir in "[a-zA-Z0-9_-]{1,10}",
            stem in "[a-zA-Z0-9_-]{1,20}",
        ) {
            let original = PathBuf::from(format!("/{}/{}.mp3", dir, stem));
            let duplicate = PathBuf::from(format!("/{}/{} (1).mp3", dir, stem));
            prop_assert_eq!(canonical_of_duplicate(&duplicate), Some(original.clone()));
            prop_assert_eq!(canonical_of_duplicate(&original), None);
        }
    }
}
