// Auto-numbered output paths.
//
// Songs land in one folder as `cumbia_song_001.mid`, `cumbia_song_002.mid`,
// and so on. The next number is one past the highest number already present;
// gaps are not refilled and files that don't match the pattern are ignored.

use crate::error::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "cumbia_output";

const PREFIX: &str = "cumbia_song_";
const EXTENSION: &str = ".mid";

/// Parse the song number out of a file name, if it matches the pattern.
pub fn song_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PREFIX)?
        .strip_suffix(EXTENSION)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))?
        .parse()
        .ok()
}

/// File name for a given song number, zero-padded to three digits.
pub fn song_file_name(number: u32) -> String {
    format!("{PREFIX}{number:03}{EXTENSION}")
}

/// Create `dir` if needed and return the next unused numbered path in it.
pub fn next_output_path(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut highest = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(n) = entry.file_name().to_str().and_then(song_number) {
            highest = highest.max(n);
        }
    }
    Ok(dir.join(song_file_name(highest + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_number_parsing() {
        assert_eq!(song_number("cumbia_song_001.mid"), Some(1));
        assert_eq!(song_number("cumbia_song_1234.mid"), Some(1234));
        assert_eq!(song_number("cumbia_song_.mid"), None);
        assert_eq!(song_number("cumbia_song_01a.mid"), None);
        assert_eq!(song_number("cumbia_song_003.wav"), None);
        assert_eq!(song_number("other_003.mid"), None);
    }

    #[test]
    fn test_file_name_padding() {
        assert_eq!(song_file_name(7), "cumbia_song_007.mid");
        assert_eq!(song_file_name(1000), "cumbia_song_1000.mid");
    }

    #[test]
    fn test_first_path_in_new_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let path = next_output_path(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("cumbia_song_001.mid"));
    }

    #[test]
    fn test_next_path_skips_past_highest() {
        let tmp = tempfile::tempdir().unwrap();
        for name in [
            "cumbia_song_002.mid",
            "cumbia_song_010.mid",
            "notes.txt",
            "cumbia_song_x.mid",
        ] {
            std::fs::write(tmp.path().join(name), b"").unwrap();
        }
        let path = next_output_path(tmp.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "cumbia_song_011.mid");
    }
}
