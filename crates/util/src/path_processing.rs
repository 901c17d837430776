use std::path::PathBuf;

use dirs_next::home_dir;

/// Replace a leading `~` (alone, or followed by `/` or `\`) with the home
/// directory. Other paths are returned trimmed and otherwise untouched.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let Some(rest) = trimmed.strip_prefix('~') else {
        return PathBuf::from(trimmed);
    };
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    match rest.chars().next() {
        None => home,
        Some('/') | Some('\\') => home.join(&rest[1..]),
        // `~user` forms are not expanded
        Some(_) => PathBuf::from(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_plain_paths_untouched() {
        assert_eq!(expand_tilde(" snapshots/base.json "), PathBuf::from("snapshots/base.json"));
        assert_eq!(expand_tilde("~alice/base.json"), PathBuf::from("~alice/base.json"));
    }

    #[test]
    fn expands_home_prefix() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/coldiff.json"), home.join("coldiff.json"));
        }
    }
}
