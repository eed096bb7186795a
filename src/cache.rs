//! Woven-output caching to avoid re-weaving unchanged units
//!
//! Stores instrumented units keyed by the hash of their identity. A cache
//! entry is fresh while the modification time embedded in its provenance
//! hint matches the original; the at-most-one-fresh-weave-per-generation
//! guarantee belongs to the loader calling this, not to the weaver.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::constants::ORIGINAL_PATH_HINT;

/// Cache manager for woven units.
pub struct WeaveCache {
    cache_dir: PathBuf,
}

impl WeaveCache {
    /// Create a cache rooted at `cache_dir`, creating the directory if
    /// needed.
    pub fn new(cache_dir: &Path) -> Self {
        fs::create_dir_all(cache_dir).ok();
        WeaveCache {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Cache key for a unit identity.
    pub fn cache_key(identity: &str) -> String {
        format!("{:x}", Sha256::digest(identity.as_bytes()))
    }

    fn entry_path(&self, identity: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.php", Self::cache_key(identity)))
    }

    /// Load the cached woven output for a unit, if present.
    pub fn load(&self, identity: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(identity)).ok()
    }

    /// Persist woven output for a unit.
    pub fn store(&self, identity: &str, woven: &str) -> std::io::Result<()> {
        fs::write(self.entry_path(identity), woven)
    }

    /// True if a cached entry exists and its embedded provenance hint
    /// still matches the original's modification time.
    pub fn is_fresh(&self, identity: &str, source_mtime: u64) -> bool {
        match self.load(identity) {
            Some(cached) => embedded_mtime(&cached) == Some(source_mtime),
            None => false,
        }
    }
}

/// Modification time recorded in a woven unit's provenance hint.
fn embedded_mtime(woven: &str) -> Option<u64> {
    let pattern = format!(r"{hint} .*?#(\d+) {hint}", hint = ORIGINAL_PATH_HINT);
    let re = Regex::new(&pattern).expect("provenance pattern is statically valid");
    re.captures(woven)
        .and_then(|cap| cap[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weaver::Weaver;
    use tempfile::TempDir;

    const UNIT: &str = r#"<?php
class Ticker
{
    public function tick()
    {
        return 1;
    }
}
"#;

    #[test]
    fn store_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = WeaveCache::new(dir.path());
        cache.store("/app/Ticker.php", "<?php woven").unwrap();
        assert_eq!(cache.load("/app/Ticker.php").as_deref(), Some("<?php woven"));
        assert_eq!(cache.load("/app/Other.php"), None);
    }

    #[test]
    fn distinct_identities_get_distinct_keys() {
        assert_ne!(
            WeaveCache::cache_key("/app/A.php"),
            WeaveCache::cache_key("/app/B.php")
        );
    }

    #[test]
    fn freshness_follows_the_embedded_modification_time() {
        let dir = TempDir::new().unwrap();
        let cache = WeaveCache::new(dir.path());
        let woven = Weaver::new().weave(UNIT, "/app/Ticker.php", 1234).unwrap();
        cache.store("/app/Ticker.php", &woven).unwrap();

        assert!(cache.is_fresh("/app/Ticker.php", 1234));
        // The original changed since the cached weave.
        assert!(!cache.is_fresh("/app/Ticker.php", 1235));
        // Nothing cached at all.
        assert!(!cache.is_fresh("/app/Missing.php", 1234));
    }
}
