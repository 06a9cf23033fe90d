use crate::types::{RankingError, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

pub const CACHE_DIR: &str = ".cache";
pub const CACHE_FILE: &str = "index.html";
const PARTIAL_FILE: &str = "index.html.part";

/// Raw page cache keyed by (country, year).
///
/// Entries live at `<base>/.cache/<country>/<year>/index.html`. A write goes to a
/// sibling `.part` file first and is renamed into place by [`CacheSink::finish`], so
/// an entry that [`KeyCache::exists`] reports is always complete.
///
/// There is no locking here. Callers must not hold two sinks for the same key at once.
#[derive(Debug, Clone)]
pub struct KeyCache {
    root: PathBuf,
}

impl KeyCache {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            root: base_dir.as_ref().join(CACHE_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the entry for a key. Depends on nothing but the key pair.
    pub fn path_for(&self, country: &str, year: &str) -> Result<PathBuf> {
        Ok(self.entry_dir(country, year)?.join(CACHE_FILE))
    }

    pub async fn exists(&self, country: &str, year: &str) -> Result<bool> {
        let path = self.path_for(country, year)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Creates the entry's directories if needed and opens a sink for its content.
    pub async fn acquire_write_sink(&self, country: &str, year: &str) -> Result<CacheSink> {
        let dir = self.entry_dir(country, year)?;
        fs::create_dir_all(&dir).await?;

        let partial = dir.join(PARTIAL_FILE);
        let file = File::create(&partial).await?;
        debug!("Opened cache sink at {}", partial.display());

        Ok(CacheSink {
            file: Some(BufWriter::new(file)),
            partial,
            target: dir.join(CACHE_FILE),
            bytes_written: 0,
            committed: false,
        })
    }

    pub async fn read(&self, country: &str, year: &str) -> Result<String> {
        let path = self.path_for(country, year)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RankingError::NotFound {
                country: country.to_string(),
                year: year.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn entry_dir(&self, country: &str, year: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join(key_component(country)?.as_ref())
            .join(key_component(year)?.as_ref()))
    }
}

/// Maps one key component onto exactly one directory name.
///
/// Plain names are used as they are. A name that holds a path separator, NUL or
/// `%`, or that is `.`/`..`, is percent-encoded; plain names never contain `%`,
/// so two different keys never share a directory.
fn key_component(value: &str) -> Result<Cow<'_, str>> {
    if value.is_empty() {
        return Err(RankingError::InvalidKey(value.to_string()));
    }
    match value {
        "." => Ok(Cow::Borrowed("%2E")),
        ".." => Ok(Cow::Borrowed("%2E%2E")),
        _ if value.contains(['/', '\\', '\0', '%']) => Ok(urlencoding::encode(value)),
        _ => Ok(Cow::Borrowed(value)),
    }
}

/// Append-only destination for one cache entry.
///
/// Nothing is visible under the entry's final name until [`finish`](Self::finish)
/// succeeds. Dropping an unfinished sink deletes the partial file.
#[derive(Debug)]
pub struct CacheSink {
    file: Option<BufWriter<File>>,
    partial: PathBuf,
    target: PathBuf,
    bytes_written: u64,
    committed: bool,
}

impl CacheSink {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            RankingError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "cache sink already closed",
            ))
        })?;
        file.write_all(chunk).await?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flushes, syncs and moves the content into place. Returns the stored size.
    pub async fn finish(mut self) -> Result<u64> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.get_ref().sync_all().await?;
        }

        // Entries must read back as text
        let raw = fs::read(&self.partial).await?;
        let size = match String::from_utf8(raw) {
            Ok(_) => self.bytes_written,
            Err(e) => {
                warn!(
                    "Content for {} is not valid UTF-8, storing a lossy conversion",
                    self.target.display()
                );
                let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
                fs::write(&self.partial, lossy.as_bytes()).await?;
                lossy.len() as u64
            }
        };

        // Publish
        fs::rename(&self.partial, &self.target).await?;
        self.committed = true;
        debug!("Committed cache entry {} ({} bytes)", self.target.display(), size);
        Ok(size)
    }
}

impl Drop for CacheSink {
    fn drop(&mut self) {
        if !self.committed {
            drop(self.file.take());
            let _ = std::fs::remove_file(&self.partial);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KeyCache::new(dir.path());

        let mut sink = cache.acquire_write_sink("Kenya", "2021").await.unwrap();
        sink.write(b"<html>...</html>").await.unwrap();
        sink.finish().await.unwrap();

        assert_eq!(cache.read("Kenya", "2021").await.unwrap(), "<html>...</html>");
        assert_eq!(
            cache.path_for("Kenya", "2021").unwrap(),
            dir.path().join(".cache").join("Kenya").join("2021").join("index.html")
        );
    }

    #[tokio::test]
    async fn entry_only_exists_after_finish() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KeyCache::new(dir.path());
        assert!(!cache.exists("Brazil", "2019").await.unwrap());

        let mut sink = cache.acquire_write_sink("Brazil", "2019").await.unwrap();
        assert!(!cache.exists("Brazil", "2019").await.unwrap());
        sink.write(b"<table>").await.unwrap();
        assert!(!cache.exists("Brazil", "2019").await.unwrap());
        sink.write(b"</table>").await.unwrap();
        assert_eq!(sink.bytes_written(), 15);
        assert!(!cache.exists("Brazil", "2019").await.unwrap());

        let size = sink.finish().await.unwrap();
        assert_eq!(size, 15);
        assert!(cache.exists("Brazil", "2019").await.unwrap());
    }

    #[tokio::test]
    async fn dropped_sink_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KeyCache::new(dir.path());

        let mut sink = cache.acquire_write_sink("Peru", "2017").await.unwrap();
        sink.write(b"<html>half").await.unwrap();
        drop(sink);

        assert!(!cache.exists("Peru", "2017").await.unwrap());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join(".cache/Peru/2017"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn reading_missing_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KeyCache::new(dir.path());

        match cache.read("Rwanda", "2020").await {
            Err(RankingError::NotFound { country, year }) => {
                assert_eq!(country, "Rwanda");
                assert_eq!(year, "2020");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn second_sink_for_existing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KeyCache::new(dir.path());

        let mut first = cache.acquire_write_sink("Colombia", "2020").await.unwrap();
        first.write(b"one").await.unwrap();
        first.finish().await.unwrap();

        let mut second = cache.acquire_write_sink("Colombia", "2021").await.unwrap();
        second.write(b"two").await.unwrap();
        second.finish().await.unwrap();

        assert_eq!(cache.read("Colombia", "2020").await.unwrap(), "one");
        assert_eq!(cache.read("Colombia", "2021").await.unwrap(), "two");
    }

    #[tokio::test]
    async fn invalid_bytes_are_stored_as_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KeyCache::new(dir.path());

        let mut sink = cache.acquire_write_sink("Honduras", "2018").await.unwrap();
        sink.write(&[b'C', b'a', b'f', 0xE9]).await.unwrap();
        sink.finish().await.unwrap();

        assert_eq!(cache.read("Honduras", "2018").await.unwrap(), "Caf\u{FFFD}");
    }

    #[test]
    fn plain_keys_map_to_plain_directories() {
        let cache = KeyCache::new("/tmp/coe");
        assert_eq!(cache.root(), Path::new("/tmp/coe/.cache"));
        assert_eq!(
            cache.path_for("Costa Rica", "2016").unwrap(),
            Path::new("/tmp/coe/.cache/Costa Rica/2016/index.html")
        );
        assert!(matches!(
            cache.path_for("", "2016"),
            Err(RankingError::InvalidKey(_))
        ));
    }

    #[test]
    fn unsafe_components_are_encoded_to_one_level() {
        let cache = KeyCache::new("/tmp/coe");
        let dir_of = |country: &str| {
            cache
                .path_for(country, "2016")
                .unwrap()
                .parent()
                .and_then(|p| p.parent())
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap()
        };

        assert_eq!(dir_of("."), "%2E");
        assert_eq!(dir_of(".."), "%2E%2E");
        assert_eq!(dir_of("Papua/New Guinea"), "Papua%2FNew%20Guinea");
        assert_eq!(dir_of("a\\b"), "a%5Cb");
        // An already-encoded looking name gets its own directory
        assert_eq!(dir_of("a%2Fb"), "a%252Fb");
    }

    #[tokio::test]
    async fn key_with_separator_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KeyCache::new(dir.path());

        let mut sink = cache.acquire_write_sink("Papua/New Guinea", "2019/20").await.unwrap();
        sink.write(b"<html>png</html>").await.unwrap();
        sink.finish().await.unwrap();

        assert!(cache.exists("Papua/New Guinea", "2019/20").await.unwrap());
        assert!(!cache.exists("Papua", "2019/20").await.unwrap());
        assert_eq!(
            cache.read("Papua/New Guinea", "2019/20").await.unwrap(),
            "<html>png</html>"
        );
    }
}
