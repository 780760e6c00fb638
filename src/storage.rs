// SPDX-License-Identifier: GPL-3.0-only

//! Shared picture storage
//!
//! A small image collection rooted at the user's XDG Pictures directory.
//! Entries are addressed by opaque [`ImageReference`]s and created from an
//! [`ImageDescriptor`] (display name, MIME type, relative path), mirroring a
//! media index: `insert` reserves an entry, `write` fills it, `delete`
//! removes it.

use crate::constants::storage::{
    COLLECTION_DIR, DEFAULT_ALBUM, DISPLAY_NAME_FORMAT, JPEG_MIME, MAX_NAME_ATTEMPTS,
    PARTIAL_PREFIX,
};
use chrono::{DateTime, Local};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where and under which name a new entry should be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Name without extension, e.g. `2024-03-09-07-05-01-042`
    pub display_name: String,
    /// MIME type; selects the file extension
    pub mime_type: String,
    /// Path relative to the storage root's parent, e.g. `Pictures/CameraX-Image`
    pub relative_path: PathBuf,
}

impl ImageDescriptor {
    /// JPEG descriptor named after `time`
    pub fn jpeg_at(time: DateTime<Local>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: time.format(DISPLAY_NAME_FORMAT).to_string(),
            mime_type: JPEG_MIME.to_string(),
            relative_path: relative_path.into(),
        }
    }

    /// JPEG descriptor named after the current local time
    pub fn timestamped(relative_path: impl Into<PathBuf>) -> Self {
        Self::jpeg_at(Local::now(), relative_path)
    }

    /// File extension for the descriptor's MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            _ => "bin",
        }
    }
}

/// Opaque locator of a stored image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    path: PathBuf,
}

impl ImageReference {
    /// Wrap an existing file as a reference
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Filesystem location of the entry
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name (file name without extension)
    pub fn display_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Base display name and collision suffix (`X (2)` → `("X", 2)`)
    fn name_order(&self) -> (String, u32) {
        let name = self.display_name();
        if let Some(base) = name.strip_suffix(')')
            && let Some((base, n)) = base.rsplit_once(" (")
            && let Ok(n) = n.parse::<u32>()
        {
            return (base.to_string(), n);
        }
        (name, 0)
    }

    /// `file://` URI of the entry
    pub fn uri(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Picture collection rooted at a directory (normally XDG Pictures)
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    album: PathBuf,
}

impl ImageStore {
    /// Store rooted at `root`, writing new entries into `album`
    pub fn new(root: impl Into<PathBuf>, album: &str) -> Self {
        Self {
            root: root.into(),
            album: Path::new(COLLECTION_DIR).join(album),
        }
    }

    /// Store rooted at the user's Pictures directory
    pub fn pictures(album: &str) -> Self {
        let root = dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(COLLECTION_DIR)))
            .unwrap_or_else(|| PathBuf::from(COLLECTION_DIR));
        Self::new(root, album)
    }

    /// Absolute album directory
    pub fn album_dir(&self) -> PathBuf {
        self.resolve_dir(&self.album)
    }

    /// Fresh timestamped JPEG descriptor for this store's album
    pub fn descriptor_now(&self) -> ImageDescriptor {
        ImageDescriptor::timestamped(self.album.clone())
    }

    fn resolve_dir(&self, relative: &Path) -> PathBuf {
        // The root already *is* the collection directory
        let relative = relative.strip_prefix(COLLECTION_DIR).unwrap_or(relative);
        self.root.join(relative)
    }

    /// Reserve a new, empty entry for `descriptor`
    ///
    /// Name collisions get a ` (n)` suffix, so two captures within the same
    /// millisecond never overwrite each other.
    pub fn insert(&self, descriptor: &ImageDescriptor) -> io::Result<ImageReference> {
        let dir = self.resolve_dir(&descriptor.relative_path);
        std::fs::create_dir_all(&dir)?;

        let ext = descriptor.extension();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                format!("{}.{}", descriptor.display_name, ext)
            } else {
                format!("{} ({}).{}", descriptor.display_name, attempt, ext)
            };
            let path = dir.join(file_name);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => {
                    debug!(path = %path.display(), "Inserted storage entry");
                    return Ok(ImageReference::from_path(path));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "no free name for {} after {} attempts",
                descriptor.display_name, MAX_NAME_ATTEMPTS
            ),
        ))
    }

    /// Replace the contents of an entry
    ///
    /// Bytes go to a hidden sibling first and are renamed into place, so a
    /// reader never observes a half-written image.
    pub fn write(&self, reference: &ImageReference, bytes: &[u8]) -> io::Result<()> {
        let dir = reference
            .path()
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "entry has no parent"))?;
        let partial = dir.join(format!("{}{}", PARTIAL_PREFIX, uuid::Uuid::new_v4()));

        let result = (|| {
            let mut file = std::fs::File::create(&partial)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            std::fs::rename(&partial, reference.path())
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&partial);
        }
        result
    }

    /// Insert an entry and fill it with `bytes`
    ///
    /// The reserved entry is removed again if writing fails.
    pub fn insert_bytes(
        &self,
        descriptor: &ImageDescriptor,
        bytes: &[u8],
    ) -> io::Result<ImageReference> {
        let reference = self.insert(descriptor)?;
        if let Err(e) = self.write(&reference, bytes) {
            warn!(entry = %reference, error = %e, "Write failed, removing reserved entry");
            let _ = std::fs::remove_file(reference.path());
            return Err(e);
        }
        info!(entry = %reference, size = bytes.len(), "Stored image");
        Ok(reference)
    }

    /// Delete an entry; deleting an entry that is already gone succeeds
    pub fn delete(&self, reference: &ImageReference) -> io::Result<()> {
        match std::fs::remove_file(reference.path()) {
            Ok(()) => {
                info!(entry = %reference, "Deleted storage entry");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(entry = %reference, "Entry already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the entry still exists
    pub fn exists(&self, reference: &ImageReference) -> bool {
        reference.path().is_file()
    }

    /// All visible entries of the album, oldest first
    ///
    /// Names sort by timestamp, then by collision suffix, so `X (1)` comes
    /// after `X`.
    pub fn entries(&self) -> io::Result<Vec<ImageReference>> {
        let dir = self.album_dir();
        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries: Vec<ImageReference> = read_dir
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| ImageReference::from_path(entry.path()))
            .collect();
        entries.sort_by_cached_key(|entry| entry.name_order());
        Ok(entries)
    }

    /// Most recent entry of the album
    pub fn latest(&self) -> Option<ImageReference> {
        self.entries().ok()?.pop()
    }
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::pictures(DEFAULT_ALBUM)
    }
}

/// Load the newest album entry as a gallery button thumbnail
pub async fn load_latest_thumbnail(store: ImageStore) -> Option<cosmic::widget::image::Handle> {
    tokio::task::spawn_blocking(move || {
        let latest = store.latest()?;
        debug!(entry = %latest, "Loading latest thumbnail");

        let img = image::open(latest.path()).ok()?;
        let thumb = img.thumbnail(96, 96).to_rgba8();
        let (width, height) = thumb.dimensions();
        Some(cosmic::widget::image::Handle::from_rgba(
            width,
            height,
            thumb.into_raw(),
        ))
    })
    .await
    .ok()?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ImageStore {
        let root = std::env::temp_dir().join(format!("snapcam-storage-{}", uuid::Uuid::new_v4()));
        ImageStore::new(root, DEFAULT_ALBUM)
    }

    #[test]
    fn test_descriptor_uses_jpeg_and_album_path() {
        let store = temp_store();
        let descriptor = store.descriptor_now();
        assert_eq!(descriptor.mime_type, "image/jpeg");
        assert_eq!(descriptor.extension(), "jpg");
        assert_eq!(
            descriptor.relative_path,
            Path::new("Pictures").join("CameraX-Image")
        );
        assert_eq!(descriptor.display_name.len(), "yyyy-MM-dd-HH-mm-ss-SSS".len());
    }

    #[test]
    fn test_album_dir_is_under_root() {
        let store = ImageStore::new("/tmp/pics", "CameraX-Image");
        assert_eq!(store.album_dir(), PathBuf::from("/tmp/pics/CameraX-Image"));
    }

    #[test]
    fn test_insert_disambiguates_same_name() {
        let store = temp_store();
        let descriptor = ImageDescriptor {
            display_name: "2024-01-01-00-00-00-000".into(),
            mime_type: JPEG_MIME.into(),
            relative_path: store.descriptor_now().relative_path,
        };

        let first = store.insert(&descriptor).unwrap();
        let second = store.insert(&descriptor).unwrap();

        assert_ne!(first, second);
        assert_eq!(second.display_name(), "2024-01-01-00-00-00-000 (1)");
        assert_eq!(store.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_latest_prefers_collision_suffix() {
        let store = temp_store();
        let descriptor = store.descriptor_now();

        let first = store.insert(&descriptor).unwrap();
        let second = store.insert(&descriptor).unwrap();
        let third = store.insert(&descriptor).unwrap();

        assert_eq!(store.entries().unwrap(), vec![first, second, third.clone()]);
        assert_eq!(store.latest(), Some(third));
    }

    #[test]
    fn test_suffix_ordering_is_numeric() {
        let plain = ImageReference::from_path("/a/2024-01-01-00-00-00-000.jpg");
        let second = ImageReference::from_path("/a/2024-01-01-00-00-00-000 (2).jpg");
        let tenth = ImageReference::from_path("/a/2024-01-01-00-00-00-000 (10).jpg");
        let later = ImageReference::from_path("/a/2024-01-01-00-00-00-001.jpg");

        assert!(plain.name_order() < second.name_order());
        assert!(second.name_order() < tenth.name_order());
        assert!(tenth.name_order() < later.name_order());
    }

    #[test]
    fn test_insert_gives_up_when_names_are_exhausted() {
        let store = temp_store();
        let descriptor = store.descriptor_now();
        let dir = store.album_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.jpg", descriptor.display_name)), b"").unwrap();
        for n in 1..MAX_NAME_ATTEMPTS {
            let name = format!("{} ({}).jpg", descriptor.display_name, n);
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let err = store.insert(&descriptor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_write_read_delete() {
        let store = temp_store();
        let reference = store
            .insert_bytes(&store.descriptor_now(), b"not really a jpeg")
            .unwrap();

        assert!(store.exists(&reference));
        assert_eq!(std::fs::read(reference.path()).unwrap(), b"not really a jpeg");
        assert!(reference.uri().starts_with("file://"));

        store.delete(&reference).unwrap();
        assert!(!store.exists(&reference));
        // Second delete is a no-op
        store.delete(&reference).unwrap();
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn test_entries_skip_partial_files() {
        let store = temp_store();
        std::fs::create_dir_all(store.album_dir()).unwrap();
        std::fs::write(store.album_dir().join(".pending-abc"), b"x").unwrap();
        assert!(store.entries().unwrap().is_empty());
        assert!(store.latest().is_none());
    }
}
