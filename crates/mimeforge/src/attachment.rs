//! File attachments.
//!
//! Attachments are read eagerly and stored base64-encoded. Content types come
//! from the caller, or from a [`TypeResolver`] keyed by file name.

use crate::encoding::encode_base64;
use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Looks up a MIME type from a file name.
pub trait TypeResolver: Send + Sync {
    /// Returns the content type for `filename`, or an empty string if unknown.
    fn resolve(&self, filename: &str) -> String;
}

/// Resolver that knows no types.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl TypeResolver for NoopResolver {
    fn resolve(&self, _filename: &str) -> String {
        String::new()
    }
}

impl<F> TypeResolver for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn resolve(&self, filename: &str) -> String {
        self(filename)
    }
}

/// Resolver backed by the `mime_guess` extension table.
#[cfg(feature = "mime-guess")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessResolver;

#[cfg(feature = "mime-guess")]
impl TypeResolver for GuessResolver {
    fn resolve(&self, filename: &str) -> String {
        mime_guess::from_path(filename)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default()
    }
}

/// A single attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    content_type: String,
    payload: String,
}

impl Attachment {
    /// Creates an attachment by encoding `data`.
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            payload: encode_base64(data),
        }
    }

    /// Display name used in `name=` and `filename=` parameters.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content type, possibly empty.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Base64 payload on a single line.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Ordered set of attachments.
#[derive(Clone)]
pub struct AttachmentSet {
    items: Vec<Attachment>,
    resolver: Arc<dyn TypeResolver>,
}

impl AttachmentSet {
    /// Creates an empty set with no type resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(NoopResolver)
    }

    /// Creates an empty set using `resolver` for content types.
    #[must_use]
    pub fn with_resolver(resolver: impl TypeResolver + 'static) -> Self {
        Self {
            items: Vec::new(),
            resolver: Arc::new(resolver),
        }
    }

    /// Replaces the type resolver. Existing attachments keep their types.
    pub fn set_resolver(&mut self, resolver: impl TypeResolver + 'static) {
        self.resolver = Arc::new(resolver);
    }

    /// Attaches a file under its base name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read. The set is
    /// unchanged in that case.
    pub fn attach(&mut self, path: impl AsRef<Path>, content_type: Option<&str>) -> Result<()> {
        let path = path.as_ref();
        let name = base_name(path);
        self.attach_file(path, name, content_type)
    }

    /// Attaches a file under the given display name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read.
    pub fn attach_as(
        &mut self,
        path: impl AsRef<Path>,
        name: impl Into<String>,
        content_type: Option<&str>,
    ) -> Result<()> {
        self.attach_file(path.as_ref(), name.into(), content_type)
    }

    /// Attaches everything read from `reader` under the given display name.
    ///
    /// The resolver, if consulted, is keyed by the display name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading fails.
    pub fn attach_reader<R: Read>(
        &mut self,
        mut reader: R,
        name: impl Into<String>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let name = name.into();
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let content_type = self.resolve_type(content_type, &name);
        self.push(Attachment::new(name, content_type, &data), data.len());
        Ok(())
    }

    /// Returns true if no attachments have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over attachments in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.items.iter()
    }

    /// Returns the attachments as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Attachment] {
        &self.items
    }

    fn attach_file(&mut self, path: &Path, name: String, content_type: Option<&str>) -> Result<()> {
        let data = fs::read(path).map_err(|e| Error::attachment(path, e))?;
        let content_type = self.resolve_type(content_type, &path.to_string_lossy());
        self.push(Attachment::new(name, content_type, &data), data.len());
        Ok(())
    }

    fn resolve_type(&self, explicit: Option<&str>, filename: &str) -> String {
        match explicit {
            Some(content_type) => content_type.to_string(),
            None => {
                let resolved = self.resolver.resolve(filename);
                if resolved.is_empty() {
                    tracing::warn!(filename, "No content type resolved for attachment");
                }
                resolved
            }
        }
    }

    fn push(&mut self, attachment: Attachment, size: usize) {
        tracing::debug!(
            name = attachment.name(),
            content_type = attachment.content_type(),
            size,
            "Attachment added"
        );
        self.items.push(attachment);
    }
}

impl Default for AttachmentSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AttachmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentSet")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a AttachmentSet {
    type Item = &'a Attachment;
    type IntoIter = std::slice::Iter<'a, Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn base_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::encoding::decode_base64;
    use std::io::{self, Cursor, Write};
    use tempfile::NamedTempFile;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn temp_file(contents: &[u8], suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_attach_uses_base_name() {
        let file = temp_file(b"report body", ".txt");
        let mut set = AttachmentSet::new();
        set.attach(file.path(), Some("text/plain")).unwrap();

        let attachment = set.iter().next().unwrap();
        let expected = file.path().file_name().unwrap().to_string_lossy();
        assert_eq!(attachment.name(), expected);
        assert_eq!(attachment.content_type(), "text/plain");
        assert_eq!(decode_base64(attachment.payload()).unwrap(), b"report body");
    }

    #[test]
    fn test_attach_without_resolver_has_empty_type() {
        let file = temp_file(b"data", ".bin");
        let mut set = AttachmentSet::new();
        set.attach(file.path(), None).unwrap();
        assert_eq!(set.iter().next().unwrap().content_type(), "");
    }

    #[test]
    fn test_attach_resolver_is_consulted() {
        let file = temp_file(b"\x89PNG", ".png");
        let mut set = AttachmentSet::with_resolver(|name: &str| {
            if name.ends_with(".png") {
                "image/png".to_string()
            } else {
                String::new()
            }
        });
        set.attach(file.path(), None).unwrap();
        assert_eq!(set.iter().next().unwrap().content_type(), "image/png");
    }

    #[test]
    fn test_explicit_type_wins_over_resolver() {
        let file = temp_file(b"x", ".png");
        let mut set = AttachmentSet::with_resolver(|_: &str| "image/png".to_string());
        set.attach(file.path(), Some("application/x-custom")).unwrap();
        assert_eq!(
            set.iter().next().unwrap().content_type(),
            "application/x-custom"
        );
    }

    #[test]
    fn test_attach_as_overrides_name() {
        let file = temp_file(b"abc", ".dat");
        let mut set = AttachmentSet::new();
        set.attach_as(file.path(), "renamed.csv", Some("text/csv"))
            .unwrap();
        assert_eq!(set.iter().next().unwrap().name(), "renamed.csv");
    }

    #[test]
    fn test_attach_reader_resolves_by_name() {
        let mut set = AttachmentSet::with_resolver(|name: &str| {
            if name == "notes.txt" {
                "text/plain".to_string()
            } else {
                String::new()
            }
        });
        set.attach_reader(Cursor::new(b"hello".to_vec()), "notes.txt", None)
            .unwrap();

        let attachment = set.iter().next().unwrap();
        assert_eq!(attachment.content_type(), "text/plain");
        assert_eq!(attachment.payload(), "aGVsbG8=");
    }

    #[test]
    fn test_missing_file_leaves_set_unchanged() {
        let mut set = AttachmentSet::new();
        set.attach_reader(&b"first"[..], "first.txt", Some("text/plain"))
            .unwrap();

        let err = set
            .attach("/definitely/not/here/missing.bin", None)
            .unwrap_err();
        assert!(matches!(err, Error::Attachment { .. }));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_failing_reader_leaves_set_unchanged() {
        let mut set = AttachmentSet::new();
        let err = set.attach_reader(FailingReader, "broken.bin", None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_insertion_order() {
        let mut set = AttachmentSet::new();
        for name in ["a.txt", "b.txt", "c.txt"] {
            set.attach_reader(name.as_bytes(), name, Some("text/plain"))
                .unwrap();
        }
        let names: Vec<_> = (&set).into_iter().map(Attachment::name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(set.len(), 3);

        let slice = set.as_slice();
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[1].name(), "b.txt");
        assert_eq!(decode_base64(slice[2].payload()).unwrap(), b"c.txt");
    }

    #[test]
    fn test_binary_payload_round_trip() {
        let data: Vec<u8> = (0..=255).collect();
        let attachment = Attachment::new("all.bin", "application/octet-stream", &data);
        assert_eq!(decode_base64(attachment.payload()).unwrap(), data);
    }

    #[test]
    fn test_base_name_fallback() {
        assert_eq!(base_name(Path::new("/tmp/dir/file.pdf")), "file.pdf");
        assert_eq!(base_name(Path::new("relative.txt")), "relative.txt");
        assert_eq!(base_name(Path::new("/")), "/");
    }

    #[cfg(feature = "mime-guess")]
    #[test]
    fn test_guess_resolver() {
        assert_eq!(GuessResolver.resolve("photo.jpg"), "image/jpeg");
        assert_eq!(GuessResolver.resolve("/tmp/report.pdf"), "application/pdf");
        assert_eq!(GuessResolver.resolve("unknown.zzzz"), "");
    }
}
