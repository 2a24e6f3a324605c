//! Immutable file metadata

/// A single file in storage.
///
/// `File` is an immutable record: all fields are fixed at construction and
/// values can be cloned and shared across threads freely. Two files are equal
/// when their ids are equal, regardless of the remaining attributes.
#[derive(Debug, Clone)]
pub struct File {
    id: String,
    name: String,
    mod_time: i64,
    size: i64,
    md5: String,
}

impl File {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mod_time: i64,
        size: i64,
        md5: impl Into<String>,
    ) -> Self {
        File {
            id: id.into(),
            name: name.into(),
            mod_time,
            size,
            md5: md5.into(),
        }
    }

    /// Unique, opaque id of the file.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the file. Names are not unique; several files may share one.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last change of the file (unix time, seconds). For files that never
    /// changed this is the creation time.
    pub fn mod_time(&self) -> i64 {
        self.mod_time
    }

    /// File size in bytes.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Hex md5 digest of the content. Empty when unknown.
    pub fn md5(&self) -> &str {
        &self.md5
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for File {}
