//! File index snapshots

use crate::file::File;
use rustc_hash::FxHashMap;

/// An immutable snapshot of a file index.
///
/// A `FileSet` is built once from a list of files and never changes; backends
/// publish a fresh snapshot when their index updates. All queries run against
/// the snapshot only and perform no I/O.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    by_id: FxHashMap<String, usize>,
    list: Vec<File>,
}

impl FileSet {
    /// Builds a snapshot from the given files. When two entries share an id,
    /// the later one wins.
    pub fn new(files: impl IntoIterator<Item = File>) -> Self {
        let mut set = FileSet::default();
        for file in files {
            match set.by_id.get(file.id()) {
                Some(&i) => set.list[i] = file,
                None => {
                    set.by_id.insert(file.id().to_owned(), set.list.len());
                    set.list.push(file);
                }
            }
        }
        set
    }

    /// All files in insertion order.
    pub fn all(&self) -> &[File] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The file with the given id.
    pub fn by_id(&self, id: &str) -> Option<&File> {
        self.by_id.get(id).map(|&i| &self.list[i])
    }

    /// The newest file (greatest `mod_time`) with the given name.
    pub fn by_name(&self, name: &str) -> Option<&File> {
        self.list
            .iter()
            .filter(|f| f.name() == name)
            .max_by_key(|f| f.mod_time())
    }

    /// The first file matching name, size and md5. An empty `md5` matches any
    /// digest.
    pub fn by_attr(&self, name: &str, size: i64, md5: &str) -> Option<&File> {
        self.list
            .iter()
            .find(|f| f.name() == name && f.size() == size && (md5.is_empty() || f.md5() == md5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileSet {
        FileSet::new([
            File::new("a", "alpha.dat", 100, 10, "aa"),
            File::new("b", "beta.dat", 200, 20, "bb"),
            File::new("c", "alpha.dat", 300, 10, "cc"),
        ])
    }

    #[test]
    fn by_id_finds_exact_entry() {
        let set = sample();
        assert_eq!(set.by_id("b").map(File::name), Some("beta.dat"));
        assert!(set.by_id("nope").is_none());
    }

    #[test]
    fn by_name_prefers_newest() {
        let set = sample();
        assert_eq!(set.by_name("alpha.dat").map(File::id), Some("c"));
        assert!(set.by_name("missing.dat").is_none());
    }

    #[test]
    fn by_attr_ignores_empty_md5() {
        let set = sample();
        assert_eq!(set.by_attr("alpha.dat", 10, "").map(File::id), Some("a"));
        assert_eq!(set.by_attr("alpha.dat", 10, "cc").map(File::id), Some("c"));
        assert!(set.by_attr("alpha.dat", 11, "").is_none());
        assert!(set.by_attr("alpha.dat", 10, "zz").is_none());
    }

    #[test]
    fn duplicate_ids_collapse_to_last() {
        let set = FileSet::new([
            File::new("x", "old.dat", 1, 1, ""),
            File::new("x", "new.dat", 2, 2, ""),
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.by_id("x").map(File::name), Some("new.dat"));
    }
}
