//! Input file distribution for the requester pool
//!
//! Requesters call [`FileSource::claim_next`] to take ownership of the next
//! unclaimed input file. The cursor sits behind one short-lived lock, so no
//! file is ever handed to two requesters and no requester holds the lock
//! while it reads a file.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Ordered list of input files with a shared claim cursor
#[derive(Debug)]
pub struct FileSource {
    /// Input files, immutable after construction
    files: Vec<PathBuf>,

    /// Index of the next unclaimed file; only ever increases
    cursor: Mutex<usize>,
}

impl FileSource {
    /// Create a source over the given files, claimed in list order
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            cursor: Mutex::new(0),
        }
    }

    /// Claim the next file, or `None` once every file has been handed out
    pub fn claim_next(&self) -> Option<&Path> {
        let mut cursor = self.cursor.lock();
        let file = self.files.get(*cursor)?;
        *cursor += 1;
        Some(file.as_path())
    }

    /// Total number of input files
    pub fn total(&self) -> usize {
        self.files.len()
    }

    /// Number of files claimed so far
    pub fn claimed(&self) -> usize {
        *self.cursor.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_claims_in_order() {
        let source = FileSource::new(vec!["a.txt".into(), "b.txt".into()]);
        assert_eq!(source.total(), 2);

        assert_eq!(source.claim_next(), Some(Path::new("a.txt")));
        assert_eq!(source.claim_next(), Some(Path::new("b.txt")));
        assert_eq!(source.claim_next(), None);
        assert_eq!(source.claim_next(), None);

        // Cursor does not move past the end
        assert_eq!(source.claimed(), 2);
    }

    #[test]
    fn test_empty_source() {
        let source = FileSource::new(Vec::new());
        assert_eq!(source.claim_next(), None);
        assert_eq!(source.claimed(), 0);
    }

    #[test]
    fn test_concurrent_claims_exactly_once() {
        const FILES: usize = 1000;
        const THREADS: usize = 8;

        let files: Vec<PathBuf> = (0..FILES).map(|i| format!("names{i}.txt").into()).collect();
        let source = Arc::new(FileSource::new(files.clone()));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let source = Arc::clone(&source);
                thread::spawn(move || {
                    let mut mine = Vec::new();
                    while let Some(path) = source.claim_next() {
                        mine.push(path.to_path_buf());
                    }
                    mine
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }

        assert_eq!(all.len(), FILES);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), FILES);
        assert_eq!(unique, files.iter().collect());
        assert_eq!(source.claimed(), FILES);
    }
}
