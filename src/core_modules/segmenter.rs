// THEORY:
// The `segmenter` is the run detector of the sorter. Given the mask values along one
// traversal line, it finds every maximal stretch of `true` and keeps the ones that are
// long enough to be worth sorting.
//
// Key principles:
// 1.  **Maximal runs**: a run cannot be extended left or right without leaving the line
//     or hitting a `false`. Runs never overlap and come out left to right.
// 2.  **Length gate**: runs shorter than `min_len` are skipped entirely. They are not
//     returned, so the caller never touches them, not even with a trivial sort.
// 3.  **Lazy and restartable**: `find_runs` returns an iterator that scans on demand.
//     Cloning it restarts the scan from wherever the clone was taken.
// 4.  **Stateless utility**: nothing is remembered between lines.

use std::ops::Range;

pub mod segmenter {
    use super::*;

    /// A half-open `start..end` index range into a traversal line.
    pub type Run = Range<usize>;

    /// Lazy left-to-right scan over a boolean line.
    #[derive(Debug, Clone)]
    pub struct Runs<'a> {
        line: &'a [bool],
        min_len: usize,
        cursor: usize,
    }

    impl Iterator for Runs<'_> {
        type Item = Run;

        fn next(&mut self) -> Option<Run> {
            let len = self.line.len();
            while self.cursor < len {
                if !self.line[self.cursor] {
                    self.cursor += 1;
                    continue;
                }

                let start = self.cursor;
                while self.cursor < len && self.line[self.cursor] {
                    self.cursor += 1;
                }

                if self.cursor - start >= self.min_len {
                    return Some(start..self.cursor);
                }
            }
            None
        }
    }

    /// Finds every maximal `true` run of `line` with length at least `min_len`.
    ///
    /// A `min_len` of 0 behaves like 1, since a run always holds at least one index.
    pub fn find_runs(line: &[bool], min_len: usize) -> Runs<'_> {
        Runs {
            line,
            min_len,
            cursor: 0,
        }
    }
}
