use std::cmp::{self, Ordering};

pub(crate) type CodePoint = u32;

/// The maximum (inclusive) code point.
pub(crate) const CODE_POINT_MAX: CodePoint = 0x10FFFF;

/// An inclusive, non-empty range of code points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Interval {
    pub(crate) first: CodePoint,
    pub(crate) last: CodePoint,
}

impl Interval {
    pub(crate) const fn new(first: CodePoint, last: CodePoint) -> Interval {
        debug_assert!(first <= last);
        Interval { first, last }
    }

    /// Return whether self is strictly before rhs.
    /// "Strictly" here means there is at least one value after the end of self
    /// and before the start of rhs. Overlapping *or abutting* intervals are
    /// not considered strictly before.
    fn is_strictly_before(self, rhs: Interval) -> bool {
        self.last + 1 < rhs.first
    }

    /// Compare two intervals, treating overlapping or abutting intervals as
    /// equal.
    fn mergecmp(self, rhs: Interval) -> Ordering {
        if self.is_strictly_before(rhs) {
            Ordering::Less
        } else if rhs.is_strictly_before(self) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    pub(crate) fn contains(self, cp: CodePoint) -> bool {
        self.first <= cp && cp <= self.last
    }
}

/// Given that the slice is sorted according to f, return the range of indexes
/// where f indicates equal elements.
fn equal_range_by<T, F>(slice: &[T], mut f: F) -> std::ops::Range<usize>
where
    F: FnMut(&T) -> Ordering,
{
    let left = slice
        .binary_search_by(|v| f(v).then(Ordering::Greater))
        .unwrap_err();
    let right = slice[left..]
        .binary_search_by(|v| f(v).then(Ordering::Less))
        .unwrap_err()
        + left;
    left..right
}

/// A set of code points stored as disjoint, non-abutting, sorted intervals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CodePointSet {
    ivs: Vec<Interval>,
}

impl CodePointSet {
    pub(crate) fn new() -> CodePointSet {
        CodePointSet { ivs: Vec::new() }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ivs.is_empty()
    }

    pub(crate) fn contains(&self, cp: CodePoint) -> bool {
        self.ivs
            .binary_search_by(|iv| {
                if iv.first > cp {
                    Ordering::Greater
                } else if iv.last < cp {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    #[inline]
    fn assert_is_well_formed(&self) {
        if cfg!(debug_assertions) {
            for iv in &self.ivs {
                debug_assert!(iv.last <= CODE_POINT_MAX);
                debug_assert!(iv.first <= iv.last);
            }
            for w in self.ivs.windows(2) {
                debug_assert!(w[0].is_strictly_before(w[1]));
            }
        }
    }

    /// Construct from sorted, disjoint intervals. Note these are not allowed
    /// to even abut.
    pub(crate) fn from_sorted_disjoint_intervals(ivs: Vec<Interval>) -> CodePointSet {
        let res = CodePointSet { ivs };
        res.assert_is_well_formed();
        res
    }

    /// Add an interval of code points to the set.
    pub(crate) fn add(&mut self, new_iv: Interval) {
        // Find the range of intervals that intersect or abut new_iv, merge
        // them with it, and replace them with the merged interval.
        let mergeable = equal_range_by(&self.ivs, |iv| iv.mergecmp(new_iv));
        if mergeable.is_empty() {
            self.ivs.insert(mergeable.start, new_iv);
        } else {
            let merged = self.ivs[mergeable.clone()]
                .iter()
                .fold(new_iv, |acc, iv| Interval {
                    first: cmp::min(acc.first, iv.first),
                    last: cmp::max(acc.last, iv.last),
                });
            self.ivs[mergeable.start] = merged;
            self.ivs.drain(mergeable.start + 1..mergeable.end);
        }
        self.assert_is_well_formed();
    }

    /// Add a single code point to the set.
    pub(crate) fn add_one(&mut self, cp: CodePoint) {
        self.add(Interval::new(cp, cp))
    }

    /// Add another code point set.
    pub(crate) fn add_set(&mut self, rhs: &CodePointSet) {
        for iv in rhs.intervals() {
            self.add(*iv)
        }
    }

    /// \return the intervals
    pub(crate) fn intervals(&self) -> &[Interval] {
        self.ivs.as_slice()
    }

    /// \return the complement of the set within `0..=limit`.
    pub(crate) fn inverted_within(&self, limit: CodePoint) -> CodePointSet {
        let mut inverted_ivs = Vec::new();
        // The first code point *not* in the previous interval.
        let mut start: CodePoint = 0;
        for iv in &self.ivs {
            if iv.first > limit {
                break;
            }
            if start < iv.first {
                inverted_ivs.push(Interval::new(start, iv.first - 1));
            }
            start = iv.last + 1;
        }
        if start <= limit {
            inverted_ivs.push(Interval::new(start, limit));
        }
        CodePointSet::from_sorted_disjoint_intervals(inverted_ivs)
    }

    /// Discard every code point above `limit`.
    pub(crate) fn clamp(&mut self, limit: CodePoint) {
        self.ivs.retain_mut(|iv| {
            if iv.first > limit {
                return false;
            }
            iv.last = cmp::min(iv.last, limit);
            true
        });
        self.assert_is_well_formed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(first: u32, last: u32) -> Interval {
        Interval { first, last }
    }

    #[test]
    fn test_add_merges_overlaps() {
        let mut set = CodePointSet::new();
        set.add(iv(10, 20));
        set.add(iv(30, 40));
        set.add(iv(15, 35));
        assert_eq!(set.intervals(), &[iv(10, 40)]);
    }

    #[test]
    fn test_add_one() {
        let mut set = CodePointSet::new();
        set.add_one(10);
        set.add_one(20);
        set.add_one(15);
        assert_eq!(set.intervals(), &[iv(10, 10), iv(15, 15), iv(20, 20)]);
        // Abutting points coalesce.
        set.add_one(16);
        assert_eq!(set.intervals(), &[iv(10, 10), iv(15, 16), iv(20, 20)]);
    }

    #[test]
    fn test_add_set() {
        let mut set1 = CodePointSet::new();
        set1.add(iv(10, 20));
        set1.add(iv(30, 40));
        let mut set2 = CodePointSet::new();
        set2.add(iv(15, 25));
        set2.add(iv(35, 45));
        set1.add_set(&set2);
        assert_eq!(set1.intervals(), &[iv(10, 25), iv(30, 45)]);
    }

    #[test]
    fn test_inverted_within() {
        let mut set = CodePointSet::new();
        set.add(iv(10, 20));
        set.add(iv(30, 40));
        let inv = set.inverted_within(CODE_POINT_MAX);
        assert_eq!(
            inv.intervals(),
            &[iv(0, 9), iv(21, 29), iv(41, CODE_POINT_MAX)]
        );
        assert_eq!(inv.inverted_within(CODE_POINT_MAX).intervals(), set.intervals());

        // Inversion within a narrow limit drops everything beyond it.
        let inv_byte = set.inverted_within(0xFF);
        assert_eq!(inv_byte.intervals(), &[iv(0, 9), iv(21, 29), iv(41, 0xFF)]);
    }

    #[test]
    fn test_inverted_within_empty_and_full() {
        let empty = CodePointSet::new();
        assert_eq!(empty.inverted_within(0xFF).intervals(), &[iv(0, 0xFF)]);
        let full = empty.inverted_within(CODE_POINT_MAX);
        assert!(full.inverted_within(CODE_POINT_MAX).is_empty());
    }

    #[test]
    fn test_clamp() {
        let mut set = CodePointSet::new();
        set.add(iv(0x61, 0x7A));
        set.add(iv(0xDF, 0x130));
        set.add(iv(0x2000, 0x2100));
        set.clamp(0xFF);
        assert_eq!(set.intervals(), &[iv(0x61, 0x7A), iv(0xDF, 0xFF)]);
    }

    #[test]
    fn test_contains() {
        let mut set = CodePointSet::new();
        set.add(iv(5, 10));
        set.add(iv(20, 20));
        assert!(set.contains(5) && set.contains(10) && set.contains(20));
        assert!(!set.contains(4) && !set.contains(11) && !set.contains(19));
    }
}
