//! Longest-common-subsequence alignment over fragment sequences.
//!
//! The table is O(|a|·|b|) in time and space. Inputs are the fragments of a
//! single utterance, which stay well under a hundred entries in practice.

/// Which sequence of an alignment a fragment index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The first sequence passed to [`align`] (the original text).
    Original,
    /// The second sequence passed to [`align`] (updated or manual text).
    Revised,
}

/// Index pairs `(original, revised)` of fragments considered unchanged.
///
/// Pairs are strictly increasing in both coordinates and the paired fragments
/// are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    pairs: Vec<(usize, usize)>,
}

impl Alignment {
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns, for a sequence of `len` fragments on `side`, which indices
    /// take part in the alignment.
    pub fn matched_mask(&self, side: Side, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for &(orig, rev) in &self.pairs {
            let idx = match side {
                Side::Original => orig,
                Side::Revised => rev,
            };
            if let Some(slot) = mask.get_mut(idx) {
                *slot = true;
            }
        }
        mask
    }
}

/// Dynamic-programming table where cell `(i, j)` holds the LCS length of the
/// first `i` fragments of `a` and the first `j` fragments of `b`.
#[derive(Debug, Clone)]
pub struct LcsTable {
    rows: usize,
    cols: usize,
    cells: Vec<usize>,
}

impl LcsTable {
    pub fn build<T: PartialEq>(a: &[T], b: &[T]) -> Self {
        let rows = a.len() + 1;
        let cols = b.len() + 1;
        let mut table = Self { rows, cols, cells: vec![0; rows * cols] };

        for i in 1..rows {
            for j in 1..cols {
                let value = if a[i - 1] == b[j - 1] {
                    table.get(i - 1, j - 1) + 1
                } else {
                    table.get(i - 1, j).max(table.get(i, j - 1))
                };
                table.cells[i * cols + j] = value;
            }
        }
        table
    }

    /// Cell value at `(i, j)`. Panics if either coordinate is out of range.
    pub fn get(&self, i: usize, j: usize) -> usize {
        assert!(i < self.rows && j < self.cols, "LcsTable index ({i}, {j}) out of range");
        self.cells[i * self.cols + j]
    }

    /// LCS length of the full sequences.
    pub fn lcs_len(&self) -> usize {
        self.get(self.rows - 1, self.cols - 1)
    }

    /// Walks back from the bottom-right corner collecting matched pairs.
    ///
    /// On a mismatch the walk moves toward the larger neighbour; equal values
    /// move up, consuming `a` first. Highlighting of repeated fragments
    /// depends on this order, so it must stay fixed.
    fn backtrack<T: PartialEq>(&self, a: &[T], b: &[T]) -> Alignment {
        let mut pairs = Vec::with_capacity(self.lcs_len());
        let (mut i, mut j) = (a.len(), b.len());

        while i > 0 && j > 0 {
            if a[i - 1] == b[j - 1] {
                pairs.push((i - 1, j - 1));
                i -= 1;
                j -= 1;
            } else if self.get(i - 1, j) >= self.get(i, j - 1) {
                i -= 1;
            } else {
                j -= 1;
            }
        }

        pairs.reverse();
        Alignment { pairs }
    }
}

/// Aligns two fragment sequences, returning a longest set of unchanged pairs.
pub fn align<T: PartialEq>(a: &[T], b: &[T]) -> Alignment {
    LcsTable::build(a, b).backtrack(a, b)
}
