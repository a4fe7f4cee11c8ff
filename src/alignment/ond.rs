// taffy: Streaming, merging and random access for MAF/TAF multiple alignments.
//
// Copyright 2025 The taffy developers.
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! O(ND) wavefront diff between two sequences.
//!
//! Aligns two sequences of lengths `n1` and `n2` given only an equality test
//! `eq(i, j)` between element `i` of the first and element `j` of the second
//! sequence. Gaps cost `gap_score` and mismatches cost `mismatch_score`;
//! matches are free. Runtime is O((n1 + n2) * D) where D is the alignment
//! cost, and memory is spent per wavefront diagonal.
//!
//! The result maps every position of the first sequence to the aligned
//! position of the second sequence, or `None` if it is aligned to a gap.
//! Aligned pairs are either matches or mismatches.
//!
//! ## Usage
//!
//! ```rust
//! use taffy::alignment::ond::align;
//!
//! let a = b"ACGT";
//! let b = b"AGT";
//! let got = align(a.len(), b.len(), |i, j| a[i] == b[j], 1, 1);
//! assert_eq!(got, vec![Some(0), None, Some(1), Some(2)]);
//! ```
//!

const UNREACHABLE: i64 = i64::MIN / 4;

/// Furthest reaching points for a range of diagonals at one score.
#[derive(Debug)]
struct Wavefront {
    min_diagonal: i64,
    max_diagonal: i64,
    // Offset of index 0 of `fpa` in diagonal space.
    origin: i64,
    fpa: Vec<i64>,
}

impl Wavefront {
    fn new(min_diagonal: i64, max_diagonal: i64) -> Self {
        Wavefront {
            min_diagonal, max_diagonal, origin: min_diagonal,
            fpa: vec![UNREACHABLE; (max_diagonal - min_diagonal + 1) as usize],
        }
    }

    fn get(&self, diagonal: i64) -> i64 {
        if diagonal < self.min_diagonal || diagonal > self.max_diagonal {
            UNREACHABLE
        } else {
            self.fpa[(diagonal - self.origin) as usize]
        }
    }

    fn set(&mut self, diagonal: i64, value: i64) {
        self.fpa[(diagonal - self.origin) as usize] = value;
    }
}

struct WavefrontAligner<F: Fn(usize, usize) -> bool> {
    n1: i64,
    n2: i64,
    eq: F,
    gap_score: i64,
    mismatch_score: i64,
    // Indexed by score, None when no wavefront has that score.
    wavefronts: Vec<Option<Wavefront>>,
}

impl<F: Fn(usize, usize) -> bool> WavefrontAligner<F> {
    fn wavefront(&self, score: i64) -> Option<&Wavefront> {
        if score < 0 || score as usize >= self.wavefronts.len() {
            None
        } else {
            self.wavefronts[score as usize].as_ref()
        }
    }

    fn fp(&self, score: i64, diagonal: i64) -> i64 {
        self.wavefront(score).map_or(UNREACHABLE, |wf| wf.get(diagonal))
    }

    /// Slides every diagonal of the wavefront at `score` along matches.
    fn extend(&mut self, score: i64) {
        let (n1, n2) = (self.n1, self.n2);
        let eq = &self.eq;
        if let Some(Some(wf)) = self.wavefronts.get_mut(score as usize) {
            for k in wf.min_diagonal..=wf.max_diagonal {
                let mut x = wf.get(k);
                if x < 0 || x - k < 0 {
                    continue;
                }
                while x < n1 && x - k < n2 && eq(x as usize, (x - k) as usize) {
                    x += 1;
                }
                wf.set(k, x);
            }
        }
    }

    fn done(&self, score: i64) -> bool {
        self.fp(score, self.n1 - self.n2) == self.n1
    }

    /// Computes the next non-empty wavefront and returns its score.
    fn next(&mut self, previous_score: i64) -> i64 {
        let mut s = previous_score + 1;
        while self.wavefront(s - self.gap_score).is_none() && self.wavefront(s - self.mismatch_score).is_none() {
            s += 1;
        }
        let gap = self.wavefront(s - self.gap_score);
        let mismatch = self.wavefront(s - self.mismatch_score);

        let min_diagonal = gap.map_or(i64::MAX, |wf| wf.min_diagonal)
                              .min(mismatch.map_or(i64::MAX, |wf| wf.min_diagonal)) - 1;
        let max_diagonal = gap.map_or(i64::MIN, |wf| wf.max_diagonal)
                              .max(mismatch.map_or(i64::MIN, |wf| wf.max_diagonal)) + 1;

        let mut wf = Wavefront::new(min_diagonal, max_diagonal);
        for k in min_diagonal..=max_diagonal {
            let x = (self.fp(s - self.gap_score, k - 1) + 1)
                .max(self.fp(s - self.gap_score, k + 1))
                .max(self.fp(s - self.mismatch_score, k) + 1);
            // Points outside of the dynamic programming matrix are dropped
            if x >= 0 && x <= self.n1 && x - k >= 0 && x - k <= self.n2 {
                wf.set(k, x);
            }
        }

        if self.wavefronts.len() <= s as usize {
            self.wavefronts.resize_with(s as usize + 1, || None);
        }
        self.wavefronts[s as usize] = Some(wf);
        s
    }

    fn traceback(&self, final_score: i64) -> Vec<Option<usize>> {
        let mut alignment: Vec<Option<usize>> = vec![None; self.n1 as usize];
        let mut t = final_score;
        let mut k = self.n1 - self.n2;
        let mut f = self.n1;
        while k != 0 || f != 0 {
            let a = self.fp(t - self.mismatch_score, k);
            let b = self.fp(t - self.gap_score, k - 1);
            let c = self.fp(t - self.gap_score, k + 1);
            while f > a.max(b + 1).max(c.max(0)) {
                alignment[(f - 1) as usize] = Some((f - k - 1) as usize);
                f -= 1;
            }
            if f == 0 && k == 0 {
                break;
            }
            if a >= b && a >= c {
                // mismatch, the pair was recorded above
                t -= self.mismatch_score;
            } else if b >= c {
                // gap in the second sequence
                k -= 1;
                f -= 1;
                t -= self.gap_score;
            } else {
                // gap in the first sequence
                k += 1;
                t -= self.gap_score;
            }
        }
        alignment
    }
}

/// Aligns two sequences with the O(ND) wavefront algorithm.
///
/// `eq(i, j)` compares element `i` of the first sequence with element `j` of
/// the second. Returns, for each element of the first sequence, the index of
/// the aligned element in the second sequence or `None`.
///
/// Ties in the traceback prefer aligned pairs, then gaps in the second
/// sequence, then gaps in the first sequence.
pub fn align<F: Fn(usize, usize) -> bool>(
    n1: usize,
    n2: usize,
    eq: F,
    gap_score: i64,
    mismatch_score: i64,
) -> Vec<Option<usize>> {
    assert!(gap_score > 0 && mismatch_score > 0);
    let mut aligner = WavefrontAligner {
        n1: n1 as i64, n2: n2 as i64, eq, gap_score, mismatch_score,
        wavefronts: Vec::new(),
    };

    let mut first = Wavefront::new(0, 0);
    first.set(0, 0);
    aligner.wavefronts.push(Some(first));
    aligner.extend(0);

    let mut score = 0;
    while !aligner.done(score) {
        score = aligner.next(score);
        aligner.extend(score);
    }
    aligner.traceback(score)
}

/// Cost of the optimal alignment returned by [align].
pub fn alignment_cost(
    alignment: &[Option<usize>],
    n2: usize,
    eq: impl Fn(usize, usize) -> bool,
    gap_score: i64,
    mismatch_score: i64,
) -> i64 {
    let mut cost = 0;
    let mut aligned = 0;
    for (i, j) in alignment.iter().enumerate() {
        match j {
            Some(j) => {
                aligned += 1;
                if !eq(i, *j) {
                    cost += mismatch_score;
                }
            },
            None => cost += gap_score,
        }
    }
    cost + (n2 - aligned) as i64 * gap_score
}

// Tests
#[cfg(test)]
mod tests {

    fn align_strings(a: &str, b: &str, mismatch: i64) -> Vec<Option<usize>> {
        let (a, b) = (a.as_bytes(), b.as_bytes());
        super::align(a.len(), b.len(), |i, j| a[i] == b[j], 1, mismatch)
    }

    #[test]
    fn align_identical() {
        let got = align_strings("ACGT", "ACGT", 1);
        let expected = vec![Some(0), Some(1), Some(2), Some(3)];
        assert_eq!(got, expected);
    }

    #[test]
    fn align_deletion_in_second() {
        let got = align_strings("ACGT", "AGT", 1);
        let expected = vec![Some(0), None, Some(1), Some(2)];
        assert_eq!(got, expected);
    }

    #[test]
    fn align_insertion_in_second() {
        let got = align_strings("AGT", "ACGT", 1);
        let expected = vec![Some(0), Some(2), Some(3)];
        assert_eq!(got, expected);
    }

    #[test]
    fn align_mismatch_is_paired() {
        let got = align_strings("ACT", "AGT", 1);
        let expected = vec![Some(0), Some(1), Some(2)];
        assert_eq!(got, expected);
    }

    #[test]
    fn align_mismatch_disallowed_uses_gaps() {
        let got = align_strings("ACT", "AGT", 100_000_000);
        assert_eq!(got[0], Some(0));
        assert_eq!(got[1], None);
        assert_eq!(got[2], Some(2));
    }

    #[test]
    fn align_empty_inputs() {
        assert_eq!(align_strings("", "ACG", 1), Vec::<Option<usize>>::new());
        assert_eq!(align_strings("ACG", "", 1), vec![None, None, None]);
        assert_eq!(align_strings("", "", 1), Vec::<Option<usize>>::new());
    }

    #[test]
    fn align_is_monotonic_and_optimal() {
        use super::alignment_cost;

        let a = "GATTACAGATTACAGGG";
        let b = "GATCACATTTACAGG";
        let got = align_strings(a, b, 1);

        let aligned: Vec<usize> = got.iter().flatten().copied().collect();
        assert!(aligned.windows(2).all(|w| w[0] < w[1]));

        let (x, y) = (a.as_bytes(), b.as_bytes());
        let cost = alignment_cost(&got, y.len(), |i, j| x[i] == y[j], 1, 1);
        // Levenshtein distance between the two strings
        assert_eq!(cost, 4);
    }
}
