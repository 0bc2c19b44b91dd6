//! Dictionary matching and rotation helpers.

use crate::{BitMatrix, Dictionary, DictionaryProvider};

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and dictionary code (after rotation).
    pub hamming: u8,
}

/// Rotation-aware matcher for one dictionary.
///
/// All four rotations of every code are precomputed; lookup scans them
/// linearly and stops at the first exact hit.
#[derive(Clone, Debug)]
pub struct Matcher {
    name: String,
    side: usize,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher for the given dictionary and Hamming threshold.
    pub fn new(dict: &Dictionary, max_hamming: u8) -> Self {
        let side = dict.interior_size();
        let rotated = dict
            .codes()
            .iter()
            .map(|&base| {
                [
                    rotate_code_u64(base, side, 0),
                    rotate_code_u64(base, side, 1),
                    rotate_code_u64(base, side, 2),
                    rotate_code_u64(base, side, 3),
                ]
            })
            .collect();

        Self {
            name: dict.name.clone(),
            side,
            max_hamming,
            rotated,
        }
    }

    /// Name of the dictionary this matcher was built from.
    #[inline]
    pub fn dictionary_name(&self) -> &str {
        &self.name
    }

    /// Maximum Hamming distance allowed for matches.
    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Find the best match within `max_hamming`.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;

        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let h = (observed ^ cand).count_ones() as u8;
                if h > self.max_hamming {
                    continue;
                }
                let m = Match {
                    id: id as u32,
                    rotation: rot as u8,
                    hamming: h,
                };
                match best {
                    None => {
                        best = Some(m);
                        if h == 0 {
                            return best;
                        }
                    }
                    Some(prev) => {
                        if m.hamming < prev.hamming {
                            best = Some(m);
                            if m.hamming == 0 {
                                return best;
                            }
                        }
                    }
                }
            }
        }

        best
    }

    /// Match a bit grid; `None` if its side differs from the dictionary's.
    pub fn match_bits(&self, observed: &BitMatrix) -> Option<Match> {
        if observed.side() != self.side {
            return None;
        }
        self.match_code(observed.code())
    }
}

/// Rotate a code stored in row-major bits: `idx = y * N + x`.
///
/// Rotation `1` is a clockwise quarter turn, `3` a counter-clockwise one.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    #[inline]
    fn get(code: u64, idx: usize) -> u64 {
        (code >> idx) & 1
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                0 => (x, y),
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            let sidx = sy * n + sx;
            let didx = y * n + x;
            out |= get(code, sidx) << didx;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Dictionary {
        Dictionary::from_bit_strings(
            "TEST_4X4_3",
            6,
            1,
            &["0110011101001010", "1110010101001111", "0111100101100100"],
        )
        .expect("dict")
    }

    #[test]
    fn rotate_four_times_is_identity() {
        let code = 0x0123_4567_89ab_cdef_u64;
        let n = 8;
        let r = rotate_code_u64(code, n, 1);
        let r = rotate_code_u64(r, n, 1);
        let r = rotate_code_u64(r, n, 1);
        let r = rotate_code_u64(r, n, 1);
        assert_eq!(code, r);
    }

    #[test]
    fn matcher_finds_rotated_code() {
        let dict = dict();
        let matcher = Matcher::new(&dict, 0);

        let base = dict.codes()[1];
        let observed = rotate_code_u64(base, dict.interior_size(), 1);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!(m.id, 1);
        assert_eq!(m.rotation, 1);
        assert_eq!(m.hamming, 0);
    }

    #[test]
    fn matcher_respects_threshold_and_side() {
        let dict = dict();
        let strict = Matcher::new(&dict, 0);
        let tolerant = Matcher::new(&dict, 1);

        let flipped = dict.codes()[2] ^ 1;
        assert!(strict.match_code(flipped).is_none());
        let m = tolerant.match_code(flipped).expect("match");
        assert_eq!((m.id, m.hamming), (2, 1));

        let wrong_side = BitMatrix::filled(5, true).expect("grid");
        assert!(tolerant.match_bits(&wrong_side).is_none());
    }
}
