// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity bit-packed truth tables.
//!
//! A Boolean function `f(x_0, ..., x_{n-1})` is stored as `2^n` bits packed
//! into 64-bit words. Bit `i` holds the output on the input assignment encoded
//! by `i`, with `x_0` as the least-significant selector bit (it toggles
//! fastest). For `n < 6` only the low `2^n` bits of word 0 are live; the
//! remaining bits are don't-care and are never inspected.
//!
//! The capacity is a const generic so the search loops can keep their working
//! copies on the stack.

use std::fmt;

use crate::acd_error::AcdError;

/// Largest variable count supported by any table in this crate.
pub const MAX_NUM_VARS: u32 = 16;

/// `VAR_MASKS[i]` has a one in every bit position whose assignment sets
/// `x_i = 1`.
const VAR_MASKS: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

/// Returns the number of live 64-bit words for a function of `num_vars`
/// inputs, i.e. `ceil(2^num_vars / 64)`.
#[inline]
pub const fn num_blocks(num_vars: u32) -> usize {
    if num_vars <= 6 {
        1
    } else {
        1usize << (num_vars - 6)
    }
}

/// Mask selecting the low `2^k` bits of a word (`k <= 6`).
#[inline]
pub const fn column_mask(k: u32) -> u64 {
    if k >= 6 { u64::MAX } else { (1u64 << (1u32 << k)) - 1 }
}

/// Mask of the live bits of word 0 for tables with fewer than six variables.
#[inline]
const fn live_mask(num_vars: u32) -> u64 {
    column_mask(num_vars)
}

/// Exchanges the roles of variables `i < j` within a single word.
#[inline]
fn swap_in_word(word: u64, i: u32, j: u32) -> u64 {
    debug_assert!(i < j && j < 6);
    let mi = VAR_MASKS[i as usize];
    let mj = VAR_MASKS[j as usize];
    let keep = !(mi ^ mj);
    let up = mi & !mj;
    let down = !mi & mj;
    let shift = (1u32 << j) - (1u32 << i);
    (word & keep) | ((word & up) << shift) | ((word & down) >> shift)
}

#[derive(Clone)]
pub struct StaticTruthTable<const W: usize> {
    num_vars: u32,
    words: [u64; W],
}

/// Table wide enough for the general decomposition engine (up to 16 inputs).
pub type Tt16 = StaticTruthTable<1024>;

/// Table used by the LUT-cascade engines (up to 11 inputs).
pub type Tt11 = StaticTruthTable<32>;

impl<const W: usize> StaticTruthTable<W> {
    /// Largest variable count that fits in this capacity.
    pub const MAX_VARS: u32 = W.trailing_zeros() + 6;

    /// Returns the constant-zero function of `num_vars` inputs.
    pub fn new(num_vars: u32) -> Self {
        assert!(
            num_vars <= Self::MAX_VARS,
            "StaticTruthTable: {} variables exceed capacity of {}",
            num_vars,
            Self::MAX_VARS
        );
        Self {
            num_vars,
            words: [0u64; W],
        }
    }

    /// Builds a table from its live words (word 0 holds assignments 0..63).
    pub fn from_words(num_vars: u32, words: &[u64]) -> Result<Self, AcdError> {
        if num_vars > Self::MAX_VARS {
            return Err(AcdError::UnsupportedNumVars {
                got: num_vars,
                max: Self::MAX_VARS,
            });
        }
        let want = num_blocks(num_vars);
        if words.len() != want {
            return Err(AcdError::WordCountMismatch {
                num_vars,
                got: words.len(),
                want,
            });
        }
        let mut tt = Self::new(num_vars);
        tt.words[..want].copy_from_slice(words);
        Ok(tt)
    }

    /// Parses a most-significant-digit-first hexadecimal string.
    ///
    /// The last digit holds the outputs for assignments 0..3. Missing leading
    /// digits are treated as zero; extra digits are an error.
    pub fn from_hex(num_vars: u32, text: &str) -> Result<Self, AcdError> {
        if num_vars > Self::MAX_VARS {
            return Err(AcdError::UnsupportedNumVars {
                got: num_vars,
                max: Self::MAX_VARS,
            });
        }
        let text = text.trim();
        let text = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        let digits: Vec<(usize, char)> = text
            .char_indices()
            .filter(|(_, c)| *c != '_' && !c.is_whitespace())
            .collect();
        let max_digits = ((1usize << num_vars) + 3) / 4;
        if digits.len() > max_digits {
            return Err(AcdError::TooManyHexDigits {
                got: digits.len(),
                max: max_digits,
            });
        }
        let mut tt = Self::new(num_vars);
        for (nibble_index, (offset, c)) in digits.iter().rev().enumerate() {
            let value = c.to_digit(16).ok_or(AcdError::InvalidHexDigit {
                digit: *c,
                offset: *offset,
            })? as u64;
            let bit = nibble_index * 4;
            tt.words[bit / 64] |= value << (bit % 64);
        }
        tt.mask_unused_bits();
        Ok(tt)
    }

    /// Returns the projection function `x_var`.
    pub fn nth_var(num_vars: u32, var: u32) -> Self {
        assert!(var < num_vars, "nth_var: variable {var} out of range");
        let mut tt = Self::new(num_vars);
        if var < 6 {
            for w in tt.words_mut() {
                *w = VAR_MASKS[var as usize];
            }
        } else {
            let stride = 1usize << (var - 6);
            for (i, w) in tt.words_mut().iter_mut().enumerate() {
                if (i / stride) % 2 == 1 {
                    *w = u64::MAX;
                }
            }
        }
        tt.mask_unused_bits();
        tt
    }

    #[inline]
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        num_blocks(self.num_vars)
    }

    /// Number of input assignments, `2^num_vars`.
    #[inline]
    pub fn num_bits(&self) -> usize {
        1usize << self.num_vars
    }

    /// The live words of the table.
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words[..self.num_blocks()]
    }

    #[inline]
    pub fn words_mut(&mut self) -> &mut [u64] {
        let n = self.num_blocks();
        &mut self.words[..n]
    }

    #[inline]
    pub fn get_bit(&self, index: usize) -> bool {
        debug_assert!(index < self.num_bits());
        (self.words[index >> 6] >> (index & 63)) & 1 != 0
    }

    #[inline]
    pub fn set_bit(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.num_bits());
        let mask = 1u64 << (index & 63);
        if value {
            self.words[index >> 6] |= mask;
        } else {
            self.words[index >> 6] &= !mask;
        }
    }

    /// Returns the `2^k`-bit column at bound-set address `index`, i.e. bits
    /// `[index * 2^k, (index + 1) * 2^k)`.
    #[inline]
    pub fn column(&self, index: usize, k: u32) -> u64 {
        debug_assert!(k <= 6 && k <= self.num_vars);
        debug_assert!(index < (1usize << (self.num_vars - k)));
        let bit = index << k;
        (self.words[bit >> 6] >> (bit & 63)) & column_mask(k)
    }

    /// Returns true if the function depends on `var`.
    pub fn has_var(&self, var: u32) -> bool {
        debug_assert!(var < self.num_vars);
        if self.num_vars <= 6 || var < 6 {
            let shift = 1u32 << var;
            let mask = VAR_MASKS[var as usize];
            let live = if self.num_vars < 6 {
                live_mask(self.num_vars)
            } else {
                u64::MAX
            };
            return self
                .words()
                .iter()
                .any(|w| ((w >> shift) ^ w) & !mask & live != 0);
        }
        let stride = 1usize << (var - 6);
        let words = self.words();
        let mut base = 0;
        while base < words.len() {
            for i in 0..stride {
                if words[base + i] != words[base + i + stride] {
                    return true;
                }
            }
            base += 2 * stride;
        }
        false
    }

    /// Exchanges input variables `i` and `j` in place.
    ///
    /// The result `g` satisfies `g(.., x_i = a, .., x_j = b, ..) = f(.., x_i =
    /// b, .., x_j = a, ..)`. Swapping twice is the identity.
    pub fn swap_inplace(&mut self, i: u32, j: u32) {
        debug_assert!(i < self.num_vars && j < self.num_vars);
        if i == j {
            return;
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        if j < 6 {
            for w in self.words_mut() {
                *w = swap_in_word(*w, i, j);
            }
        } else if i < 6 {
            let step = 1usize << (j - 6);
            let shift = 1u32 << i;
            let mask = VAR_MASKS[i as usize];
            let words = self.words_mut();
            let mut base = 0;
            while base < words.len() {
                for k in 0..step {
                    let low = words[base + k];
                    let high = words[base + k + step];
                    let low_to_high = (low & mask) >> shift;
                    let high_to_low = (high << shift) & mask;
                    words[base + k] = (low & !mask) | high_to_low;
                    words[base + k + step] = (high & mask) | low_to_high;
                }
                base += 2 * step;
            }
        } else {
            let step_i = 1usize << (i - 6);
            let step_j = 1usize << (j - 6);
            let words = self.words_mut();
            let mut base = 0;
            while base < words.len() {
                let mut k = 0;
                while k < step_j {
                    for l in 0..step_i {
                        words.swap(base + k + l + step_i, base + k + l + step_j);
                    }
                    k += 2 * step_i;
                }
                base += 2 * step_j;
            }
        }
    }

    /// Copies the function into a table with a different capacity.
    pub fn resize<const V: usize>(&self) -> StaticTruthTable<V> {
        let mut out = StaticTruthTable::<V>::new(self.num_vars);
        out.words_mut().copy_from_slice(self.words());
        out
    }

    /// Formats the live bits as a most-significant-digit-first hex string.
    pub fn to_hex(&self) -> String {
        let digits = ((1usize << self.num_vars) + 3) / 4;
        let mut s = String::with_capacity(digits);
        for nibble in (0..digits).rev() {
            let bit = nibble * 4;
            let value = (self.words[bit / 64] >> (bit % 64)) & 0xF;
            let value = if self.num_vars < 2 {
                value & live_mask(self.num_vars)
            } else {
                value
            };
            s.push(char::from_digit(value as u32, 16).unwrap_or('0'));
        }
        s
    }

    fn mask_unused_bits(&mut self) {
        if self.num_vars < 6 {
            self.words[0] &= live_mask(self.num_vars);
        }
    }
}

impl<const W: usize> PartialEq for StaticTruthTable<W> {
    fn eq(&self, other: &Self) -> bool {
        if self.num_vars != other.num_vars {
            return false;
        }
        if self.num_vars < 6 {
            let mask = live_mask(self.num_vars);
            return (self.words[0] ^ other.words[0]) & mask == 0;
        }
        self.words() == other.words()
    }
}

impl<const W: usize> Eq for StaticTruthTable<W> {}

impl<const W: usize> fmt::Debug for StaticTruthTable<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticTruthTable<{}>({}:0x{})", W, self.num_vars, self.to_hex())
    }
}

impl<const W: usize> fmt::Display for StaticTruthTable<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
