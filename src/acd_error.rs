// SPDX-License-Identifier: Apache-2.0

/// Errors reported at the library boundary when a caller hands us malformed
/// input. Infeasible decompositions are not errors; see the engine APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcdError {
    UnsupportedNumVars { got: u32, max: u32 },
    WordCountMismatch { num_vars: u32, got: usize, want: usize },
    TooManyHexDigits { got: usize, max: usize },
    InvalidHexDigit { digit: char, offset: usize },
}

impl std::fmt::Display for AcdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcdError::UnsupportedNumVars { got, max } => {
                write!(f, "acd error: {} variables requested; at most {} supported", got, max)
            }
            AcdError::WordCountMismatch {
                num_vars,
                got,
                want,
            } => write!(
                f,
                "acd error: a {}-variable truth table needs {} words, got {}",
                num_vars, want, got
            ),
            AcdError::TooManyHexDigits { got, max } => {
                write!(f, "acd error: {} hex digits given; at most {} fit", got, max)
            }
            AcdError::InvalidHexDigit { digit, offset } => {
                write!(f, "acd error: invalid hex digit {:?} at offset {}", digit, offset)
            }
        }
    }
}

impl std::error::Error for AcdError {}
