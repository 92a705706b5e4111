//! Crossover detection between two aligned series.

use serde::{Deserialize, Serialize};

/// Direction of a crossover at a given bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cross {
    /// `a` moved from at-or-below `b` to strictly above it.
    Above,
    /// `a` moved from at-or-above `b` to strictly below it.
    Below,
    None,
}

impl Cross {
    /// +1, -1 or 0.
    pub fn sign(&self) -> i8 {
        match self {
            Cross::Above => 1,
            Cross::Below => -1,
            Cross::None => 0,
        }
    }

    /// The same event seen from the other series.
    pub fn flip(&self) -> Cross {
        match self {
            Cross::Above => Cross::Below,
            Cross::Below => Cross::Above,
            Cross::None => Cross::None,
        }
    }
}

/// Crossover of `a` over `b` at bar `i`.
///
/// Needs both series defined at `i - 1` and `i`; anything else (including
/// `i == 0`) is `Cross::None`.
pub fn crossover(a: &[Option<f64>], b: &[Option<f64>], i: usize) -> Cross {
    if i == 0 {
        return Cross::None;
    }
    let at = |s: &[Option<f64>], j: usize| s.get(j).copied().flatten();
    let (Some(a_prev), Some(a_cur), Some(b_prev), Some(b_cur)) =
        (at(a, i - 1), at(a, i), at(b, i - 1), at(b, i))
    else {
        return Cross::None;
    };

    if a_prev <= b_prev && a_cur > b_cur {
        Cross::Above
    } else if a_prev >= b_prev && a_cur < b_cur {
        Cross::Below
    } else {
        Cross::None
    }
}
