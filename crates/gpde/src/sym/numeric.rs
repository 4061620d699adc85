use std::hash::{Hash, Hasher};

/// Numeric leaf of a symbolic expression.
///
/// Wraps an `f64` with bitwise equality and hashing so expressions can be
/// used as keys in fold maps and memoization caches. Two NaNs compare equal;
/// `0.0` and `-0.0` compare unequal.
#[derive(Debug, Clone, Copy)]
pub struct Num(pub f64);

impl Num {
    pub const ZERO: Self = Num(0.0);
    pub const ONE: Self = Num(1.0);
    pub const NEGATIVE_ONE: Self = Num(-1.0);

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    pub fn is_one(self) -> bool {
        self.0 == 1.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0.0
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Num {}

impl Hash for Num {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for Num {
    fn from(val: f64) -> Self {
        Num(val)
    }
}

impl From<Num> for f64 {
    fn from(num: Num) -> Self {
        num.0
    }
}
