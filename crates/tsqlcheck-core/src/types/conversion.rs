//! Conversion rules between base types
//!
//! The table is dense and total: every ordered pair of base types has an
//! outcome. Pairs nobody has described yet are `NOT_IMPLEMENTED`, which the
//! assignment check treats exactly like `IMPLICIT_SAFE`.

use std::fmt;
use std::ops::BitOr;

use super::BaseType;

/// Outcome of converting a value of one base type into another
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversion(u32);

impl Conversion {
    pub const IMPLICIT_SAFE: Conversion = Conversion(0);
    pub const IMPLICIT_LOSSY: Conversion = Conversion(1);
    pub const EXPLICIT: Conversion = Conversion(2);
    pub const CHECK_LENGTH: Conversion = Conversion(4);
    pub const NARROWING: Conversion = Conversion(8);
    pub const NOT_ALLOWED: Conversion = Conversion(16);
    pub const CHECK_CONVERTED_LENGTH: Conversion = Conversion(32);
    pub const NUMERIC_OVERFLOW: Conversion = Conversion(64);
    pub const NOT_IMPLEMENTED: Conversion = Conversion(1 << 16);

    const NAMED: [(Conversion, &'static str); 8] = [
        (Conversion::IMPLICIT_LOSSY, "ImplicitLossy"),
        (Conversion::EXPLICIT, "Explicit"),
        (Conversion::CHECK_LENGTH, "CheckLength"),
        (Conversion::NARROWING, "Narrowing"),
        (Conversion::NOT_ALLOWED, "NotAllowed"),
        (Conversion::CHECK_CONVERTED_LENGTH, "CheckConvertedLength"),
        (Conversion::NUMERIC_OVERFLOW, "NumericOverflow"),
        (Conversion::NOT_IMPLEMENTED, "NotImplemented"),
    ];

    pub const fn union(self, other: Conversion) -> Conversion {
        Conversion(self.0 | other.0)
    }

    /// True if every flag of `flag` is set. `IMPLICIT_SAFE` (no flags) is only
    /// contained in the safe outcome itself.
    pub const fn contains(self, flag: Conversion) -> bool {
        if flag.0 == 0 {
            self.0 == 0
        } else {
            self.0 & flag.0 == flag.0
        }
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for Conversion {
    type Output = Conversion;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "ImplicitSafe");
        }
        let names: Vec<&str> = Conversion::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join(" | "))
    }
}

const COUNT: usize = BaseType::ALL.len();

static TABLE: [[Conversion; COUNT]; COUNT] = build_table();

/// Look up the outcome of converting a `from` value into a `to` slot
pub fn conversion(from: BaseType, to: BaseType) -> Conversion {
    TABLE[from as usize][to as usize]
}

const fn build_table() -> [[Conversion; COUNT]; COUNT] {
    let mut table = [[Conversion::NOT_IMPLEMENTED; COUNT]; COUNT];

    let mut i = 0;
    while i < COUNT {
        let from = BaseType::ALL[i];
        let mut j = 0;
        while j < COUNT {
            let to = BaseType::ALL[j];
            table[i][j] = rule(from, to);
            j += 1;
        }
        i += 1;
    }

    table
}

const fn rule(from: BaseType, to: BaseType) -> Conversion {
    if from.is_string() && to.is_string() {
        if from.is_wide_string() && !to.is_wide_string() {
            return Conversion::CHECK_LENGTH.union(Conversion::NARROWING);
        }
        return Conversion::CHECK_LENGTH;
    }

    if from.is_integer() && to.is_string() {
        return Conversion::CHECK_CONVERTED_LENGTH;
    }

    if from.is_integer() && to.is_integer() {
        if from.integer_width() > to.integer_width() {
            return Conversion::NUMERIC_OVERFLOW;
        }
        return Conversion::IMPLICIT_SAFE;
    }

    if from.is_wide_string() && to.is_integer() {
        return Conversion::IMPLICIT_LOSSY;
    }

    if from as usize == to as usize {
        return Conversion::IMPLICIT_SAFE;
    }

    Conversion::NOT_IMPLEMENTED
}
