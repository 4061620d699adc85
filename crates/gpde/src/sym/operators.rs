/// Associative n-ary operators. Subtraction and division are represented
/// canonically as addition with a `-1` coefficient and multiplication by a
/// `-1` power, so these two are the only pool operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssocOp {
    Add,
    Mul,
}

impl AssocOp {
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Mul => '*',
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Self::Add => 1,
            Self::Mul => 2,
        }
    }
}

pub const POW_PRECEDENCE: u8 = 3;

/// Known unary functions with closed-form derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Exp,
    Ln,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Self::Exp => "exp",
            Self::Ln => "ln",
        }
    }
}
