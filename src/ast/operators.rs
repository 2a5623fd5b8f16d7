use crate::ast::Op;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Comparison
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Arithmetic
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Floored modulo (`%`)
    Modulo,
    /// Exponentiation (`^`), right-associative
    Power,

    // Logical
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation (`-`)
    Negate,
    /// Logical negation (`not`)
    Not,
}

/// Minimum binding power of the operand of a prefix `not`.
///
/// The operand takes in comparisons and everything tighter, so `not a == b`
/// negates the comparison while `not a and b` negates only `a`.
pub const NOT_BINDING: u8 = 4;

impl BinOp {
    /// Map an operator token to its binary operator, if it has one.
    pub fn from_op(op: Op) -> Option<BinOp> {
        Some(match op {
            Op::Plus => BinOp::Add,
            Op::Minus => BinOp::Subtract,
            Op::Star => BinOp::Multiply,
            Op::Slash => BinOp::Divide,
            Op::Percent => BinOp::Modulo,
            Op::Caret => BinOp::Power,
            Op::EqEq => BinOp::Equal,
            Op::NotEq => BinOp::NotEqual,
            Op::Lt => BinOp::LessThan,
            Op::Gt => BinOp::GreaterThan,
            Op::LtEq => BinOp::LessEqual,
            Op::GtEq => BinOp::GreaterEqual,
            Op::And => BinOp::And,
            Op::Or => BinOp::Or,
            Op::Not => return None,
        })
    }

    /// Left and right binding power for precedence climbing.
    ///
    /// Left-associative operators bind their right operand one step tighter;
    /// `^` binds it at the same strength so `2^3^2` groups as `2^(3^2)`.
    pub fn binding_power(&self) -> (u8, u8) {
        match self {
            BinOp::Or => (1, 2),
            BinOp::And => (2, 3),
            BinOp::Equal
            | BinOp::NotEqual
            | BinOp::LessThan
            | BinOp::GreaterThan
            | BinOp::LessEqual
            | BinOp::GreaterEqual => (4, 5),
            BinOp::Add | BinOp::Subtract => (5, 6),
            BinOp::Multiply | BinOp::Divide | BinOp::Modulo => (6, 7),
            BinOp::Power => (7, 7),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Power => "^",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}
