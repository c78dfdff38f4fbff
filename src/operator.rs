//! The closed set of operator kinds, their precedence, and associativity.
//!
//! Precedence classes are small integers where *smaller binds tighter*,
//! mirroring the original implementation's table almost verbatim.

/// A unary or binary operator kind. `colon` is enumerated for completeness
/// but is never produced by the parser (see `DESIGN.md`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Dot,
    Index,
    Call,
    Colon,
    Equal,
    Inequal,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    UnaryPlus,
    UnaryMinus,
    Complement,
    LogicalNot,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Power,
    LeftShift,
    RightShift,
    BitAnd,
    BitOr,
    BitXor,
    LogicalAnd,
    LogicalOr,
}

impl Operator {
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Operator::UnaryPlus | Operator::UnaryMinus | Operator::Complement | Operator::LogicalNot
        )
    }

    /// The source text a reader would write for this operator, used by the
    /// AST pretty printer and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Dot => ".",
            Operator::Index => "[]",
            Operator::Call => "()",
            Operator::Colon => ":",
            Operator::Equal => "==",
            Operator::Inequal => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::UnaryPlus => "+",
            Operator::UnaryMinus => "-",
            Operator::Complement => "~",
            Operator::LogicalNot => "!",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Times => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Power => "**",
            Operator::LeftShift => "<<",
            Operator::RightShift => ">>",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::LogicalAnd => "&&",
            Operator::LogicalOr => "||",
        }
    }

    /// The name the AST pretty printer writes for this operator, e.g.
    /// `(plus 1 2)`.
    pub fn lisp_name(&self) -> &'static str {
        match self {
            Operator::Dot => "dot",
            Operator::Index => "index",
            Operator::Call => "call",
            Operator::Colon => "colon",
            Operator::Equal => "equal",
            Operator::Inequal => "inequal",
            Operator::Greater => "greater",
            Operator::Less => "less",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::LessOrEqual => "less_or_equal",
            Operator::UnaryPlus => "unary_plus",
            Operator::UnaryMinus => "unary_minus",
            Operator::Complement => "complement",
            Operator::LogicalNot => "logical_not",
            Operator::Plus => "plus",
            Operator::Minus => "minus",
            Operator::Times => "times",
            Operator::Divide => "divide",
            Operator::Modulo => "modulo",
            Operator::Power => "power",
            Operator::LeftShift => "left_shift",
            Operator::RightShift => "right_shift",
            Operator::BitAnd => "bit_and",
            Operator::BitOr => "bit_or",
            Operator::BitXor => "bit_xor",
            Operator::LogicalAnd => "logical_and",
            Operator::LogicalOr => "logical_or",
        }
    }
}

/// Which operand, if either, an operator pair should be evaluated as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Left,
    Right,
    Unordered,
}

/// A lower value means a higher precedence (binds tighter).
pub fn precedence(op: Operator) -> i32 {
    match op {
        Operator::Dot | Operator::Index | Operator::Call | Operator::Colon => 1,
        Operator::UnaryPlus | Operator::UnaryMinus | Operator::Complement | Operator::LogicalNot => 3,
        Operator::Power => 4,
        Operator::Times | Operator::Divide | Operator::Modulo => 5,
        Operator::Plus | Operator::Minus => 6,
        Operator::LeftShift | Operator::RightShift => 7,
        Operator::Greater | Operator::Less | Operator::GreaterOrEqual | Operator::LessOrEqual => 8,
        Operator::Equal | Operator::Inequal => 9,
        Operator::BitAnd => 10,
        Operator::BitXor => 11,
        Operator::BitOr => 12,
        Operator::LogicalAnd => 13,
        Operator::LogicalOr => 14,
    }
}

pub fn associativity(precedence: i32) -> Order {
    match precedence {
        4 => Order::Right,
        8 | 9 => Order::Unordered,
        _ => Order::Left,
    }
}

/// Compares the precedence of two operators in a left-vs-right position.
/// `Unordered` means the two are in the same non-associative class and
/// cannot be mixed without parentheses.
pub fn higher_precedence(left_op: Operator, right_op: Operator) -> Order {
    let left = precedence(left_op);
    let right = precedence(right_op);
    if left < right {
        Order::Left
    } else if left > right {
        Order::Right
    } else {
        associativity(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_binds_tighter_than_plus() {
        assert_eq!(higher_precedence(Operator::Plus, Operator::Times), Order::Right);
        assert_eq!(higher_precedence(Operator::Times, Operator::Plus), Order::Left);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(higher_precedence(Operator::Power, Operator::Power), Order::Right);
    }

    #[test]
    fn comparisons_are_non_associative() {
        assert_eq!(higher_precedence(Operator::Less, Operator::Less), Order::Unordered);
        assert_eq!(higher_precedence(Operator::Equal, Operator::Equal), Order::Unordered);
    }

    #[test]
    fn plus_is_left_associative() {
        assert_eq!(higher_precedence(Operator::Plus, Operator::Minus), Order::Left);
    }
}
