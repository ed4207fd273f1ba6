//! Таблица типов результатов операторов LSL.
//!
//! `None` означает недопустимую комбинацию типов операндов.

use crate::ast_core::{BinaryOp, PostfixOp, PrefixOp};
use crate::signatures::LslType;

use LslType::*;

fn numeric(ty: LslType) -> bool { matches!(ty, Integer | Float) }

fn textual(ty: LslType) -> bool { matches!(ty, String | Key) }

/// Тип результата бинарного оператора (без учёта присваиваний).
fn arithmetic(op: BinaryOp, left: LslType, right: LslType) -> Option<LslType> {
    if left.is_void() || right.is_void() {
        return None;
    }
    match op {
        BinaryOp::Add => match (left, right) {
            (Integer, Integer) => Some(Integer),
            (l, r) if numeric(l) && numeric(r) => Some(Float),
            (l, r) if textual(l) && textual(r) => Some(String),
            (Vector, Vector) => Some(Vector),
            (Rotation, Rotation) => Some(Rotation),
            (List, _) | (_, List) => Some(List),
            _ => None,
        },
        BinaryOp::Subtract => match (left, right) {
            (Integer, Integer) => Some(Integer),
            (l, r) if numeric(l) && numeric(r) => Some(Float),
            (Vector, Vector) => Some(Vector),
            (Rotation, Rotation) => Some(Rotation),
            _ => None,
        },
        BinaryOp::Multiply => match (left, right) {
            (Integer, Integer) => Some(Integer),
            (l, r) if numeric(l) && numeric(r) => Some(Float),
            (Vector, r) if numeric(r) => Some(Vector),
            (l, Vector) if numeric(l) => Some(Vector),
            (Vector, Vector) => Some(Float),
            (Vector, Rotation) => Some(Vector),
            (Rotation, Rotation) => Some(Rotation),
            _ => None,
        },
        BinaryOp::Divide => match (left, right) {
            (Integer, Integer) => Some(Integer),
            (l, r) if numeric(l) && numeric(r) => Some(Float),
            (Vector, r) if numeric(r) => Some(Vector),
            (Vector, Rotation) => Some(Vector),
            (Rotation, Rotation) => Some(Rotation),
            _ => None,
        },
        BinaryOp::Modulus => match (left, right) {
            (Integer, Integer) => Some(Integer),
            (Vector, Vector) => Some(Vector),
            _ => None,
        },
        BinaryOp::Equals | BinaryOp::NotEquals => {
            let comparable = left == right
                || (numeric(left) && numeric(right))
                || (textual(left) && textual(right));
            comparable.then_some(Integer)
        }
        BinaryOp::LessThan | BinaryOp::GreaterThan | BinaryOp::LessEquals | BinaryOp::GreaterEquals => {
            (numeric(left) && numeric(right)).then_some(Integer)
        }
        BinaryOp::LogicalAnd
        | BinaryOp::LogicalOr
        | BinaryOp::BitwiseAnd
        | BinaryOp::BitwiseOr
        | BinaryOp::BitwiseXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => (left == Integer && right == Integer).then_some(Integer),
        _ => None,
    }
}

/// Тип результата бинарного выражения, включая присваивания.
pub fn binary_result(op: BinaryOp, left: LslType, right: LslType) -> Option<LslType> {
    if op == BinaryOp::Assign {
        return left.is_assignable_from(right).then_some(left);
    }
    if let Some(base) = op.compound_base() {
        // integer *= float допустим в LSL (результат усекается)
        if op == BinaryOp::MultiplyAssign && left == Integer && right == Float {
            return Some(Integer);
        }
        let result = arithmetic(base, left, right)?;
        return left.is_assignable_from(result).then_some(left);
    }
    arithmetic(op, left, right)
}

pub fn prefix_result(op: PrefixOp, operand: LslType) -> Option<LslType> {
    match op {
        PrefixOp::Not | PrefixOp::BitwiseNot => (operand == Integer).then_some(Integer),
        PrefixOp::Negate => matches!(operand, Integer | Float | Vector | Rotation).then_some(operand),
        PrefixOp::Increment | PrefixOp::Decrement => numeric(operand).then_some(operand),
    }
}

pub fn postfix_result(_op: PostfixOp, operand: LslType) -> Option<LslType> {
    numeric(operand).then_some(operand)
}

pub fn cast_valid(to: LslType, from: LslType) -> bool { to.is_castable_from(from) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_promotions() {
        assert_eq!(binary_result(BinaryOp::Add, Integer, Integer), Some(Integer));
        assert_eq!(binary_result(BinaryOp::Add, Integer, Float), Some(Float));
        assert_eq!(binary_result(BinaryOp::Add, String, Key), Some(String));
        assert_eq!(binary_result(BinaryOp::Add, List, Integer), Some(List));
        assert_eq!(binary_result(BinaryOp::Multiply, Vector, Vector), Some(Float));
        assert_eq!(binary_result(BinaryOp::Multiply, Vector, Rotation), Some(Vector));
        assert_eq!(binary_result(BinaryOp::Subtract, String, String), None);
        assert_eq!(binary_result(BinaryOp::LessThan, Float, Integer), Some(Integer));
        assert_eq!(binary_result(BinaryOp::LogicalAnd, Integer, Float), None);
    }

    #[test]
    fn assignments() {
        assert_eq!(binary_result(BinaryOp::Assign, Float, Integer), Some(Float));
        assert_eq!(binary_result(BinaryOp::Assign, Integer, Float), None);
        assert_eq!(binary_result(BinaryOp::AddAssign, Integer, Float), None);
        assert_eq!(binary_result(BinaryOp::MultiplyAssign, Integer, Float), Some(Integer));
        assert_eq!(binary_result(BinaryOp::AddAssign, List, String), Some(List));
    }

    #[test]
    fn unary() {
        assert_eq!(prefix_result(PrefixOp::Negate, Vector), Some(Vector));
        assert_eq!(prefix_result(PrefixOp::Not, Float), None);
        assert_eq!(postfix_result(PostfixOp::Increment, Float), Some(Float));
        assert_eq!(postfix_result(PostfixOp::Decrement, String), None);
        assert!(cast_valid(String, Vector));
        assert!(!cast_valid(Vector, Integer));
    }
}
