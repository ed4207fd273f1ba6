/*!
# Error System

Distinguishable error kinds of the front-end. Syntax errors are *not* here:
they are embedded into the tree as error placeholder nodes and reported as
[`Diagnostic`](crate::diagnostics::Diagnostic) data.
*/

use thiserror::Error;

use crate::ast_core::{NodeId, SyntaxKind};

/// Нарушение структурного контракта дерева.
///
/// Означает ошибку вызывающего кода (например, моста парсер → дерево), а не
/// ошибку в исходном тексте пользователя.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Parent can only be set once.
    #[error("{kind}: parent node already set, it can only be set once (node {node})")]
    ParentAlreadySet { node: NodeId, kind: SyntaxKind },

    /// A jump can only target a label which is already part of the tree.
    #[error("jump target label {label} has no parent, it must be part of the syntax tree prior to being jumped to")]
    DetachedJumpTarget { label: NodeId },

    /// Required child node was omitted.
    #[error("{kind}: required child '{child}' is missing")]
    MissingChild { kind: SyntaxKind, child: &'static str },

    /// Node of another kind was passed where a specific kind is required.
    #[error("expected {expected} node, got {found} (node {node})")]
    UnexpectedKind { node: NodeId, expected: &'static str, found: SyntaxKind },

    /// DefinitionNode requested on a library function call.
    #[error("cannot get a definition node for a library function call (node {node})")]
    LibraryCallHasNoDefinition { node: NodeId },

    /// Pre-defined signature already bound to another declaration.
    #[error("signature '{name}' is already bound to declaration {existing}, cannot rebind to {requested}")]
    DefinitionAlreadyBound { name: String, existing: NodeId, requested: NodeId },

    /// Unknown node id for this tree.
    #[error("node {node} does not belong to this tree")]
    UnknownNode { node: NodeId },
}

/// Ошибки таблиц сигнатур.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A signature with identical key already exists in the subset.
    #[error("duplicate signature '{signature}' in subset '{subset}'")]
    Duplicate { subset: String, signature: String },

    #[error("unknown library subset '{0}'")]
    UnknownSubset(String),

    #[error("cannot parse signature '{text}': {reason}")]
    Parse { text: String, reason: String },
}

/// Ошибки очереди с приоритетом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("priority queue is empty")]
    Empty,

    #[error("priority queues to be merged must have equal comparers")]
    ComparerMismatch,
}

pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_distinguishable() {
        let e = ContractError::ParentAlreadySet { node: NodeId(3), kind: SyntaxKind::ReturnStatement };
        assert!(e.to_string().contains("only be set once"));
        let d = SignatureError::Duplicate { subset: "lsl".into(), signature: "void f(integer)".into() };
        assert!(matches!(d, SignatureError::Duplicate { .. }));
        assert_eq!(QueueError::Empty.to_string(), "priority queue is empty");
    }
}
