//! Structural contracts of the syntax tree, signatures and the priority queue.

use lsl_analyzer::ast_core::{ScopeType, Stmt, LabelStatement};
use lsl_analyzer::collections::PriorityQueue;
use lsl_analyzer::core::{ContractError, QueueError, SignatureError};
use lsl_analyzer::signatures::{FunctionSignature, Parameter, SignatureSubset};
use lsl_analyzer::{LslParser, LslType, NodeId, SyntaxKind, SyntaxTree, TreeDumper};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

const SCRIPT: &str = r#"
integer counter;

integer bump(integer by) {
    counter += by;
    if (counter > 10) {
        jump reset;
    }
    return counter;
    @reset;
    counter = 0;
    return counter;
}

default {
    state_entry() {
        integer i;
        for (i = 0; i < 3; i++) {
            llOwnerSay((string)bump(i));
        }
    }
}
"#;

fn parse(code: &str) -> SyntaxTree {
    LslParser::new().parse_text(code).unwrap().tree
}

#[test]
fn clone_is_structurally_equal_and_detached() {
    let mut tree = parse(SCRIPT);
    let root = tree.root().unwrap();
    let before = tree.len();
    let original_ids: HashSet<NodeId> = tree.preorder(root).into_iter().collect();

    let copy = tree.clone_subtree(root).unwrap();

    assert_eq!(tree.parent(copy), None);
    assert_eq!(tree.root(), Some(root));
    let copied_ids: HashSet<NodeId> = tree.preorder(copy).into_iter().collect();
    assert!(original_ids.is_disjoint(&copied_ids));
    assert_eq!(tree.len(), before + copied_ids.len());

    let mut dumper = TreeDumper::new().with_annotations(true);
    assert_eq!(dumper.dump(&tree, copy), dumper.dump(&tree, root));
}

#[test]
fn every_parent_chain_reaches_the_root() {
    let tree = parse(SCRIPT);
    let root = tree.root().unwrap();
    for id in tree.preorder(root) {
        assert_eq!(tree.top_ancestor(id), root, "node {} is not connected", id);
        for child in tree.children(id) {
            assert_eq!(tree.parent(child), Some(id));
        }
    }
}

#[test]
fn label_back_references_match_jumps_and_do_not_leak_on_clone() {
    let mut tree = parse(SCRIPT);
    let label = tree
        .iter()
        .find(|(_, n)| n.syntax_kind() == SyntaxKind::LabelStatement)
        .map(|(id, _)| id)
        .unwrap();
    let jumps: Vec<NodeId> = tree
        .iter()
        .filter(|(_, n)| n.syntax_kind() == SyntaxKind::JumpStatement)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(tree.jumps_to(label), jumps.as_slice());

    let function = tree.enclosing(label, SyntaxKind::FunctionDeclaration).unwrap();
    let copy = tree.clone_subtree(function).unwrap();
    assert_eq!(tree.jumps_to(label), jumps.as_slice());

    let copied_label = tree
        .preorder(copy)
        .into_iter()
        .find(|id| tree.syntax_kind(*id) == SyntaxKind::LabelStatement)
        .unwrap();
    assert_ne!(copied_label, label);
    assert_eq!(tree.jumps_to(copied_label).len(), 1);
    assert!(!jumps.contains(&tree.jumps_to(copied_label)[0]));
}

#[test]
fn parent_can_only_be_set_once() {
    let mut tree = SyntaxTree::new();
    let first = tree.code_scope(ScopeType::AnonymousBlock, false, None);
    let second = tree.code_scope(ScopeType::AnonymousBlock, false, None);
    let statement = tree.add(Stmt::SemicolonStatement, None).unwrap();
    tree.push_statement(first, statement).unwrap();

    let err = tree.push_statement(second, statement).unwrap_err();
    assert!(matches!(err, ContractError::ParentAlreadySet { node, .. } if node == statement));
}

#[test]
fn jump_to_detached_label_is_rejected() {
    let mut tree = SyntaxTree::new();
    let label = tree.add(Stmt::LabelStatement(LabelStatement { name: "nowhere".into() }), None).unwrap();
    let err = tree.jump(label, None).unwrap_err();
    assert_eq!(err, ContractError::DetachedJumpTarget { label });
}

#[test]
fn library_call_has_no_definition() {
    let tree = parse("default { state_entry() { llOwnerSay(\"hi\"); } }");
    let call = tree
        .iter()
        .find(|(_, n)| n.syntax_kind() == SyntaxKind::LibraryFunctionCall)
        .map(|(id, _)| id)
        .unwrap();
    assert_eq!(tree.call_definition(call), Err(ContractError::LibraryCallHasNoDefinition { node: call }));
}

#[test]
fn user_call_resolves_to_its_declaration() {
    let tree = parse(SCRIPT);
    let call = tree
        .iter()
        .find(|(_, n)| n.syntax_kind() == SyntaxKind::UserFunctionCall)
        .map(|(id, _)| id)
        .unwrap();
    let definition = tree.call_definition(call).unwrap().unwrap();
    assert_eq!(tree.syntax_kind(definition), SyntaxKind::FunctionDeclaration);
}

#[test]
fn rebinding_a_definition_is_rejected() {
    let mut tree = parse("f() { }\ng() { }\ndefault { state_entry() { } }");
    let f = tree.find_signature("f").unwrap();
    let declarations: Vec<NodeId> = tree
        .iter()
        .filter(|(_, n)| n.syntax_kind() == SyntaxKind::FunctionDeclaration)
        .map(|(id, _)| id)
        .collect();
    let bound = tree.signature(f).definition().unwrap();
    tree.bind_definition(f, bound).unwrap();

    let other = declarations.into_iter().find(|d| *d != bound).unwrap();
    let err = tree.bind_definition(f, other).unwrap_err();
    assert!(matches!(err, ContractError::DefinitionAlreadyBound { existing, requested, .. } if existing == bound && requested == other));
}

#[test]
fn duplicate_signatures_are_rejected_by_parameter_types() {
    let mut subset = SignatureSubset::new("test");
    let f_two = FunctionSignature::new(
        LslType::Void,
        "f",
        vec![Parameter::new(LslType::Integer, "a"), Parameter::new(LslType::String, "b")],
    );
    subset.add_function(f_two.clone()).unwrap();

    let renamed = FunctionSignature::new(
        LslType::Void,
        "f",
        vec![Parameter::new(LslType::Integer, "x"), Parameter::new(LslType::String, "y")],
    );
    assert!(matches!(subset.add_function(renamed), Err(SignatureError::Duplicate { .. })));

    let f_one = FunctionSignature::new(LslType::Void, "f", vec![Parameter::new(LslType::Integer, "a")]);
    subset.add_function(f_one).unwrap();
    assert_eq!(subset.functions("f").len(), 2);
}

#[test]
fn priority_queue_orders_and_merges() {
    let mut queue = PriorityQueue::new();
    for (priority, value) in [(5, "e"), (1, "a"), (3, "c"), (2, "b"), (4, "d")] {
        queue.enqueue(priority, value);
    }
    assert_eq!(queue.len(), 5);
    assert_eq!(queue.peek_value(), Ok(&"a"));
    let drained: Vec<&str> = std::iter::from_fn(|| queue.dequeue_value().ok()).collect();
    assert_eq!(drained, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(queue.dequeue(), Err(QueueError::Empty));

    let left: PriorityQueue<i32, &str> = [(1, "a"), (3, "b")].into_iter().collect();
    let right: PriorityQueue<i32, &str> = [(2, "c")].into_iter().collect();
    let merged = PriorityQueue::merge(&left, &right).unwrap();
    let values: Vec<&str> = merged.into_sorted_vec().into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec!["a", "c", "b"]);
    assert_eq!(left.len(), 2);
}

#[test]
fn error_nodes_are_ordered_by_offset() {
    let code = "default { state_entry() { llOwnerSay(missing_one); integer x = \"s\"; llOwnerSay(missing_two); } }";
    let result = LslParser::new().parse_text(code).unwrap();
    let tree = &result.tree;
    let offsets: Vec<usize> = tree
        .error_nodes()
        .into_iter()
        .map(|id| tree.node(id).range().unwrap().start_index())
        .collect();
    assert!(offsets.len() >= 3);
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    assert_eq!(offsets, sorted);
}
