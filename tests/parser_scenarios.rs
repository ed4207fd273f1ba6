//! End-to-end scenarios: parsing, analysis passes, formatting and configuration.

use lsl_analyzer::ast_core::{DeadCodeType, NodeKind, Stmt};
use lsl_analyzer::config::AnalyzerConfig;
use lsl_analyzer::diagnostics::codes;
use lsl_analyzer::{LslParser, ParseResult, SourceFormatter, SyntaxKind, TreeDumper};
use pretty_assertions::assert_eq;

const DOOR: &str = r#"
integer gOpen = FALSE;
float gDelay = 5.0;

toggle(integer open) {
    gOpen = open;
    if (gOpen) llSetText("open", <0.0, 1.0, 0.0>, 1.0);
    else llSetText("closed", <1.0, 0.0, 0.0>, 1.0);
}

default {
    state_entry() {
        toggle(FALSE);
    }

    touch_start(integer total) {
        toggle(!gOpen);
        llSetTimerEvent(gDelay);
    }

    timer() {
        llSetTimerEvent(0.0);
        state locked;
    }
}

state locked {
    touch_start(integer total) {
        llOwnerSay("locked");
        state default;
    }
}
"#;

fn codes_of(result: &ParseResult) -> Vec<&str> {
    result.diagnostics.iter().map(|d| d.code.as_str()).collect()
}

#[test]
fn well_formed_script_has_no_diagnostics() {
    let result = LslParser::new().parse_text(DOOR).unwrap();
    assert_eq!(codes_of(&result), Vec::<&str>::new());
    assert!(result.tree.error_nodes().is_empty());

    let tree = &result.tree;
    let unit = match tree.kind(tree.root().unwrap()) {
        NodeKind::Decl(lsl_analyzer::ast_core::Decl::CompilationUnit(unit)) => unit.clone(),
        other => panic!("unexpected root {:?}", other),
    };
    assert_eq!(unit.items.len(), 3);
    assert!(unit.default_state.is_some());
    assert_eq!(unit.states.len(), 1);
}

#[test]
fn formatting_is_idempotent_and_preserves_structure() {
    let parser = LslParser::new();
    let original = parser.parse_text(DOOR).unwrap();
    let formatted = SourceFormatter::new().format_tree(&original.tree).unwrap();
    let reparsed = parser.parse_text(&formatted).unwrap();
    assert!(reparsed.diagnostics.is_empty());

    let mut dumper = TreeDumper::new();
    assert_eq!(
        dumper.dump(&reparsed.tree, reparsed.tree.root().unwrap()),
        dumper.dump(&original.tree, original.tree.root().unwrap())
    );
    assert_eq!(SourceFormatter::new().format_tree(&reparsed.tree).unwrap(), formatted);
}

#[test]
fn diagnostics_cover_semantic_errors_in_source_order() {
    let code = r#"
integer twice(integer x) { return x * 2; }
default {
    state_entry() {
        twice(1, 2);
        llOwnerSay(5);
        undefined_call();
        jump nowhere;
        state missing;
    }
    no_such_event() { }
}
"#;
    let result = LslParser::new().parse_text(code).unwrap();
    assert_eq!(
        codes_of(&result),
        vec![
            codes::WRONG_ARGUMENT_COUNT,
            codes::ARGUMENT_TYPE_MISMATCH,
            codes::UNDEFINED_FUNCTION,
            codes::UNDEFINED_LABEL,
            codes::UNKNOWN_STATE,
            codes::UNKNOWN_EVENT,
        ]
    );
    let offsets: Vec<usize> = result.diagnostics.iter().map(|d| d.location.offset).collect();
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    assert_eq!(offsets, sorted);
}

#[test]
fn syntax_errors_do_not_stop_the_parse() {
    let code = "default { state_entry() { integer a = ; llOwnerSay(\"still parsed\"); } }";
    let result = LslParser::new().parse_text(code).unwrap();
    assert_eq!(codes_of(&result), vec![codes::SYNTAX_ERROR]);

    let tree = &result.tree;
    assert!(tree.iter().any(|(_, n)| n.syntax_kind() == SyntaxKind::LibraryFunctionCall));
    let errors = tree.error_nodes();
    assert_eq!(errors.len(), 1);
    assert_eq!(tree.syntax_kind(errors[0]), SyntaxKind::LocalVariableDeclaration);
}

#[test]
fn dead_code_annotations_survive_in_the_tree() {
    let code = r#"
integer pick(integer n) {
    if (n) {
        return 1;
    } else {
        return 2;
    }
    llOwnerSay("unreachable");
}
default { state_entry() { llOwnerSay((string)pick(1)); } }
"#;
    let result = LslParser::new().parse_text(code).unwrap();
    assert_eq!(codes_of(&result), vec![codes::DEAD_CODE]);

    let tree = &result.tree;
    let dead: Vec<_> = tree.iter().filter(|(id, _)| tree.info(*id).is_dead_code).map(|(id, _)| id).collect();
    assert_eq!(dead.len(), 1);
    assert!(matches!(tree.kind(dead[0]), NodeKind::Stmt(Stmt::ExpressionStatement(_))));
    assert_eq!(tree.info(dead[0]).dead_code_type, Some(DeadCodeType::AfterReturnPath));
}

#[test]
fn config_selects_library_subsets() {
    let code = "default { state_entry() { llOwnerSay(osGetGridName()); } }";

    let standard = LslParser::new().parse_text(code).unwrap();
    assert_eq!(codes_of(&standard), vec![codes::UNDEFINED_FUNCTION]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lsl-analyzer.yaml");
    std::fs::write(&path, "library:\n  subsets: [lsl, os-lsl]\ndiagnostics:\n  unused_variables: false\n").unwrap();
    let config = AnalyzerConfig::load(&path).unwrap();
    let parser = LslParser::from_config(&config).unwrap();
    let extended = parser.parse_text(code).unwrap();
    assert!(extended.diagnostics.is_empty());
    assert!(!parser.options().unused_variables);
}
