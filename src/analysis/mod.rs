/*!
# Analysis Passes

Проходы над готовым деревом. Выполняются после разбора, по порядку:

1. [`scopes`]: идентификаторы блоков и позиции операторов;
2. [`dead_code`]: пути возврата, недостижимый код, отсутствующий `return`;
3. [`unused`]: неиспользуемые локальные переменные.

Аннотации записываются в [`StatementInfo`](crate::ast_core::StatementInfo)
узлов, замечания добавляются в общий список диагностик.
*/

pub mod dead_code;
pub mod scopes;
pub mod unused;

use serde::{Deserialize, Serialize};

use crate::ast_core::{Decl, NodeId, NodeKind, SyntaxTree};
use crate::diagnostics::Diagnostic;

/// Enhanced analysis configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassOptions {
    /// Предупреждать о недостижимом коде (аннотации ставятся всегда)
    pub dead_code: bool,
    pub unused_variables: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            dead_code: true,
            unused_variables: true,
        }
    }
}

/// Тело функции или события вместе с ожидаемым типом возврата.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Body {
    pub owner: NodeId,
    pub scope: NodeId,
    pub returns_value: bool,
}

/// Все тела функций и обработчиков событий дерева в порядке исходника.
pub(crate) fn bodies(tree: &SyntaxTree, root: NodeId) -> Vec<Body> {
    tree.preorder(root)
        .into_iter()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Decl(Decl::FunctionDeclaration(f)) => {
                Some(Body { owner: id, scope: f.body, returns_value: !f.return_type.is_void() })
            }
            NodeKind::Decl(Decl::EventHandler(e)) => Some(Body { owner: id, scope: e.body, returns_value: false }),
            _ => None,
        })
        .collect()
}

/// Выполнить все проходы над деревом с корнем.
pub fn run_passes(tree: &mut SyntaxTree, diagnostics: &mut Vec<Diagnostic>, options: &PassOptions) {
    let Some(root) = tree.root() else {
        tracing::warn!("Tree has no root, analysis passes skipped");
        return;
    };
    let before = diagnostics.len();
    scopes::assign_scopes(tree, root);
    dead_code::analyze(tree, root, diagnostics, options.dead_code);
    if options.unused_variables {
        unused::check_unused_variables(tree, root, diagnostics);
    }
    tracing::debug!("Analysis passes added {} diagnostics", diagnostics.len() - before);
}
