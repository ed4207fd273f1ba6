//! Глубокое копирование поддерева внутри той же арены.

use std::collections::HashMap;

use super::{NodeId, NodeKind, Stmt, SyntaxNode, SyntaxTree};
use crate::core::errors::ContractResult;

impl SyntaxTree {
    /// Копия поддерева с корнем `id`. Корень копии не имеет родителя.
    ///
    /// Ссылки внутрь копируемого поддерева (цели `jump`, объявления переменных,
    /// `return_path`) переназначаются на копии, ссылки наружу сохраняются.
    /// Копия узла-ошибки это новая заглушка с тем же диапазоном.
    /// В индекс `label → [jump]` добавляются только копии переходов, чья метка
    /// тоже скопирована; прежние записи не меняются.
    pub fn clone_subtree(&mut self, id: NodeId) -> ContractResult<NodeId> {
        self.check_exists(id)?;
        let originals = self.preorder(id);
        let base = self.nodes.len() as u32;
        let mapping: HashMap<NodeId, NodeId> = originals
            .iter()
            .enumerate()
            .map(|(i, old)| (*old, NodeId(base + i as u32)))
            .collect();
        let remap = |n: NodeId| mapping.get(&n).copied().unwrap_or(n);

        let mut copies = Vec::with_capacity(originals.len());
        for old in &originals {
            let source = self.node(*old);
            let copy = if let NodeKind::Error(kind) = source.kind {
                let mut fresh = SyntaxNode::new(NodeKind::Error(kind), source.range);
                fresh.has_errors = true;
                fresh.ranges_available = false;
                fresh.parent = source.parent.map(remap);
                fresh
            } else {
                let mut kind = source.kind.clone();
                kind.remap(&remap);
                let mut info = source.info.clone();
                info.return_path = info.return_path.map(remap);
                SyntaxNode {
                    kind,
                    parent: source.parent.map(remap),
                    has_errors: source.has_errors,
                    range: source.range,
                    detail_range: source.detail_range,
                    ranges_available: source.ranges_available,
                    info,
                }
            };
            copies.push(copy);
        }
        if let Some(root_copy) = copies.first_mut() {
            root_copy.parent = None;
        }
        self.nodes.extend(copies);
        for old in &originals {
            let target = match &self.node(*old).kind {
                NodeKind::Stmt(Stmt::JumpStatement(j)) => j.label,
                _ => continue,
            };
            if let (Some(label), Some(jump)) = (mapping.get(&target), mapping.get(old)) {
                self.jump_index.entry(*label).or_default().push(*jump);
            }
        }
        self.rebuild_jump_index();
        tracing::trace!("cloned subtree {} ({} nodes)", id, originals.len());
        Ok(NodeId(base))
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn clone_detaches_root_and_remaps_inner_jumps() {
        let mut t = SyntaxTree::new();
        let body = t.code_scope(ScopeType::FunctionBody, false, None);
        let label = t.add(Stmt::LabelStatement(LabelStatement { name: "l".into() }), None).unwrap();
        t.push_statement(body, label).unwrap();
        let jump = t.jump(label, None).unwrap();
        t.push_statement(body, jump).unwrap();

        let copy = t.clone_subtree(body).unwrap();
        assert_eq!(t.parent(copy), None);
        let copied = t.children(copy);
        assert_eq!(copied.len(), 2);
        assert_ne!(copied[0], label);
        assert_eq!(t.jumps_to(label), &[jump]);
        assert_eq!(t.jumps_to(copied[0]), &[copied[1]]);
        match t.kind(copied[1]) {
            NodeKind::Stmt(Stmt::JumpStatement(j)) => assert_eq!(j.label, copied[0]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn clone_of_outward_jump_is_not_indexed_under_original_label() {
        let mut t = SyntaxTree::new();
        let body = t.code_scope(ScopeType::FunctionBody, false, None);
        let label = t.add(Stmt::LabelStatement(LabelStatement { name: "out".into() }), None).unwrap();
        t.push_statement(body, label).unwrap();
        let inner = t.code_scope(ScopeType::AnonymousBlock, false, None);
        let jump = t.jump(label, None).unwrap();
        t.push_statement(inner, jump).unwrap();
        t.push_statement(body, inner).unwrap();

        let copy = t.clone_subtree(inner).unwrap();
        let copied_jump = t.children(copy)[0];
        match t.kind(copied_jump) {
            NodeKind::Stmt(Stmt::JumpStatement(j)) => assert_eq!(j.label, label),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(t.jumps_to(label), &[jump]);
    }

    #[test]
    fn unrelated_clone_keeps_unattached_jumps_indexed() {
        let mut t = SyntaxTree::new();
        let body = t.code_scope(ScopeType::FunctionBody, false, None);
        let label = t.add(Stmt::LabelStatement(LabelStatement { name: "later".into() }), None).unwrap();
        t.push_statement(body, label).unwrap();
        let jump = t.jump(label, None).unwrap();
        let other = t.code_scope(ScopeType::AnonymousBlock, false, None);

        t.clone_subtree(other).unwrap();
        assert_eq!(t.jumps_to(label), &[jump]);

        t.push_statement(body, jump).unwrap();
        assert_eq!(t.jumps_to(label), &[jump]);

        let copy = t.clone_subtree(body).unwrap();
        let copied = t.children(copy);
        assert_eq!(t.jumps_to(label), &[jump]);
        assert_eq!(t.jumps_to(copied[0]), &[copied[1]]);
    }

    #[test]
    fn clone_of_error_is_fresh_placeholder() {
        let mut t = SyntaxTree::new();
        let range = crate::core::SourceCodeRange::new(2, 4, 10, 2, 9, 15);
        let err = t.error_node(SyntaxKind::WhileLoop, Some(range));
        let copy = t.clone_subtree(err).unwrap();
        assert_ne!(copy, err);
        assert!(t.node(copy).has_errors());
        assert_eq!(t.node(copy).range(), Some(range));
        assert_eq!(t.syntax_kind(copy), SyntaxKind::WhileLoop);
    }
}
