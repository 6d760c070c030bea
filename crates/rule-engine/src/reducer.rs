//! 归约
//!
//! 把求值后的结构树裁剪为解释某个结果（成功或失败）的最小子树。
//! 只依赖上下文中记录的节点结果，未被求值的节点不参与。
//! 合并多个非空部分时保持声明顺序，多于两个时右嵌套：`a 且 (b 且 c)`。
//!
//! `count` 的策略：支持该结果的子节点全部列出，而不是挑选一个最小子集。
//! - `>` / `>=`：成功由为真的子节点解释，失败由为假的子节点解释；
//! - `<` / `<=`：成功由为假的子节点解释，失败由为真的子节点解释；
//! - `=` / `!=`：每个子节点都按自身结果列出。

use crate::context::EvalContext;
use crate::node::{NaryOperator, Node, NodeKind};
use crate::operators::{Comparator, Operator};
use crate::result::{ReduceType, Reduced};
use std::sync::Arc;

pub fn reduce(node: &Arc<Node>, ctx: &EvalContext, kind: ReduceType) -> Reduced {
    let outcome = ctx.outcome(node.id());
    match node.kind() {
        NodeKind::Leaf(_) => {
            if outcome == Some(kind.expected()) {
                Reduced::Node(node.clone())
            } else {
                Reduced::Empty
            }
        }
        // 映射分支不解释布尔结果
        NodeKind::Conditional { .. } => Reduced::Empty,
        _ if outcome != Some(kind.expected()) => Reduced::Empty,
        NodeKind::Unary { operator, child } => match operator {
            Operator::Not => reduce(child, ctx, kind.opposite()),
            _ => reduce(child, ctx, kind),
        },
        NodeKind::Binary {
            operator,
            left,
            right,
        } => reduce_binary(*operator, left, right, ctx, kind),
        NodeKind::Nary { operator, children } => {
            combine(Operator::And, reduce_nary(*operator, children, ctx, kind))
        }
    }
}

fn reduce_binary(
    operator: Operator,
    left: &Arc<Node>,
    right: &Arc<Node>,
    ctx: &EvalContext,
    kind: ReduceType,
) -> Reduced {
    let operands = [left, right];
    let parts = match (operator, kind) {
        (Operator::And, ReduceType::Failure) => with_outcome(&operands, ctx, false, kind),
        (Operator::Or, ReduceType::Success) => with_outcome(&operands, ctx, true, kind),
        (Operator::Xor, _) => by_own_outcome(&operands, ctx),
        _ => operands.iter().map(|c| reduce(c, ctx, kind)).collect(),
    };
    combine(operator, parts)
}

fn reduce_nary(
    operator: NaryOperator,
    children: &[Arc<Node>],
    ctx: &EvalContext,
    kind: ReduceType,
) -> Vec<Reduced> {
    let children: Vec<&Arc<Node>> = children.iter().collect();
    let all = |kind: ReduceType| -> Vec<Reduced> {
        children.iter().map(|c| reduce(c, ctx, kind)).collect()
    };
    match (operator, kind) {
        (NaryOperator::MatchAny, ReduceType::Success) => {
            with_outcome(&children, ctx, true, ReduceType::Success)
        }
        (NaryOperator::MatchAny, ReduceType::Failure) => all(ReduceType::Failure),
        (NaryOperator::MatchAll, ReduceType::Success) => all(ReduceType::Success),
        (NaryOperator::MatchAll, ReduceType::Failure) => {
            with_outcome(&children, ctx, false, ReduceType::Failure)
        }
        (NaryOperator::MatchNone, ReduceType::Success) => all(ReduceType::Failure),
        (NaryOperator::MatchNone, ReduceType::Failure) => {
            with_outcome(&children, ctx, true, ReduceType::Success)
        }
        (NaryOperator::Count { comparator, .. }, kind) => match comparator {
            Comparator::GreaterThan | Comparator::GreaterOrEquals => {
                let supporting = kind.expected();
                with_outcome(&children, ctx, supporting, ReduceType::of(supporting))
            }
            Comparator::LesserThan | Comparator::LesserOrEquals => {
                let supporting = !kind.expected();
                with_outcome(&children, ctx, supporting, ReduceType::of(supporting))
            }
            Comparator::Equals | Comparator::NotEquals => by_own_outcome(&children, ctx),
        },
        (NaryOperator::Mappings, _) => Vec::new(),
    }
}

/// 结果为 `outcome` 的子节点，按 `kind` 归约
fn with_outcome(
    children: &[&Arc<Node>],
    ctx: &EvalContext,
    outcome: bool,
    kind: ReduceType,
) -> Vec<Reduced> {
    children
        .iter()
        .filter(|c| ctx.outcome(c.id()) == Some(outcome))
        .map(|c| reduce(c, ctx, kind))
        .collect()
}

/// 每个已求值的子节点按自身结果归约
fn by_own_outcome(children: &[&Arc<Node>], ctx: &EvalContext) -> Vec<Reduced> {
    children
        .iter()
        .filter_map(|c| {
            ctx.outcome(c.id())
                .map(|outcome| reduce(c, ctx, ReduceType::of(outcome)))
        })
        .collect()
}

/// 丢弃空部分，剩余部分按声明顺序右嵌套组合
fn combine(operator: Operator, parts: Vec<Reduced>) -> Reduced {
    let mut nodes: Vec<Arc<Node>> = parts.into_iter().filter_map(Reduced::into_node).collect();
    let Some(mut acc) = nodes.pop() else {
        return Reduced::Empty;
    };
    while let Some(node) = nodes.pop() {
        acc = Node::binary(operator, node, acc);
    }
    Reduced::Node(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{always_false, always_true, count, match_any, match_none, when};
    use crate::render::Locale;

    fn explain(condition: &crate::condition::StepCondition, kind: ReduceType) -> Option<String> {
        when(condition)
            .validate()
            .execute()
            .reduce(kind)
            .readable(Locale::En)
    }

    #[test]
    fn test_combine_right_nested() {
        let parts = vec![
            Reduced::Node(always_true("A").node().clone()),
            Reduced::Empty,
            Reduced::Node(always_true("B").node().clone()),
            Reduced::Node(always_true("C").node().clone()),
        ];
        let combined = combine(Operator::And, parts);
        assert_eq!(
            combined.readable(Locale::En).as_deref(),
            Some("always true A and (always true B and always true C)")
        );
        assert!(combine(Operator::And, vec![Reduced::Empty]).is_empty());
    }

    #[test]
    fn test_not_flips_kind() {
        let rule = always_false("A").not();
        assert_eq!(
            explain(&rule, ReduceType::Success).as_deref(),
            Some("always false A")
        );
        assert_eq!(explain(&rule, ReduceType::Failure), None);
    }

    #[test]
    fn test_match_none_failure() {
        let rule = match_none(&[always_false("A"), always_true("B")]);
        assert_eq!(
            explain(&rule, ReduceType::Failure).as_deref(),
            Some("always true B")
        );
    }

    #[test]
    fn test_match_any_failure_lists_all() {
        let rule = match_any(&[always_false("A"), always_false("B")]);
        assert_eq!(
            explain(&rule, ReduceType::Failure).as_deref(),
            Some("always false A and always false B")
        );
    }

    #[test]
    fn test_count_lesser_than() {
        // 成功由为假的子节点解释
        let rule = count(&[always_true("A"), always_false("B"), always_false("C")]).lesser_than(2);
        assert_eq!(
            explain(&rule, ReduceType::Success).as_deref(),
            Some("always false B and always false C")
        );
    }

    #[test]
    fn test_count_equals_lists_every_child() {
        let rule = count(&[always_true("A"), always_false("B")]).equals(1);
        assert_eq!(
            explain(&rule, ReduceType::Success).as_deref(),
            Some("always true A and always false B")
        );
    }
}
