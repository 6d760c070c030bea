//! 求值统计
//!
//! 每个结构节点的 true/false 计数保存在以节点 ID 为键的全局并发表中，
//! 节点本身保持不可变。计数只用于统计（例如"该子句在 73% 的求值中为真"），
//! 不影响任何求值结果；并发调用下的瞬时不一致只影响统计精度。

use crate::node::{Node, NodeId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

#[derive(Debug, Default)]
struct Counters {
    evaluated_true: AtomicU64,
    evaluated_false: AtomicU64,
}

impl Counters {
    fn slot(&self, outcome: bool) -> &AtomicU64 {
        if outcome {
            &self.evaluated_true
        } else {
            &self.evaluated_false
        }
    }
}

static COUNTERS: LazyLock<DashMap<NodeId, Counters>> = LazyLock::new(DashMap::new);

pub(crate) fn increment(id: NodeId, outcome: bool) -> u64 {
    // 已登记的节点只需要读锁
    if let Some(counters) = COUNTERS.get(&id) {
        return counters.slot(outcome).fetch_add(1, Ordering::Relaxed) + 1;
    }
    COUNTERS
        .entry(id)
        .or_default()
        .slot(outcome)
        .fetch_add(1, Ordering::Relaxed)
        + 1
}

pub(crate) fn count(id: NodeId, outcome: bool) -> u64 {
    COUNTERS
        .get(&id)
        .map(|c| c.slot(outcome).load(Ordering::Relaxed))
        .unwrap_or(0)
}

pub(crate) fn reset_node(id: NodeId) {
    if let Some(counters) = COUNTERS.get(&id) {
        counters.evaluated_true.store(0, Ordering::Relaxed);
        counters.evaluated_false.store(0, Ordering::Relaxed);
    }
}

pub(crate) fn forget(id: NodeId) {
    COUNTERS.remove(&id);
}

/// 单个节点的统计快照
#[derive(Debug, Clone)]
pub struct NodeStats {
    pub node: Arc<Node>,
    /// 节点在树中的深度，根为 0
    pub depth: usize,
    pub true_count: u64,
    pub false_count: u64,
}

impl NodeStats {
    pub fn total(&self) -> u64 {
        self.true_count + self.false_count
    }

    /// 为真的比例，未被求值过时为 None
    pub fn true_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.true_count as f64 / total as f64),
        }
    }

    /// 取整后的百分比
    pub fn percentage(&self) -> Option<u32> {
        self.true_rate().map(|rate| (rate * 100.0).round() as u32)
    }
}

/// 按声明顺序（先序）收集整棵树的统计
pub fn collect(root: &Arc<Node>) -> Vec<NodeStats> {
    let mut out = Vec::new();
    collect_into(root, 0, &mut out);
    out
}

fn collect_into(node: &Arc<Node>, depth: usize, out: &mut Vec<NodeStats>) {
    out.push(NodeStats {
        node: node.clone(),
        depth,
        true_count: node.true_eval_count(),
        false_count: node.false_eval_count(),
    });
    for child in node.operands() {
        collect_into(&child, depth + 1, out);
    }
}

/// 递归清零整棵树的计数
pub fn reset(root: &Node) {
    root.reset_counters();
    for child in root.operands() {
        reset(&child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Element, Leaf};
    use crate::operators::Operator;

    fn leaf(label: &str) -> Arc<Node> {
        Node::leaf(Leaf::operator(Operator::AlwaysTrue).with(Element::Value(label.into())))
    }

    #[test]
    fn test_true_rate() {
        let node = leaf("A");
        for _ in 0..3 {
            node.inc_true();
        }
        node.inc_false();

        let stats = collect(&node);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total(), 4);
        assert_eq!(stats[0].true_rate(), Some(0.75));
        assert_eq!(stats[0].percentage(), Some(75));
    }

    #[test]
    fn test_unevaluated_node_has_no_rate() {
        let node = leaf("A");
        let stats = collect(&node);
        assert_eq!(stats[0].true_rate(), None);
    }

    #[test]
    fn test_collect_order_and_reset() {
        let a = leaf("A");
        let b = leaf("B");
        let root = Node::binary(Operator::And, a.clone(), b.clone());
        root.inc_true();
        a.inc_true();
        b.inc_false();

        let stats = collect(&root);
        let ids: Vec<NodeId> = stats.iter().map(|s| s.node.id()).collect();
        assert_eq!(ids, vec![root.id(), a.id(), b.id()]);
        assert_eq!(stats[1].depth, 1);
        assert_eq!(stats[2].false_count, 1);

        reset(&root);
        assert!(collect(&root).iter().all(|s| s.total() == 0));
    }

    #[test]
    fn test_concurrent_increments() {
        let node = leaf("A");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let node = node.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        node.inc_true();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(node.true_eval_count(), 4000);
    }
}
