//! 求值上下文
//!
//! 每次执行创建一个，记录短路开关、根节点以及每个实际被求值的节点的结果。
//! 归约只依赖这里记录的结果。

use crate::node::{Node, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EvalContext {
    short_circuit: bool,
    root: Arc<Node>,
    outcomes: HashMap<NodeId, bool>,
    /// 按求值顺序记录的节点
    visited: Vec<NodeId>,
}

impl EvalContext {
    pub fn new(root: Arc<Node>, short_circuit: bool) -> Self {
        Self {
            short_circuit,
            root,
            outcomes: HashMap::new(),
            visited: Vec::new(),
        }
    }

    pub fn is_short_circuit(&self) -> bool {
        self.short_circuit
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// 记录节点的求值结果
    pub fn record(&mut self, node: &Node, outcome: bool) {
        if self.outcomes.insert(node.id(), outcome).is_none() {
            self.visited.push(node.id());
        }
    }

    /// 节点的求值结果，未被求值时为 None
    pub fn outcome(&self, id: NodeId) -> Option<bool> {
        self.outcomes.get(&id).copied()
    }

    pub fn is_eval_true(&self, id: NodeId) -> bool {
        self.outcome(id) == Some(true)
    }

    pub fn is_eval_false(&self, id: NodeId) -> bool {
        self.outcome(id) == Some(false)
    }

    pub fn is_visited(&self, id: NodeId) -> bool {
        self.outcomes.contains_key(&id)
    }

    /// 按首次求值顺序返回节点 ID
    pub fn visited(&self) -> &[NodeId] {
        &self.visited
    }
}
