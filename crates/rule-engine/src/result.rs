//! 执行结果与归约

use crate::context::EvalContext;
use crate::node::{Node, NodeKind};
use crate::reducer;
use crate::render::{Locale, Renderer, TextRenderer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 归约目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReduceType {
    Success,
    Failure,
}

impl ReduceType {
    pub fn of(value: bool) -> Self {
        if value { Self::Success } else { Self::Failure }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Success => Self::Failure,
            Self::Failure => Self::Success,
        }
    }

    /// 与该目标对应的节点结果
    pub fn expected(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// 归约结果：解释该结果的最小子树，或为空
#[derive(Debug, Clone)]
pub enum Reduced {
    Empty,
    Node(Arc<Node>),
}

impl Reduced {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn node(&self) -> Option<&Arc<Node>> {
        match self {
            Self::Empty => None,
            Self::Node(node) => Some(node),
        }
    }

    pub fn into_node(self) -> Option<Arc<Node>> {
        match self {
            Self::Empty => None,
            Self::Node(node) => Some(node),
        }
    }

    /// 归约树中的叶子，按声明顺序
    pub fn leaves(&self) -> Vec<Arc<Node>> {
        let mut out = Vec::new();
        if let Self::Node(node) = self {
            collect_leaves(node, &mut out);
        }
        out
    }

    pub fn readable(&self, locale: Locale) -> Option<String> {
        self.node().map(|node| TextRenderer.render(node, locale))
    }
}

fn collect_leaves(node: &Arc<Node>, out: &mut Vec<Arc<Node>>) {
    if let NodeKind::Leaf(_) = node.kind() {
        out.push(node.clone());
        return;
    }
    for child in node.operands() {
        collect_leaves(&child, out);
    }
}

/// 一次执行的结果，构建后不可变
#[derive(Debug, Clone)]
pub struct EvalResult {
    value: bool,
    context: EvalContext,
}

impl EvalResult {
    pub fn new(value: bool, context: EvalContext) -> Self {
        Self { value, context }
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    pub fn reduce(&self, kind: ReduceType) -> Reduced {
        reducer::reduce(self.context.root(), &self.context, kind)
    }

    /// 失败原因，规则成功时为 None
    pub fn failure_cause(&self, locale: Locale) -> Option<String> {
        if self.value {
            return None;
        }
        self.reduce_message(locale, ReduceType::Failure)
    }

    pub fn reduce_message(&self, locale: Locale, kind: ReduceType) -> Option<String> {
        self.reduce(kind).readable(locale)
    }

    /// 按实际结果解释：成功时给出成功原因，失败时给出失败原因
    pub fn explain(&self, locale: Locale) -> Option<String> {
        self.reduce_message(locale, ReduceType::of(self.value))
    }
}
