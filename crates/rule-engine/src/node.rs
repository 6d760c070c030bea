//! 结构节点
//!
//! 规则的不可变结构描述：叶子（字段 + 操作符 + 操作数）、一元、二元、多元与条件分支。
//! 子节点顺序在构建时确定，即从左到右的展示顺序，合并、展开与归约都不会改变它。
//!
//! 求值计数不存放在节点内部，而是以节点 ID 为键保存在 [`crate::stats`] 的并发表里。

use crate::error::{Result, RuleError};
use crate::operators::{Comparator, Operator};
use crate::render::{Locale, Renderer, TextRenderer};
use crate::stats;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 节点标识，构建时分配，进程内唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 展示令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Field(String),
    Operator(Operator),
    Value(String),
    /// 嵌套的子表达式
    Group(Vec<Element>),
}

/// 叶子描述：按阅读顺序排列的令牌
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaf {
    elements: Vec<Element>,
}

impl Leaf {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn field(label: impl Into<String>) -> Self {
        Self::new(vec![Element::Field(label.into())])
    }

    pub fn operator(operator: Operator) -> Self {
        Self::new(vec![Element::Operator(operator)])
    }

    pub fn value(text: impl Into<String>) -> Self {
        Self::new(vec![Element::Value(text.into())])
    }

    /// 追加一个令牌
    pub fn with(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// 将另一段描述接在当前描述之后，不修改输入
    pub fn merge(&self, other: &Leaf) -> Leaf {
        let mut elements = Vec::with_capacity(self.elements.len() + other.elements.len());
        elements.extend(self.elements.iter().cloned());
        elements.extend(other.elements.iter().cloned());
        Leaf { elements }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

/// 多元操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOperator {
    MatchAny,
    MatchAll,
    MatchNone,
    Count {
        comparator: Comparator,
        threshold: i64,
    },
    /// 映射规则序列，不参与布尔归约
    Mappings,
}

impl NaryOperator {
    pub fn operator(self) -> Operator {
        match self {
            Self::MatchAny => Operator::MatchAny,
            Self::MatchAll => Operator::MatchAll,
            Self::MatchNone => Operator::MatchNone,
            Self::Count { .. } => Operator::Count,
            Self::Mappings => Operator::Mappings,
        }
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Leaf(Leaf),
    Unary {
        operator: Operator,
        child: Arc<Node>,
    },
    Binary {
        operator: Operator,
        left: Arc<Node>,
        right: Arc<Node>,
    },
    Nary {
        operator: NaryOperator,
        children: Vec<Arc<Node>>,
    },
    Conditional {
        when: Arc<Node>,
        then: Arc<Node>,
        otherwise: Option<Arc<Node>>,
    },
}

/// 结构节点
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
}

impl Node {
    fn build(kind: NodeKind) -> Arc<Node> {
        Arc::new(Node {
            id: NodeId::next(),
            kind,
        })
    }

    pub fn leaf(leaf: Leaf) -> Arc<Node> {
        Self::build(NodeKind::Leaf(leaf))
    }

    pub fn unary(operator: Operator, child: Arc<Node>) -> Arc<Node> {
        Self::build(NodeKind::Unary { operator, child })
    }

    pub fn binary(operator: Operator, left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        Self::build(NodeKind::Binary {
            operator,
            left,
            right,
        })
    }

    pub fn nary(operator: NaryOperator, children: Vec<Arc<Node>>) -> Arc<Node> {
        Self::build(NodeKind::Nary { operator, children })
    }

    pub fn conditional(
        when: Arc<Node>,
        then: Arc<Node>,
        otherwise: Option<Arc<Node>>,
    ) -> Arc<Node> {
        Self::build(NodeKind::Conditional {
            when,
            then,
            otherwise,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Leaf(_) => "leaf",
            NodeKind::Unary { .. } => "unary",
            NodeKind::Binary { .. } => "binary",
            NodeKind::Nary { .. } => "nary",
            NodeKind::Conditional { .. } => "conditional",
        }
    }

    /// 合并两个节点的描述，只有叶子之间可以合并
    pub fn merge(&self, other: &Node) -> Result<Arc<Node>> {
        match (&self.kind, &other.kind) {
            (NodeKind::Leaf(left), NodeKind::Leaf(right)) => Ok(Node::leaf(left.merge(right))),
            _ => Err(RuleError::IncompatibleMerge {
                left: self.kind_name().to_string(),
                right: other.kind_name().to_string(),
            }),
        }
    }

    /// 按声明顺序展开为展示令牌，与求值结果无关
    pub fn flatten(&self) -> Vec<Element> {
        let mut out = Vec::new();
        match &self.kind {
            NodeKind::Leaf(leaf) => out.extend(leaf.elements().iter().cloned()),
            NodeKind::Unary { operator, child } => {
                out.push(Element::Operator(*operator));
                push_operand(&mut out, child);
            }
            NodeKind::Binary {
                operator,
                left,
                right,
            } => {
                push_operand(&mut out, left);
                out.push(Element::Operator(*operator));
                push_operand(&mut out, right);
            }
            NodeKind::Nary { operator, children } => {
                out.push(Element::Operator(operator.operator()));
                out.extend(children.iter().map(|c| Element::Group(c.flatten())));
                if let NaryOperator::Count {
                    comparator,
                    threshold,
                } = operator
                {
                    out.push(Element::Operator(comparator.operator()));
                    out.push(Element::Value(threshold.to_string()));
                }
            }
            NodeKind::Conditional {
                when,
                then,
                otherwise,
            } => {
                out.push(Element::Operator(Operator::When));
                push_operand(&mut out, when);
                out.push(Element::Operator(Operator::Then));
                push_operand(&mut out, then);
                if let Some(otherwise) = otherwise {
                    out.push(Element::Operator(Operator::Else));
                    push_operand(&mut out, otherwise);
                }
            }
        }
        out
    }

    /// 全部直接子节点，按声明顺序
    pub fn operands(&self) -> Vec<Arc<Node>> {
        match &self.kind {
            NodeKind::Leaf(_) => Vec::new(),
            NodeKind::Unary { child, .. } => vec![child.clone()],
            NodeKind::Binary { left, right, .. } => vec![left.clone(), right.clone()],
            NodeKind::Nary { children, .. } => children.clone(),
            NodeKind::Conditional {
                when,
                then,
                otherwise,
            } => {
                let mut nodes = vec![when.clone(), then.clone()];
                nodes.extend(otherwise.iter().cloned());
                nodes
            }
        }
    }

    /// 值得单独展示的直接子节点：展开后令牌数大于 1
    ///
    /// 仅作为操作数出现的常量叶子（如单独的 `true`）会被过滤掉。
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.operands()
            .into_iter()
            .filter(|c| c.flatten().len() > 1)
            .collect()
    }

    pub fn inc_true(&self) -> u64 {
        stats::increment(self.id, true)
    }

    pub fn inc_false(&self) -> u64 {
        stats::increment(self.id, false)
    }

    pub fn true_eval_count(&self) -> u64 {
        stats::count(self.id, true)
    }

    pub fn false_eval_count(&self) -> u64 {
        stats::count(self.id, false)
    }

    pub fn reset_counters(&self) {
        stats::reset_node(self.id);
    }

    /// 按指定语言渲染
    pub fn readable(&self, locale: Locale) -> String {
        TextRenderer.render(self, locale)
    }
}

fn push_operand(out: &mut Vec<Element>, node: &Node) {
    match &node.kind {
        NodeKind::Leaf(leaf) => out.extend(leaf.elements().iter().cloned()),
        _ => out.push(Element::Group(node.flatten())),
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        stats::forget(self.id);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.readable(Locale::default()))
    }
}
