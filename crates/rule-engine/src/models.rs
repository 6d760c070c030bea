//! JSON 规则定义

use crate::operators::{Comparator, LogicalOperator, Operator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn default_version() -> String {
    "1.0".to_string()
}

fn default_short_circuit() -> bool {
    true
}

/// 规则定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// 执行时是否短路，默认开启
    #[serde(default = "default_short_circuit")]
    pub short_circuit: bool,
    pub root: RuleNode,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl RuleDefinition {
    pub fn new(name: impl Into<String>, root: RuleNode) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            version: default_version(),
            short_circuit: true,
            root,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// 规则节点
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    Condition(ConditionDef),
    Group(LogicalGroup),
    Not(NotGroup),
    Count(CountGroup),
}

/// 条件节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDef {
    pub field: String,
    /// 展示名称，缺省使用字段路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl ConditionDef {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            label: None,
            operator,
            value: value.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// 逻辑组节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalGroup {
    pub operator: LogicalOperator,
    pub children: Vec<RuleNode>,
}

impl LogicalGroup {
    pub fn new(operator: LogicalOperator, children: Vec<RuleNode>) -> Self {
        Self { operator, children }
    }

    pub fn and(children: Vec<RuleNode>) -> Self {
        Self::new(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<RuleNode>) -> Self {
        Self::new(LogicalOperator::Or, children)
    }
}

/// 取反节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotGroup {
    pub child: Box<RuleNode>,
}

/// 计数节点：为真的子节点个数与阈值比较
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountGroup {
    pub comparator: Comparator,
    pub threshold: i64,
    pub children: Vec<RuleNode>,
}
