//! 规则操作符定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 结构节点上的操作符标签
///
/// 同一枚举同时用于展示（渲染器按语言翻译）和 JSON 规则定义中的条件操作符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // 逻辑组合
    And,
    Or,
    Xor,
    Not,
    MatchAny,
    MatchAll,
    MatchNone,
    Count,

    // 通用比较
    Eq,
    Neq,

    // 数值比较
    Gt,
    Gte,
    Lt,
    Lte,
    Between,

    // 包含检查
    In,
    NotIn,
    Contains,

    // 字符串操作
    StartsWith,
    EndsWith,
    Regex,

    // 时间操作
    Before,
    BeforeOrEq,
    After,
    AfterOrEq,

    // 空值检查
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,

    // 布尔
    IsTrue,
    IsFalse,
    AlwaysTrue,
    AlwaysFalse,

    // 取值函数
    AgeAt,
    Length,
    Today,

    // 规则与映射
    Rule,
    When,
    Validate,
    Then,
    Else,
    Map,
    Using,
    To,
    Mappings,
}

impl Operator {
    /// 是否可以作为 JSON 条件节点的叶子操作符
    pub fn is_condition_operator(self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::Neq
                | Self::Gt
                | Self::Gte
                | Self::Lt
                | Self::Lte
                | Self::Between
                | Self::In
                | Self::NotIn
                | Self::Contains
                | Self::StartsWith
                | Self::EndsWith
                | Self::Regex
                | Self::Before
                | Self::BeforeOrEq
                | Self::After
                | Self::AfterOrEq
                | Self::IsNull
                | Self::IsNotNull
                | Self::IsEmpty
                | Self::IsNotEmpty
                | Self::IsTrue
                | Self::IsFalse
        )
    }

    /// 空值类操作符不需要比较值
    pub fn requires_value(self) -> bool {
        !matches!(
            self,
            Self::IsNull
                | Self::IsNotNull
                | Self::IsEmpty
                | Self::IsNotEmpty
                | Self::IsTrue
                | Self::IsFalse
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
            Self::MatchAny => "match_any",
            Self::MatchAll => "match_all",
            Self::MatchNone => "match_none",
            Self::Count => "count",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Regex => "regex",
            Self::Before => "before",
            Self::BeforeOrEq => "before_or_eq",
            Self::After => "after",
            Self::AfterOrEq => "after_or_eq",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::IsTrue => "is_true",
            Self::IsFalse => "is_false",
            Self::AlwaysTrue => "always_true",
            Self::AlwaysFalse => "always_false",
            Self::AgeAt => "age_at",
            Self::Length => "length",
            Self::Today => "today",
            Self::Rule => "rule",
            Self::When => "when",
            Self::Validate => "validate",
            Self::Then => "then",
            Self::Else => "else",
            Self::Map => "map",
            Self::Using => "using",
            Self::To => "to",
            Self::Mappings => "mappings",
        };
        write!(f, "{}", s)
    }
}

/// 计数比较符，用于 `count(...)` 与阈值比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    GreaterThan,
    GreaterOrEquals,
    LesserThan,
    LesserOrEquals,
    Equals,
    NotEquals,
}

impl Comparator {
    pub fn apply(self, count: i64, threshold: i64) -> bool {
        match self {
            Self::GreaterThan => count > threshold,
            Self::GreaterOrEquals => count >= threshold,
            Self::LesserThan => count < threshold,
            Self::LesserOrEquals => count <= threshold,
            Self::Equals => count == threshold,
            Self::NotEquals => count != threshold,
        }
    }

    /// 展示用的操作符
    pub fn operator(self) -> Operator {
        match self {
            Self::GreaterThan => Operator::Gt,
            Self::GreaterOrEquals => Operator::Gte,
            Self::LesserThan => Operator::Lt,
            Self::LesserOrEquals => Operator::Lte,
            Self::Equals => Operator::Eq,
            Self::NotEquals => Operator::Neq,
        }
    }
}

/// JSON 规则定义中的逻辑组操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOperator {
    And,
    Or,
    Xor,
    MatchAny,
    MatchAll,
    MatchNone,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Xor => write!(f, "XOR"),
            Self::MatchAny => write!(f, "MATCH_ANY"),
            Self::MatchAll => write!(f, "MATCH_ALL"),
            Self::MatchNone => write!(f, "MATCH_NONE"),
        }
    }
}
