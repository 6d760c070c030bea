//! 规则构建入口
//!
//! ```ignore
//! use rule_engine::dsl::*;
//!
//! let rule = when(&birth_date.age_at(&today()).greater_or_equals(18)
//!     .and(&country.eq("FR".into())))
//!     .validate();
//! ```

use crate::condition::{StepCondition, ValueCondition};
use crate::field::FieldValue;
use crate::node::{Element, Leaf, NaryOperator, Node};
use crate::operators::{Comparator, Operator};
use chrono::{Local, NaiveDate};

pub use crate::rule::when;

/// 恒真条件，`label` 用于展示
pub fn always_true(label: &str) -> StepCondition {
    let leaf = Leaf::operator(Operator::AlwaysTrue).with(Element::Value(label.to_string()));
    StepCondition::new(Node::leaf(leaf), |_, _| true)
}

/// 恒假条件，`label` 用于展示
pub fn always_false(label: &str) -> StepCondition {
    let leaf = Leaf::operator(Operator::AlwaysFalse).with(Element::Value(label.to_string()));
    StepCondition::new(Node::leaf(leaf), |_, _| false)
}

/// 常量条件，只有一个令牌，不会出现在 `children()` 中
pub fn constant(value: bool) -> StepCondition {
    StepCondition::new(Node::leaf(Leaf::value(value.to_string())), move |_, _| value)
}

/// 常量值
pub fn value<T: FieldValue>(value: T) -> ValueCondition<T> {
    ValueCondition::constant(value)
}

/// 当天日期（本地时区），每次求值时读取
pub fn today() -> ValueCondition<NaiveDate> {
    ValueCondition::new(Leaf::operator(Operator::Today), |_, _| {
        Some(Local::now().date_naive())
    })
}

/// 至少一个子条件为真
pub fn match_any(conditions: &[StepCondition]) -> StepCondition {
    StepCondition::nary(NaryOperator::MatchAny, conditions)
}

/// 全部子条件为真
pub fn match_all(conditions: &[StepCondition]) -> StepCondition {
    StepCondition::nary(NaryOperator::MatchAll, conditions)
}

/// 没有子条件为真
pub fn match_none(conditions: &[StepCondition]) -> StepCondition {
    StepCondition::nary(NaryOperator::MatchNone, conditions)
}

/// 按为真的子条件个数判定，需要再指定比较方式
pub fn count(conditions: &[StepCondition]) -> CountCondition {
    CountCondition {
        conditions: conditions.to_vec(),
    }
}

#[derive(Debug, Clone)]
pub struct CountCondition {
    conditions: Vec<StepCondition>,
}

impl CountCondition {
    pub fn compare(&self, comparator: Comparator, threshold: i64) -> StepCondition {
        StepCondition::nary(
            NaryOperator::Count {
                comparator,
                threshold,
            },
            &self.conditions,
        )
    }

    pub fn greater_than(&self, threshold: i64) -> StepCondition {
        self.compare(Comparator::GreaterThan, threshold)
    }

    pub fn greater_or_equals(&self, threshold: i64) -> StepCondition {
        self.compare(Comparator::GreaterOrEquals, threshold)
    }

    pub fn lesser_than(&self, threshold: i64) -> StepCondition {
        self.compare(Comparator::LesserThan, threshold)
    }

    pub fn lesser_or_equals(&self, threshold: i64) -> StepCondition {
        self.compare(Comparator::LesserOrEquals, threshold)
    }

    pub fn equals(&self, threshold: i64) -> StepCondition {
        self.compare(Comparator::Equals, threshold)
    }

    pub fn not_equals(&self, threshold: i64) -> StepCondition {
        self.compare(Comparator::NotEquals, threshold)
    }
}
