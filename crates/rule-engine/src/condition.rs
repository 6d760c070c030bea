//! 条件
//!
//! [`ValueCondition<T>`] 产生一个可选值（字段读取或派生计算），[`StepCondition`] 产生布尔结果。
//! 两者都由结构节点加求值函数组成：节点用于展示与归约，函数只负责计算。
//!
//! 值缺失时叶子谓词一律为假，只有 `is_null` / `is_not_null` 直接检查缺失与否。

use crate::context::EvalContext;
use crate::error::{Result, RuleError};
use crate::field::{FieldValue, TemporalValue};
use crate::model::FieldModel;
use crate::node::{Element, Leaf, NaryOperator, Node};
use crate::operators::Operator;
use crate::render::{Locale, Renderer, TextRenderer};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

type ValueFn<T> = dyn Fn(&dyn FieldModel, &mut EvalContext) -> Option<T> + Send + Sync;
type StepFn = dyn Fn(&dyn FieldModel, &mut EvalContext) -> bool + Send + Sync;

/// 值条件
pub struct ValueCondition<T> {
    leaf: Leaf,
    function: Arc<ValueFn<T>>,
}

impl<T> Clone for ValueCondition<T> {
    fn clone(&self) -> Self {
        Self {
            leaf: self.leaf.clone(),
            function: self.function.clone(),
        }
    }
}

impl<T> fmt::Debug for ValueCondition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCondition")
            .field("leaf", &self.leaf)
            .finish()
    }
}

impl<T: FieldValue> ValueCondition<T> {
    pub fn new<F>(leaf: Leaf, function: F) -> Self
    where
        F: Fn(&dyn FieldModel, &mut EvalContext) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            leaf,
            function: Arc::new(function),
        }
    }

    /// 常量值
    pub fn constant(value: T) -> Self {
        let leaf = Leaf::value(value.describe());
        Self::new(leaf, move |_, _| Some(value.clone()))
    }

    pub fn leaf(&self) -> &Leaf {
        &self.leaf
    }

    pub fn value(&self, model: &dyn FieldModel, ctx: &mut EvalContext) -> Option<T> {
        (self.function)(model, ctx)
    }

    /// 派生新的值条件，描述追加 `suffix`
    pub fn map<U, F>(&self, suffix: Leaf, f: F) -> ValueCondition<U>
    where
        U: FieldValue,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        let function = self.function.clone();
        ValueCondition::new(self.leaf.merge(&suffix), move |model, ctx| {
            function(model, ctx).and_then(&f)
        })
    }

    /// 值存在且满足 `test` 时为真
    pub fn predicate<F>(&self, suffix: Leaf, test: F) -> StepCondition
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let function = self.function.clone();
        StepCondition::new(Node::leaf(self.leaf.merge(&suffix)), move |model, ctx| {
            function(model, ctx).is_some_and(|value| test(&value))
        })
    }

    /// 直接检查可选值，缺失也交给 `test` 判断
    pub fn test_presence<F>(&self, suffix: Leaf, test: F) -> StepCondition
    where
        F: Fn(Option<&T>) -> bool + Send + Sync + 'static,
    {
        let function = self.function.clone();
        StepCondition::new(Node::leaf(self.leaf.merge(&suffix)), move |model, ctx| {
            test(function(model, ctx).as_ref())
        })
    }

    /// 与另一个值条件比较，两边都存在时才可能为真
    pub fn compare<F>(&self, operator: Operator, other: &ValueCondition<T>, test: F) -> StepCondition
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let left = self.function.clone();
        let right = other.function.clone();
        let leaf = self
            .leaf
            .merge(&Leaf::operator(operator))
            .merge(&other.leaf);
        StepCondition::new(Node::leaf(leaf), move |model, ctx| {
            match (left(model, ctx), right(model, ctx)) {
                (Some(a), Some(b)) => test(&a, &b),
                _ => false,
            }
        })
    }

    fn with_operand(operator: Operator, value: &T) -> Leaf {
        Leaf::operator(operator).with(Element::Value(value.describe()))
    }

    pub fn is_null(&self) -> StepCondition {
        self.test_presence(Leaf::operator(Operator::IsNull), |value| value.is_none())
    }

    pub fn is_not_null(&self) -> StepCondition {
        self.test_presence(Leaf::operator(Operator::IsNotNull), |value| value.is_some())
    }
}

impl<T: FieldValue + PartialEq> ValueCondition<T> {
    pub fn eq(&self, expected: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::Eq, &expected);
        self.predicate(suffix, move |value| *value == expected)
    }

    pub fn not_eq(&self, expected: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::Neq, &expected);
        self.predicate(suffix, move |value| *value != expected)
    }

    pub fn eq_condition(&self, other: &ValueCondition<T>) -> StepCondition {
        self.compare(Operator::Eq, other, |a, b| a == b)
    }

    /// 值等于任一候选
    pub fn any_match(&self, values: Vec<T>) -> StepCondition {
        let suffix = Leaf::operator(Operator::In).with(Element::Value(describe_all(&values)));
        self.predicate(suffix, move |value| values.contains(value))
    }

    /// 值不等于任何候选
    pub fn none_match(&self, values: Vec<T>) -> StepCondition {
        let suffix = Leaf::operator(Operator::NotIn).with(Element::Value(describe_all(&values)));
        self.predicate(suffix, move |value| !values.contains(value))
    }
}

fn describe_all<T: FieldValue>(values: &[T]) -> String {
    values
        .iter()
        .map(FieldValue::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

impl<T: FieldValue + PartialOrd> ValueCondition<T> {
    pub fn greater_than(&self, min: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::Gt, &min);
        self.predicate(suffix, move |value| *value > min)
    }

    pub fn greater_or_equals(&self, min: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::Gte, &min);
        self.predicate(suffix, move |value| *value >= min)
    }

    pub fn lesser_than(&self, max: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::Lt, &max);
        self.predicate(suffix, move |value| *value < max)
    }

    pub fn lesser_or_equals(&self, max: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::Lte, &max);
        self.predicate(suffix, move |value| *value <= max)
    }

    pub fn greater_than_condition(&self, other: &ValueCondition<T>) -> StepCondition {
        self.compare(Operator::Gt, other, |a, b| a > b)
    }

    pub fn lesser_than_condition(&self, other: &ValueCondition<T>) -> StepCondition {
        self.compare(Operator::Lt, other, |a, b| a < b)
    }

    /// `(≤ max) 且 (≥ min)`
    pub fn between(&self, min: T, max: T) -> StepCondition {
        self.lesser_or_equals(max)
            .and(&self.greater_or_equals(min))
    }

    pub fn not_between(&self, min: T, max: T) -> StepCondition {
        self.between(min, max).not()
    }
}

impl<T: TemporalValue> ValueCondition<T> {
    pub fn before(&self, limit: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::Before, &limit);
        self.predicate(suffix, move |value| *value < limit)
    }

    pub fn before_or_eq(&self, limit: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::BeforeOrEq, &limit);
        self.predicate(suffix, move |value| *value <= limit)
    }

    pub fn after(&self, limit: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::After, &limit);
        self.predicate(suffix, move |value| *value > limit)
    }

    pub fn after_or_eq(&self, limit: T) -> StepCondition {
        let suffix = Self::with_operand(Operator::AfterOrEq, &limit);
        self.predicate(suffix, move |value| *value >= limit)
    }

    pub fn before_condition(&self, other: &ValueCondition<T>) -> StepCondition {
        self.compare(Operator::Before, other, |a, b| a < b)
    }

    pub fn after_condition(&self, other: &ValueCondition<T>) -> StepCondition {
        self.compare(Operator::After, other, |a, b| a > b)
    }
}

impl ValueCondition<NaiveDate> {
    /// 从当前日期到 `reference` 的整年数
    pub fn age_at(&self, reference: &ValueCondition<NaiveDate>) -> ValueCondition<i64> {
        let birth = self.function.clone();
        let at = reference.function.clone();
        let leaf = self
            .leaf
            .merge(&Leaf::operator(Operator::AgeAt))
            .merge(&reference.leaf);
        ValueCondition::new(leaf, move |model, ctx| {
            let from = birth(model, ctx)?;
            let to = at(model, ctx)?;
            Some(years_between(from, to))
        })
    }
}

fn years_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    i64::from(years)
}

impl ValueCondition<String> {
    pub fn starts_with(&self, prefix: impl Into<String>) -> StepCondition {
        let prefix = prefix.into();
        let suffix = Self::with_operand(Operator::StartsWith, &prefix);
        self.predicate(suffix, move |value| value.starts_with(prefix.as_str()))
    }

    pub fn ends_with(&self, ending: impl Into<String>) -> StepCondition {
        let ending = ending.into();
        let suffix = Self::with_operand(Operator::EndsWith, &ending);
        self.predicate(suffix, move |value| value.ends_with(ending.as_str()))
    }

    pub fn contains(&self, part: impl Into<String>) -> StepCondition {
        let part = part.into();
        let suffix = Self::with_operand(Operator::Contains, &part);
        self.predicate(suffix, move |value| value.contains(part.as_str()))
    }

    /// 正则匹配，表达式在构建时编译
    pub fn matches(&self, pattern: &str) -> Result<StepCondition> {
        let regex = Regex::new(pattern).map_err(|e| {
            RuleError::CompileError(format!("无效的正则表达式 '{}': {}", pattern, e))
        })?;
        let suffix = Self::with_operand(Operator::Regex, &pattern.to_string());
        Ok(self.predicate(suffix, move |value| regex.is_match(value)))
    }

    pub fn is_empty(&self) -> StepCondition {
        self.test_presence(Leaf::operator(Operator::IsEmpty), |value| {
            value.is_none_or(|s| s.is_empty())
        })
    }

    pub fn is_not_empty(&self) -> StepCondition {
        self.test_presence(Leaf::operator(Operator::IsNotEmpty), |value| {
            value.is_some_and(|s| !s.is_empty())
        })
    }

    /// 字符数
    pub fn length(&self) -> ValueCondition<i64> {
        self.map(Leaf::operator(Operator::Length), |s| {
            i64::try_from(s.chars().count()).ok()
        })
    }
}

impl ValueCondition<bool> {
    pub fn is_true(&self) -> StepCondition {
        self.predicate(Leaf::operator(Operator::IsTrue), |value| *value)
    }

    pub fn is_false(&self) -> StepCondition {
        self.predicate(Leaf::operator(Operator::IsFalse), |value| !*value)
    }
}

/// 布尔条件
///
/// 每次求值都会把结果记入上下文并累加节点计数，未被求值（短路跳过）的节点两者都不变。
#[derive(Clone)]
pub struct StepCondition {
    node: Arc<Node>,
    function: Arc<StepFn>,
}

impl fmt::Debug for StepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepCondition")
            .field("node", &self.node)
            .finish()
    }
}

impl StepCondition {
    pub fn new<F>(node: Arc<Node>, function: F) -> Self
    where
        F: Fn(&dyn FieldModel, &mut EvalContext) -> bool + Send + Sync + 'static,
    {
        Self {
            node,
            function: Arc::new(function),
        }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn evaluate(&self, model: &dyn FieldModel, ctx: &mut EvalContext) -> bool {
        let outcome = (self.function)(model, ctx);
        ctx.record(&self.node, outcome);
        if outcome {
            self.node.inc_true();
        } else {
            self.node.inc_false();
        }
        outcome
    }

    /// 逻辑与，短路模式下左侧为假时不求值右侧
    pub fn and(&self, other: &StepCondition) -> StepCondition {
        let left = self.clone();
        let right = other.clone();
        let node = Node::binary(Operator::And, self.node.clone(), other.node.clone());
        StepCondition::new(node, move |model, ctx| {
            let l = left.evaluate(model, ctx);
            if !l && ctx.is_short_circuit() {
                return false;
            }
            let r = right.evaluate(model, ctx);
            l && r
        })
    }

    /// 逻辑或，短路模式下左侧为真时不求值右侧
    pub fn or(&self, other: &StepCondition) -> StepCondition {
        let left = self.clone();
        let right = other.clone();
        let node = Node::binary(Operator::Or, self.node.clone(), other.node.clone());
        StepCondition::new(node, move |model, ctx| {
            let l = left.evaluate(model, ctx);
            if l && ctx.is_short_circuit() {
                return true;
            }
            let r = right.evaluate(model, ctx);
            l || r
        })
    }

    /// 异或，两侧总是都会求值
    pub fn xor(&self, other: &StepCondition) -> StepCondition {
        let left = self.clone();
        let right = other.clone();
        let node = Node::binary(Operator::Xor, self.node.clone(), other.node.clone());
        StepCondition::new(node, move |model, ctx| {
            let l = left.evaluate(model, ctx);
            let r = right.evaluate(model, ctx);
            l ^ r
        })
    }

    pub fn not(&self) -> StepCondition {
        let child = self.clone();
        let node = Node::unary(Operator::Not, self.node.clone());
        StepCondition::new(node, move |model, ctx| !child.evaluate(model, ctx))
    }

    /// 多元组合，全部子条件都会求值后再按真值个数判定
    pub(crate) fn nary(operator: NaryOperator, conditions: &[StepCondition]) -> StepCondition {
        let steps: Vec<StepCondition> = conditions.to_vec();
        let node = Node::nary(operator, steps.iter().map(|s| s.node.clone()).collect());
        StepCondition::new(node, move |model, ctx| {
            let trues = steps
                .iter()
                .map(|step| step.evaluate(model, ctx))
                .filter(|outcome| *outcome)
                .count();
            decide(operator, trues, steps.len())
        })
    }

    pub fn readable(&self, locale: Locale) -> String {
        TextRenderer.render(&self.node, locale)
    }
}

fn decide(operator: NaryOperator, trues: usize, total: usize) -> bool {
    match operator {
        NaryOperator::MatchAny => trues > 0,
        NaryOperator::MatchAll => trues == total,
        NaryOperator::MatchNone => trues == 0,
        NaryOperator::Count {
            comparator,
            threshold,
        } => comparator.apply(i64::try_from(trues).unwrap_or(i64::MAX), threshold),
        NaryOperator::Mappings => false,
    }
}
