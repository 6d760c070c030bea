//! 类型化字段
//!
//! [`Field<T>`] 把字段 ID、可读名称与读取函数绑定在一起，并解引用为
//! [`ValueCondition<T>`]，因此可以直接在字段上调用 `greater_than`、`starts_with` 等谓词。

use crate::condition::ValueCondition;
use crate::model::FieldId;
use crate::node::Leaf;
use crate::value::{Value, ValueKind, parse_temporal};
use chrono::{NaiveDate, NaiveDateTime};
use std::ops::Deref;
use tracing::debug;

/// 可以存入数据模型的值类型
pub trait FieldValue: Clone + Send + Sync + 'static {
    const KIND: ValueKind;

    /// 从动态值转换，类型不符时为 None
    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;

    /// 从文本解析
    fn parse(text: &str) -> Option<Self>;

    /// 展示用文本
    fn describe(&self) -> String {
        self.clone().into_value().to_string()
    }
}

/// 可按时间先后比较的值类型
pub trait TemporalValue: FieldValue + PartialOrd {}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Text(s) => Self::parse(s),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn parse(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FieldValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => Self::parse(s),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn parse(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn parse(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn parse(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl FieldValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(*d),
            other => other.as_temporal().map(|dt| dt.date()),
        }
    }

    fn into_value(self) -> Value {
        Value::Date(self)
    }

    fn parse(text: &str) -> Option<Self> {
        parse_temporal(text).map(|dt| dt.date())
    }
}

impl FieldValue for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_temporal()
    }

    fn into_value(self) -> Value {
        Value::DateTime(self)
    }

    fn parse(text: &str) -> Option<Self> {
        parse_temporal(text)
    }
}

impl FieldValue for Vec<Value> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::List(self)
    }

    fn parse(text: &str) -> Option<Self> {
        Some(
            text.split(',')
                .map(|s| Value::Text(s.trim().to_string()))
                .collect(),
        )
    }
}

/// 动态值字段，JSON 规则使用
impl FieldValue for Value {
    const KIND: ValueKind = ValueKind::Any;

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn into_value(self) -> Value {
        self
    }

    fn parse(text: &str) -> Option<Self> {
        Some(Value::Text(text.to_string()))
    }
}

impl TemporalValue for NaiveDate {}
impl TemporalValue for NaiveDateTime {}
impl TemporalValue for Value {}

/// 类型无关的字段引用，用于多输入映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub id: FieldId,
    pub readable: String,
}

/// 类型化字段
#[derive(Clone)]
pub struct Field<T> {
    id: FieldId,
    readable: String,
    condition: ValueCondition<T>,
}

impl<T: FieldValue> Field<T> {
    pub fn new(id: impl Into<FieldId>, readable: impl Into<String>) -> Self {
        let id = id.into();
        let readable = readable.into();
        let read_id = id.clone();
        let condition = ValueCondition::new(Leaf::field(readable.clone()), move |model, _| {
            let value = model.get(&read_id)?;
            let typed = T::from_value(&value);
            if typed.is_none() {
                debug!(
                    field = %read_id,
                    expected = %T::KIND,
                    actual = %value.kind(),
                    "字段值类型不匹配，按缺失处理"
                );
            }
            typed
        });
        Self {
            id,
            readable,
            condition,
        }
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn readable(&self) -> &str {
        &self.readable
    }

    pub fn condition(&self) -> &ValueCondition<T> {
        &self.condition
    }

    pub fn reference(&self) -> FieldRef {
        FieldRef {
            id: self.id.clone(),
            readable: self.readable.clone(),
        }
    }
}

impl<T> Deref for Field<T> {
    type Target = ValueCondition<T>;

    fn deref(&self) -> &Self::Target {
        &self.condition
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("readable", &self.readable)
            .finish()
    }
}
