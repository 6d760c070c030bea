//! 数据模型契约
//!
//! 规则只通过 [`FieldModel`] 按字段 ID 读取值；映射流水线通过它写入值。
//! [`GenericModel`] 是基于 HashMap 的内存实现，支持从 JSON 加载。

use crate::error::Result;
use crate::field::{Field, FieldValue};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// 字段标识，JSON 加载时为点号分隔的路径（如 "user.profile.age"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FieldId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 数据模型
#[cfg_attr(test, mockall::automock)]
pub trait FieldModel {
    /// 读取字段值，缺失时为 None
    fn get(&self, id: &FieldId) -> Option<Value>;

    /// 写入字段值，None 表示清空
    fn set(&mut self, id: &FieldId, value: Option<Value>);

    /// 模型声明的全部字段
    fn field_ids(&self) -> Vec<FieldId>;

    fn contains(&self, id: &FieldId) -> bool {
        self.field_ids().iter().any(|f| f == id)
    }
}

/// 内存数据模型
///
/// 字段可以只声明不赋值（JSON 中的 null），此时 `contains` 为真而 `get` 为 None。
#[derive(Debug, Clone, Default)]
pub struct GenericModel {
    /// 声明顺序
    fields: Vec<FieldId>,
    declared: HashSet<FieldId>,
    values: HashMap<FieldId, Value>,
}

impl GenericModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建，嵌套对象展开为点号路径，数组元素可按下标访问（如 "items.0.name"）
    pub fn from_json(json: &serde_json::Value) -> Self {
        let mut model = Self::new();
        model.load_json("", json);
        model
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: serde_json::Value = serde_json::from_str(json)?;
        Ok(Self::from_json(&data))
    }

    fn load_json(&mut self, prefix: &str, json: &serde_json::Value) {
        match json {
            serde_json::Value::Object(map) => {
                for (key, child) in map {
                    let path = join_path(prefix, key);
                    self.load_json(&path, child);
                }
            }
            serde_json::Value::Array(items) => {
                self.set(&FieldId::new(prefix), Value::from_json(json));
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() || item.is_array() {
                        self.load_json(&join_path(prefix, &index.to_string()), item);
                    }
                }
            }
            other => self.set(&FieldId::new(prefix), Value::from_json(other)),
        }
    }

    /// 声明字段但不赋值
    pub fn declare(&mut self, id: impl Into<FieldId>) {
        let id = id.into();
        if self.declared.insert(id.clone()) {
            self.fields.push(id);
        }
    }

    pub fn with(mut self, id: impl Into<FieldId>, value: impl Into<Value>) -> Self {
        let id = id.into();
        self.set(&id, Some(value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn runtime_field<T: FieldValue>(&mut self, value: Option<T>, readable: &str) -> Field<T> {
        let id = FieldId::new(readable);
        self.set(&id, value.map(FieldValue::into_value));
        Field::new(id, readable)
    }

    pub fn bool_field(&mut self, value: bool, readable: &str) -> Field<bool> {
        self.runtime_field(Some(value), readable)
    }

    pub fn int_field(&mut self, value: i64, readable: &str) -> Field<i64> {
        self.runtime_field(Some(value), readable)
    }

    pub fn float_field(&mut self, value: f64, readable: &str) -> Field<f64> {
        self.runtime_field(Some(value), readable)
    }

    pub fn text_field(&mut self, value: Option<&str>, readable: &str) -> Field<String> {
        self.runtime_field(value.map(str::to_string), readable)
    }

    pub fn date_field(&mut self, value: Option<NaiveDate>, readable: &str) -> Field<NaiveDate> {
        self.runtime_field(value, readable)
    }

    pub fn datetime_field(
        &mut self,
        value: Option<NaiveDateTime>,
        readable: &str,
    ) -> Field<NaiveDateTime> {
        self.runtime_field(value, readable)
    }

    pub fn list_field(&mut self, value: Vec<Value>, readable: &str) -> Field<Vec<Value>> {
        self.runtime_field(Some(value), readable)
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

impl FieldModel for GenericModel {
    fn get(&self, id: &FieldId) -> Option<Value> {
        self.values.get(id).cloned()
    }

    fn set(&mut self, id: &FieldId, value: Option<Value>) {
        self.declare(id.clone());
        match value {
            Some(value) => {
                self.values.insert(id.clone(), value);
            }
            None => {
                self.values.remove(id);
            }
        }
    }

    fn field_ids(&self) -> Vec<FieldId> {
        self.fields.clone()
    }

    fn contains(&self, id: &FieldId) -> bool {
        self.declared.contains(id)
    }
}
