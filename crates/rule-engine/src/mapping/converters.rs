//! 类型转换器
//!
//! 转换器带有一段展示描述，在映射规则的可读形式中以 `using '<描述>'` 出现。

use crate::error::{Result, RuleError};
use crate::field::FieldValue;
use crate::model::{FieldId, FieldModel};
use std::fmt;
use std::sync::Arc;

type ConvertFn<I, O> = dyn Fn(Option<I>) -> Result<Option<O>> + Send + Sync;
type BiConvertFn<I, J, O> = dyn Fn(Option<I>, Option<J>) -> Option<O> + Send + Sync;
type NaryConvertFn<O> = dyn Fn(&dyn FieldModel, &[FieldId]) -> Option<O> + Send + Sync;

/// 单输入转换器
pub struct TypeConverter<I, O> {
    description: String,
    function: Arc<ConvertFn<I, O>>,
}

impl<I, O> Clone for TypeConverter<I, O> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            function: self.function.clone(),
        }
    }
}

impl<I, O> fmt::Debug for TypeConverter<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConverter")
            .field("description", &self.description)
            .finish()
    }
}

impl<I, O> TypeConverter<I, O> {
    pub fn new<F>(description: impl Into<String>, function: F) -> Self
    where
        F: Fn(Option<I>) -> Result<Option<O>> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            function: Arc::new(function),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn convert(&self, input: Option<I>) -> Result<Option<O>> {
        (self.function)(input)
    }
}

/// 缺失输入保持缺失
pub fn converter<I, O, F>(function: F, description: &str) -> TypeConverter<I, O>
where
    I: 'static,
    O: 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    TypeConverter::new(description, move |input: Option<I>| Ok(input.map(&function)))
}

/// 缺失输入转换为 `null_case`
pub fn converter_or<I, O, F>(function: F, null_case: O, description: &str) -> TypeConverter<I, O>
where
    I: 'static,
    O: Clone + Send + Sync + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    TypeConverter::new(description, move |input: Option<I>| {
        Ok(Some(input.map(&function).unwrap_or_else(|| null_case.clone())))
    })
}

/// 转换为文本，文本值不加引号
pub fn as_string<I: FieldValue>() -> TypeConverter<I, String> {
    TypeConverter::new("as string", |input: Option<I>| {
        Ok(input.map(|value| match value.into_value() {
            crate::value::Value::Text(s) => s,
            other => other.to_string(),
        }))
    })
}

/// 从文本解析，无法解析时返回转换错误
pub fn from_string<O: FieldValue>() -> TypeConverter<String, O> {
    TypeConverter::new(format!("as {}", O::KIND), |input: Option<String>| {
        input
            .map(|text| {
                O::parse(&text).ok_or_else(|| {
                    RuleError::ConversionError(format!("无法将 '{}' 转换为 {}", text, O::KIND))
                })
            })
            .transpose()
    })
}

/// 双输入转换器
pub struct BiTypeConverter<I, J, O> {
    description: String,
    function: Arc<BiConvertFn<I, J, O>>,
}

impl<I, J, O> Clone for BiTypeConverter<I, J, O> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            function: self.function.clone(),
        }
    }
}

impl<I, J, O> BiTypeConverter<I, J, O> {
    pub fn new<F>(description: impl Into<String>, function: F) -> Self
    where
        F: Fn(Option<I>, Option<J>) -> Option<O> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            function: Arc::new(function),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn convert(&self, first: Option<I>, second: Option<J>) -> Option<O> {
        (self.function)(first, second)
    }
}

pub fn bi_converter<I, J, O, F>(function: F, description: &str) -> BiTypeConverter<I, J, O>
where
    F: Fn(Option<I>, Option<J>) -> Option<O> + Send + Sync + 'static,
{
    BiTypeConverter::new(description, function)
}

/// 任一输入缺失时返回 `null_case`
pub fn bi_converter_or<I, J, O, F>(
    function: F,
    null_case: O,
    description: &str,
) -> BiTypeConverter<I, J, O>
where
    I: 'static,
    J: 'static,
    O: Clone + Send + Sync + 'static,
    F: Fn(I, J) -> O + Send + Sync + 'static,
{
    BiTypeConverter::new(description, move |first, second| match (first, second) {
        (Some(a), Some(b)) => Some(function(a, b)),
        _ => Some(null_case.clone()),
    })
}

/// 缺失的输入分别用默认值替换
pub fn bi_converter_with_defaults<I, J, O, F>(
    function: F,
    first_default: I,
    second_default: J,
    description: &str,
) -> BiTypeConverter<I, J, O>
where
    I: Clone + Send + Sync + 'static,
    J: Clone + Send + Sync + 'static,
    O: 'static,
    F: Fn(I, J) -> O + Send + Sync + 'static,
{
    BiTypeConverter::new(description, move |first: Option<I>, second: Option<J>| {
        let a = first.unwrap_or_else(|| first_default.clone());
        let b = second.unwrap_or_else(|| second_default.clone());
        Some(function(a, b))
    })
}

/// 多输入转换器，直接读取模型中的多个字段
pub struct NaryTypeConverter<O> {
    description: String,
    function: Arc<NaryConvertFn<O>>,
}

impl<O> Clone for NaryTypeConverter<O> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            function: self.function.clone(),
        }
    }
}

impl<O> NaryTypeConverter<O> {
    pub fn new<F>(description: impl Into<String>, function: F) -> Self
    where
        F: Fn(&dyn FieldModel, &[FieldId]) -> Option<O> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            function: Arc::new(function),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn convert(&self, model: &dyn FieldModel, fields: &[FieldId]) -> Option<O> {
        (self.function)(model, fields)
    }
}

pub fn n_converter<O, F>(function: F, description: &str) -> NaryTypeConverter<O>
where
    F: Fn(&dyn FieldModel, &[FieldId]) -> Option<O> + Send + Sync + 'static,
{
    NaryTypeConverter::new(description, function)
}

/// 统计有值的输入字段个数
pub fn counter(description: &str) -> NaryTypeConverter<i64> {
    NaryTypeConverter::new(description, |model: &dyn FieldModel, fields: &[FieldId]| {
        let present = fields.iter().filter(|id| model.get(id).is_some()).count();
        i64::try_from(present).ok()
    })
}
