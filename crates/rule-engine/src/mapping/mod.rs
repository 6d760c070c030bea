//! 映射流水线
//!
//! 把输入模型中的值（可经转换器转换）写入输出模型：
//!
//! ```ignore
//! let rule = map(&first_name).using(upper_case).to(&display_name);
//! rule.execute_on(&input, &mut output, &mut ctx)?;
//! ```
//!
//! 映射规则同样带有结构节点，可以和校验规则一样渲染为可读文本。

pub mod converters;
mod registry;

pub use converters::{
    BiTypeConverter, NaryTypeConverter, TypeConverter, as_string, bi_converter, bi_converter_or,
    bi_converter_with_defaults, converter, converter_or, counter, from_string, n_converter,
};
pub use registry::MappingRegistry;

use crate::condition::StepCondition;
use crate::context::EvalContext;
use crate::error::Result;
use crate::field::{Field, FieldRef, FieldValue};
use crate::model::{FieldId, FieldModel};
use crate::node::{Element, Leaf, Node};
use crate::operators::Operator;
use crate::render::{Locale, Renderer, TextRenderer};
use std::sync::Arc;
use tracing::debug;

/// 映射规则
pub trait MappingRule: Send + Sync {
    fn node(&self) -> Arc<Node>;

    /// 输入输出模型是否具备执行所需的字段
    fn validate(&self, input: &dyn FieldModel, output: &dyn FieldModel) -> bool;

    fn execute_on(
        &self,
        input: &dyn FieldModel,
        output: &mut dyn FieldModel,
        ctx: &mut EvalContext,
    ) -> Result<()>;

    fn readable(&self, locale: Locale) -> String {
        TextRenderer.render(&self.node(), locale)
    }
}

/// 转为共享的映射规则对象
pub trait IntoSharedRule {
    fn into_shared(self) -> Arc<dyn MappingRule>;
}

impl<R: MappingRule + 'static> IntoSharedRule for R {
    fn into_shared(self) -> Arc<dyn MappingRule> {
        Arc::new(self)
    }
}

/// 映射输入
pub trait MappingInput<T>: Send + Sync {
    fn leaf(&self) -> Leaf;

    fn validate(&self, input: &dyn FieldModel) -> bool;

    fn read(&self, input: &dyn FieldModel, ctx: &mut EvalContext) -> Result<Option<T>>;
}

struct FieldInput<T> {
    field: Field<T>,
}

impl<T: FieldValue> MappingInput<T> for FieldInput<T> {
    fn leaf(&self) -> Leaf {
        self.field.leaf().clone()
    }

    fn validate(&self, input: &dyn FieldModel) -> bool {
        input.contains(self.field.id())
    }

    fn read(&self, input: &dyn FieldModel, ctx: &mut EvalContext) -> Result<Option<T>> {
        Ok(self.field.value(input, ctx))
    }
}

struct ValueInput<T> {
    value: T,
}

impl<T: FieldValue> MappingInput<T> for ValueInput<T> {
    fn leaf(&self) -> Leaf {
        Leaf::value(self.value.describe())
    }

    fn validate(&self, _input: &dyn FieldModel) -> bool {
        true
    }

    fn read(&self, _input: &dyn FieldModel, _ctx: &mut EvalContext) -> Result<Option<T>> {
        Ok(Some(self.value.clone()))
    }
}

fn using(description: &str) -> Leaf {
    Leaf::operator(Operator::Using).with(Element::Value(format!("'{}'", description)))
}

struct ConverterInput<I, O> {
    input: Box<dyn MappingInput<I>>,
    converter: TypeConverter<I, O>,
}

impl<I: 'static, O: 'static> MappingInput<O> for ConverterInput<I, O> {
    fn leaf(&self) -> Leaf {
        self.input.leaf().merge(&using(self.converter.description()))
    }

    fn validate(&self, input: &dyn FieldModel) -> bool {
        self.input.validate(input)
    }

    fn read(&self, input: &dyn FieldModel, ctx: &mut EvalContext) -> Result<Option<O>> {
        let value = self.input.read(input, ctx)?;
        self.converter.convert(value)
    }
}

struct BiConverterInput<I, J, O> {
    first: Field<I>,
    second: Field<J>,
    converter: BiTypeConverter<I, J, O>,
}

impl<I: FieldValue, J: FieldValue, O: 'static> MappingInput<O> for BiConverterInput<I, J, O> {
    fn leaf(&self) -> Leaf {
        self.first
            .leaf()
            .merge(&Leaf::operator(Operator::And))
            .merge(self.second.leaf())
            .merge(&using(self.converter.description()))
    }

    fn validate(&self, input: &dyn FieldModel) -> bool {
        input.contains(self.first.id()) && input.contains(self.second.id())
    }

    fn read(&self, input: &dyn FieldModel, ctx: &mut EvalContext) -> Result<Option<O>> {
        let first = self.first.value(input, ctx);
        let second = self.second.value(input, ctx);
        Ok(self.converter.convert(first, second))
    }
}

struct NaryConverterInput<O> {
    fields: Vec<FieldRef>,
    ids: Vec<FieldId>,
    converter: NaryTypeConverter<O>,
}

impl<O: 'static> MappingInput<O> for NaryConverterInput<O> {
    fn leaf(&self) -> Leaf {
        let mut leaf = Leaf::default();
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                leaf = leaf.with(Element::Operator(Operator::And));
            }
            leaf = leaf.with(Element::Field(field.readable.clone()));
        }
        leaf.merge(&using(self.converter.description()))
    }

    fn validate(&self, input: &dyn FieldModel) -> bool {
        self.ids.iter().all(|id| input.contains(id))
    }

    fn read(&self, input: &dyn FieldModel, _ctx: &mut EvalContext) -> Result<Option<O>> {
        Ok(self.converter.convert(input, &self.ids))
    }
}

/// 单字段映射构建器
pub struct MappingBuilder<T> {
    input: Box<dyn MappingInput<T>>,
}

impl<T: FieldValue> MappingBuilder<T> {
    pub fn using<O: FieldValue>(self, converter: TypeConverter<T, O>) -> MappingBuilder<O> {
        MappingBuilder {
            input: Box::new(ConverterInput {
                input: self.input,
                converter,
            }),
        }
    }

    pub fn to(self, output: &Field<T>) -> DefaultMapping<T> {
        let leaf = Leaf::operator(Operator::Map)
            .merge(&self.input.leaf())
            .merge(&Leaf::operator(Operator::To))
            .merge(output.leaf());
        DefaultMapping {
            input: self.input,
            output: output.clone(),
            node: Node::leaf(leaf),
        }
    }
}

pub fn map<T: FieldValue>(field: &Field<T>) -> MappingBuilder<T> {
    MappingBuilder {
        input: Box::new(FieldInput {
            field: field.clone(),
        }),
    }
}

/// 常量映射
pub fn map_value<T: FieldValue>(value: T) -> MappingBuilder<T> {
    MappingBuilder {
        input: Box::new(ValueInput { value }),
    }
}

/// 双字段映射构建器
pub struct BiMappingBuilder<I, J> {
    first: Field<I>,
    second: Field<J>,
}

impl<I: FieldValue, J: FieldValue> BiMappingBuilder<I, J> {
    pub fn using<O: FieldValue>(self, converter: BiTypeConverter<I, J, O>) -> MappingBuilder<O> {
        MappingBuilder {
            input: Box::new(BiConverterInput {
                first: self.first,
                second: self.second,
                converter,
            }),
        }
    }
}

pub fn map2<I: FieldValue, J: FieldValue>(
    first: &Field<I>,
    second: &Field<J>,
) -> BiMappingBuilder<I, J> {
    BiMappingBuilder {
        first: first.clone(),
        second: second.clone(),
    }
}

/// 多字段映射构建器
pub struct NaryMappingBuilder {
    fields: Vec<FieldRef>,
}

impl NaryMappingBuilder {
    pub fn using<O: FieldValue>(self, converter: NaryTypeConverter<O>) -> MappingBuilder<O> {
        let ids = self.fields.iter().map(|f| f.id.clone()).collect();
        MappingBuilder {
            input: Box::new(NaryConverterInput {
                fields: self.fields,
                ids,
                converter,
            }),
        }
    }
}

pub fn map_n(fields: Vec<FieldRef>) -> NaryMappingBuilder {
    NaryMappingBuilder { fields }
}

/// 输入到输出字段的映射
pub struct DefaultMapping<T> {
    input: Box<dyn MappingInput<T>>,
    output: Field<T>,
    node: Arc<Node>,
}

impl<T: FieldValue> MappingRule for DefaultMapping<T> {
    fn node(&self) -> Arc<Node> {
        self.node.clone()
    }

    fn validate(&self, input: &dyn FieldModel, output: &dyn FieldModel) -> bool {
        self.input.validate(input) && output.contains(self.output.id())
    }

    fn execute_on(
        &self,
        input: &dyn FieldModel,
        output: &mut dyn FieldModel,
        ctx: &mut EvalContext,
    ) -> Result<()> {
        let value = self.input.read(input, ctx)?;
        debug!(
            field = %self.output.id(),
            present = value.is_some(),
            "写入映射结果"
        );
        output.set(self.output.id(), value.map(FieldValue::into_value));
        Ok(())
    }
}

/// 条件映射：条件为真时执行 `then`，否则执行 `otherwise`（如果有）
pub struct ConditionalMapping {
    condition: StepCondition,
    then: Arc<dyn MappingRule>,
    otherwise: Option<Arc<dyn MappingRule>>,
    node: Arc<Node>,
}

impl ConditionalMapping {
    pub fn otherwise(mut self, rule: impl MappingRule + 'static) -> Self {
        let otherwise: Arc<dyn MappingRule> = Arc::new(rule);
        self.node = Node::conditional(
            self.condition.node().clone(),
            self.then.node(),
            Some(otherwise.node()),
        );
        self.otherwise = Some(otherwise);
        self
    }
}

impl MappingRule for ConditionalMapping {
    fn node(&self) -> Arc<Node> {
        self.node.clone()
    }

    fn validate(&self, input: &dyn FieldModel, output: &dyn FieldModel) -> bool {
        self.then.validate(input, output)
            && self
                .otherwise
                .as_ref()
                .is_none_or(|rule| rule.validate(input, output))
    }

    fn execute_on(
        &self,
        input: &dyn FieldModel,
        output: &mut dyn FieldModel,
        ctx: &mut EvalContext,
    ) -> Result<()> {
        if self.condition.evaluate(input, ctx) {
            self.then.execute_on(input, output, ctx)
        } else if let Some(otherwise) = &self.otherwise {
            otherwise.execute_on(input, output, ctx)
        } else {
            Ok(())
        }
    }
}

pub fn when(condition: &StepCondition) -> ConditionalMappingBuilder {
    ConditionalMappingBuilder {
        condition: condition.clone(),
    }
}

pub struct ConditionalMappingBuilder {
    condition: StepCondition,
}

impl ConditionalMappingBuilder {
    pub fn then(self, rule: impl MappingRule + 'static) -> ConditionalMapping {
        let then: Arc<dyn MappingRule> = Arc::new(rule);
        let node = Node::conditional(self.condition.node().clone(), then.node(), None);
        ConditionalMapping {
            condition: self.condition,
            then,
            otherwise: None,
            node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GenericModel;
    use crate::value::Value;

    fn ctx(rule: &dyn MappingRule) -> EvalContext {
        EvalContext::new(rule.node(), true)
    }

    #[test]
    fn test_field_mapping() {
        let mut input = GenericModel::new();
        let first_name = input.text_field(Some("ada"), "first name");
        let mut output = GenericModel::new();
        let display = output.text_field(None, "display name");

        let rule = map(&first_name)
            .using(converter(|s: String| s.to_uppercase(), "upper case"))
            .to(&display);

        assert!(rule.validate(&input, &output));
        let mut ctx = ctx(&rule);
        rule.execute_on(&input, &mut output, &mut ctx).unwrap();
        assert_eq!(output.get(display.id()), Some(Value::from("ADA")));
        assert_eq!(
            rule.readable(Locale::En),
            "map first name using 'upper case' to display name"
        );
    }

    #[test]
    fn test_validate_requires_declared_fields() {
        let mut input = GenericModel::new();
        let amount = input.int_field(10, "amount");
        let output = GenericModel::new();
        let total: Field<i64> = Field::new("total", "total");

        let rule = map(&amount).to(&total);
        assert!(!rule.validate(&input, &output));
    }

    #[test]
    fn test_conversion_error_propagates() {
        let mut input = GenericModel::new();
        let raw = input.text_field(Some("abc"), "raw");
        let mut output = GenericModel::new();
        let parsed = output.int_field(0, "parsed");

        let rule = map(&raw).using(from_string::<i64>()).to(&parsed);
        let mut ctx = ctx(&rule);
        assert!(rule.execute_on(&input, &mut output, &mut ctx).is_err());
        assert_eq!(output.get(parsed.id()), Some(Value::Int(0)));
    }

    #[test]
    fn test_conditional_mapping() {
        let mut input = GenericModel::new();
        let vip = input.bool_field(false, "vip");
        let mut output = GenericModel::new();
        let tier = output.text_field(None, "tier");

        let rule = when(&vip.is_true())
            .then(map_value("gold".to_string()).to(&tier))
            .otherwise(map_value("standard".to_string()).to(&tier));

        let mut ctx = ctx(&rule);
        rule.execute_on(&input, &mut output, &mut ctx).unwrap();
        assert_eq!(output.get(tier.id()), Some(Value::from("standard")));
        assert_eq!(
            rule.readable(Locale::En),
            "when vip is true then map 'gold' to tier else map 'standard' to tier"
        );
    }

    #[test]
    fn test_bi_and_nary_mappings() {
        let mut input = GenericModel::new();
        let first = input.text_field(Some("Ada"), "first");
        let last = input.text_field(Some("Lovelace"), "last");
        let mut output = GenericModel::new();
        let full = output.text_field(None, "full");
        let filled = output.int_field(0, "filled");

        let join = map2(&first, &last)
            .using(bi_converter_or(
                |a: String, b: String| format!("{} {}", a, b),
                String::new(),
                "full name",
            ))
            .to(&full);
        let count = map_n(vec![first.reference(), last.reference()])
            .using(counter("present"))
            .to(&filled);

        let mut ctx = ctx(&join);
        join.execute_on(&input, &mut output, &mut ctx).unwrap();
        count.execute_on(&input, &mut output, &mut ctx).unwrap();

        assert_eq!(output.get(full.id()), Some(Value::from("Ada Lovelace")));
        assert_eq!(output.get(filled.id()), Some(Value::Int(2)));
        assert_eq!(
            count.readable(Locale::En),
            "map first and last using 'present' to filled"
        );
    }
}
