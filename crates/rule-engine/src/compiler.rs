//! 规则编译器
//!
//! 将 JSON 规则定义校验并编译为可执行的 [`ValidationRule`]，同时提取规则引用的字段。
//! 操作符与比较值的类型在编译期检查，不兼容时返回错误而不会产生规则。

use crate::condition::StepCondition;
use crate::dsl;
use crate::error::{Result, RuleError};
use crate::field::{Field, FieldValue};
use crate::model::FieldModel;
use crate::models::{ConditionDef, CountGroup, LogicalGroup, RuleDefinition, RuleNode};
use crate::node::{Element, Leaf};
use crate::operators::{LogicalOperator, Operator};
use crate::result::EvalResult;
use crate::rule::{ValidationRule, when};
use crate::value::{Value, ValueKind, parse_temporal};
use regex::Regex;
use std::collections::HashSet;

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始定义
    pub definition: RuleDefinition,
    pub rule: ValidationRule,
    /// 规则中使用的所有字段路径
    pub required_fields: HashSet<String>,
    /// 编译版本号（用于缓存失效）
    pub compile_version: u64,
}

impl CompiledRule {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn evaluate(&self, model: &dyn FieldModel) -> EvalResult {
        self.rule.execute_on(model)
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 从 JSON 字符串编译规则
    pub fn compile_from_json(&mut self, json: &str) -> Result<CompiledRule> {
        let definition: RuleDefinition = serde_json::from_str(json)?;
        self.compile(definition)
    }

    pub fn compile(&mut self, definition: RuleDefinition) -> Result<CompiledRule> {
        self.validate_definition(&definition)?;

        let condition = self.compile_node(&definition.root, "root")?;
        let rule = when(&condition)
            .validate()
            .with_short_circuit(definition.short_circuit);
        let required_fields = self.extract_fields(&definition.root);

        self.compile_version += 1;

        Ok(CompiledRule {
            definition,
            rule,
            required_fields,
            compile_version: self.compile_version,
        })
    }

    fn validate_definition(&self, definition: &RuleDefinition) -> Result<()> {
        if definition.id.is_empty() {
            return Err(RuleError::ParseError("规则 ID 不能为空".to_string()));
        }

        if definition.name.is_empty() {
            return Err(RuleError::ParseError("规则名称不能为空".to_string()));
        }

        Ok(())
    }

    fn compile_node(&self, node: &RuleNode, path: &str) -> Result<StepCondition> {
        match node {
            RuleNode::Condition(cond) => self.compile_condition(cond, path),
            RuleNode::Group(group) => self.compile_group(group, path),
            RuleNode::Not(not) => {
                let child = self.compile_node(&not.child, &format!("{}.child", path))?;
                Ok(child.not())
            }
            RuleNode::Count(count) => self.compile_count(count, path),
        }
    }

    fn compile_children(&self, children: &[RuleNode], path: &str) -> Result<Vec<StepCondition>> {
        if children.is_empty() {
            return Err(RuleError::ParseError(format!("逻辑组 '{}' 不能为空", path)));
        }
        children
            .iter()
            .enumerate()
            .map(|(i, child)| self.compile_node(child, &format!("{}.children[{}]", path, i)))
            .collect()
    }

    fn compile_group(&self, group: &LogicalGroup, path: &str) -> Result<StepCondition> {
        let children = self.compile_children(&group.children, path)?;
        let fold = |combine: fn(&StepCondition, &StepCondition) -> StepCondition| {
            let mut iter = children.iter();
            let first = iter.next().cloned();
            first.map(|first| iter.fold(first, |acc, next| combine(&acc, next)))
        };

        let compiled = match group.operator {
            LogicalOperator::And => fold(StepCondition::and),
            LogicalOperator::Or => fold(StepCondition::or),
            LogicalOperator::Xor => fold(StepCondition::xor),
            LogicalOperator::MatchAny => Some(dsl::match_any(&children)),
            LogicalOperator::MatchAll => Some(dsl::match_all(&children)),
            LogicalOperator::MatchNone => Some(dsl::match_none(&children)),
        };
        compiled.ok_or_else(|| RuleError::ParseError(format!("逻辑组 '{}' 不能为空", path)))
    }

    fn compile_count(&self, count: &CountGroup, path: &str) -> Result<StepCondition> {
        if count.threshold < 0 {
            return Err(RuleError::ParseError(format!(
                "计数节点 '{}' 的阈值不能为负数: {}",
                path, count.threshold
            )));
        }
        let children = self.compile_children(&count.children, path)?;
        Ok(dsl::count(&children).compare(count.comparator, count.threshold))
    }

    fn compile_condition(&self, cond: &ConditionDef, path: &str) -> Result<StepCondition> {
        if cond.field.is_empty() {
            return Err(RuleError::FieldNotFound(format!("条件 '{}' 未指定字段", path)));
        }

        if !cond.operator.is_condition_operator() {
            return Err(RuleError::InvalidOperator {
                operator: cond.operator.to_string(),
                value_type: "condition".to_string(),
            });
        }

        let label = cond.label.clone().unwrap_or_else(|| cond.field.clone());
        let field: Field<Value> = Field::new(cond.field.as_str(), label);

        if !cond.operator.requires_value() {
            return Ok(match cond.operator {
                Operator::IsNull => field.is_null(),
                Operator::IsNotNull => field.is_not_null(),
                Operator::IsEmpty => field.test_presence(Leaf::operator(Operator::IsEmpty), |v| {
                    Value::is_empty_value(v)
                }),
                Operator::IsNotEmpty => field
                    .test_presence(Leaf::operator(Operator::IsNotEmpty), |v| {
                        !Value::is_empty_value(v)
                    }),
                Operator::IsTrue => field.predicate(Leaf::operator(Operator::IsTrue), |v| {
                    *v == Value::Bool(true)
                }),
                _ => field.predicate(Leaf::operator(Operator::IsFalse), |v| {
                    *v == Value::Bool(false)
                }),
            });
        }

        let expected = Value::from_json(&cond.value).ok_or_else(|| {
            RuleError::ParseError(format!(
                "条件 '{}' 的 {} 操作符需要比较值",
                path, cond.operator
            ))
        })?;

        match cond.operator {
            Operator::Eq => Ok(field.eq(expected)),
            Operator::Neq => Ok(field.not_eq(expected)),
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                let expected = ordered(expected, cond.operator)?;
                Ok(match cond.operator {
                    Operator::Gt => field.greater_than(expected),
                    Operator::Gte => field.greater_or_equals(expected),
                    Operator::Lt => field.lesser_than(expected),
                    _ => field.lesser_or_equals(expected),
                })
            }
            Operator::Between => {
                let (min, max) = bounds(expected, path)?;
                Ok(field.between(min, max))
            }
            Operator::In | Operator::NotIn => {
                let Value::List(items) = expected else {
                    return Err(RuleError::ParseError(format!(
                        "条件 '{}' 的 {} 操作符需要数组值",
                        path, cond.operator
                    )));
                };
                Ok(if cond.operator == Operator::In {
                    field.any_match(items)
                } else {
                    field.none_match(items)
                })
            }
            Operator::Contains => {
                let suffix = operand(Operator::Contains, &expected);
                Ok(field.predicate(suffix, move |v| v.contains(&expected)))
            }
            Operator::StartsWith | Operator::EndsWith => {
                let text = text_value(&expected, cond.operator)?;
                let suffix = operand(cond.operator, &expected);
                let starts = cond.operator == Operator::StartsWith;
                Ok(field.predicate(suffix, move |v| {
                    v.as_str().is_some_and(|s| {
                        if starts {
                            s.starts_with(text.as_str())
                        } else {
                            s.ends_with(text.as_str())
                        }
                    })
                }))
            }
            Operator::Regex => {
                let pattern = text_value(&expected, cond.operator)?;
                // 预编译正则表达式
                let regex = Regex::new(&pattern).map_err(|e| {
                    RuleError::CompileError(format!(
                        "条件 '{}' 的正则表达式无效: {}",
                        path, e
                    ))
                })?;
                let suffix = operand(Operator::Regex, &expected);
                Ok(field.predicate(suffix, move |v| {
                    v.as_str().is_some_and(|s| regex.is_match(s))
                }))
            }
            Operator::Before | Operator::BeforeOrEq | Operator::After | Operator::AfterOrEq => {
                let instant = expected.as_temporal().map(Value::DateTime).ok_or_else(|| {
                    RuleError::ParseError(format!(
                        "条件 '{}' 的 {} 操作符需要日期或时间，当前为 {}",
                        path, cond.operator, expected
                    ))
                })?;
                Ok(match cond.operator {
                    Operator::Before => field.before(instant),
                    Operator::BeforeOrEq => field.before_or_eq(instant),
                    Operator::After => field.after(instant),
                    _ => field.after_or_eq(instant),
                })
            }
            other => Err(RuleError::InvalidOperator {
                operator: other.to_string(),
                value_type: expected.kind().to_string(),
            }),
        }
    }

    /// 提取规则中使用的所有字段
    fn extract_fields(&self, node: &RuleNode) -> HashSet<String> {
        let mut fields = HashSet::new();
        self.collect_fields(node, &mut fields);
        fields
    }

    fn collect_fields(&self, node: &RuleNode, fields: &mut HashSet<String>) {
        match node {
            RuleNode::Condition(cond) => {
                fields.insert(cond.field.clone());
            }
            RuleNode::Group(LogicalGroup { children, .. })
            | RuleNode::Count(CountGroup { children, .. }) => {
                for child in children {
                    self.collect_fields(child, fields);
                }
            }
            RuleNode::Not(not) => self.collect_fields(&not.child, fields),
        }
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn operand(operator: Operator, value: &Value) -> Leaf {
    Leaf::operator(operator).with(Element::Value(value.describe()))
}

/// 大小比较只接受数值、日期或文本
fn ordered(value: Value, operator: Operator) -> Result<Value> {
    match value.kind() {
        ValueKind::Int | ValueKind::Float | ValueKind::Date | ValueKind::DateTime => Ok(value),
        ValueKind::Text => Ok(value
            .as_str()
            .and_then(parse_temporal)
            .map(Value::DateTime)
            .unwrap_or(value)),
        other => Err(RuleError::InvalidOperator {
            operator: operator.to_string(),
            value_type: other.to_string(),
        }),
    }
}

fn bounds(value: Value, path: &str) -> Result<(Value, Value)> {
    match value {
        Value::List(items) if items.len() == 2 => {
            let mut items = items.into_iter();
            match (items.next(), items.next()) {
                (Some(min), Some(max)) => Ok((
                    ordered(min, Operator::Between)?,
                    ordered(max, Operator::Between)?,
                )),
                _ => Err(RuleError::ParseError(format!(
                    "条件 '{}' 的 between 操作符需要 [min, max] 数组",
                    path
                ))),
            }
        }
        Value::List(items) => Err(RuleError::ParseError(format!(
            "条件 '{}' 的 between 操作符需要 [min, max] 数组，当前有 {} 个元素",
            path,
            items.len()
        ))),
        _ => Err(RuleError::ParseError(format!(
            "条件 '{}' 的 between 操作符需要 [min, max] 数组",
            path
        ))),
    }
}

fn text_value(value: &Value, operator: Operator) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RuleError::TypeMismatch {
            expected: format!("{} 的字符串值", operator),
            actual: value.kind().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GenericModel;
    use crate::render::Locale;
    use serde_json::json;

    fn sample_rule_json() -> &'static str {
        r#"
        {
            "id": "rule-001",
            "name": "vip_purchase",
            "version": "1.0",
            "root": {
                "type": "group",
                "operator": "AND",
                "children": [
                    {
                        "type": "condition",
                        "field": "event.type",
                        "operator": "eq",
                        "value": "PURCHASE"
                    },
                    {
                        "type": "group",
                        "operator": "OR",
                        "children": [
                            {
                                "type": "condition",
                                "field": "order.amount",
                                "operator": "gte",
                                "value": 500
                            },
                            {
                                "type": "condition",
                                "field": "user.is_vip",
                                "operator": "eq",
                                "value": true
                            }
                        ]
                    }
                ]
            }
        }
        "#
    }

    fn condition_json(operator: &str, value: serde_json::Value) -> String {
        json!({
            "id": "rule-001",
            "name": "test",
            "root": {
                "type": "condition",
                "field": "subject",
                "operator": operator,
                "value": value
            }
        })
        .to_string()
    }

    #[test]
    fn test_compile_from_json() {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler.compile_from_json(sample_rule_json()).unwrap();

        assert_eq!(compiled.id(), "rule-001");
        assert_eq!(compiled.name(), "vip_purchase");
        assert_eq!(compiled.required_fields.len(), 3);
        assert!(compiled.required_fields.contains("event.type"));
        assert!(compiled.required_fields.contains("order.amount"));
        assert!(compiled.required_fields.contains("user.is_vip"));
    }

    #[test]
    fn test_compiled_rule_evaluates() {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler.compile_from_json(sample_rule_json()).unwrap();

        let model = GenericModel::from_json(&json!({
            "event": {"type": "PURCHASE"},
            "order": {"amount": 100},
            "user": {"is_vip": false}
        }));
        let result = compiled.evaluate(&model);

        assert!(!result.value());
        assert_eq!(
            result.failure_cause(Locale::En).as_deref(),
            Some("order.amount >= 500 or user.is_vip = true")
        );
    }

    #[test]
    fn test_compile_version() {
        let mut compiler = RuleCompiler::new();

        let compiled1 = compiler.compile_from_json(sample_rule_json()).unwrap();
        let compiled2 = compiler.compile_from_json(sample_rule_json()).unwrap();

        assert_eq!(compiled1.compile_version, 1);
        assert_eq!(compiled2.compile_version, 2);
    }

    #[test]
    fn test_validate_empty_id() {
        let mut compiler = RuleCompiler::new();
        let json = r#"
        {
            "id": "",
            "name": "test",
            "version": "1.0",
            "root": {
                "type": "condition",
                "field": "a",
                "operator": "eq",
                "value": 1
            }
        }
        "#;

        let result = compiler.compile_from_json(json);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("规则 ID 不能为空"));
    }

    #[test]
    fn test_validate_empty_group() {
        let mut compiler = RuleCompiler::new();
        let json = r#"
        {
            "id": "rule-001",
            "name": "test",
            "version": "1.0",
            "root": {
                "type": "group",
                "operator": "AND",
                "children": []
            }
        }
        "#;

        let result = compiler.compile_from_json(json);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("不能为空"));
    }

    #[test]
    fn test_validate_between_operator() {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler
            .compile_from_json(&condition_json("between", json!([100, 500])))
            .unwrap();
        let model = GenericModel::from_json(&json!({"subject": 300}));
        assert!(compiled.evaluate(&model).value());

        assert!(compiler
            .compile_from_json(&condition_json("between", json!(100)))
            .is_err());
        assert!(compiler
            .compile_from_json(&condition_json("between", json!([1, 2, 3])))
            .is_err());
    }

    #[test]
    fn test_validate_regex() {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler
            .compile_from_json(&condition_json("regex", json!(r"^[\w.-]+@[\w.-]+\.\w+$")))
            .unwrap();
        let model = GenericModel::from_json(&json!({"subject": "ada@example.com"}));
        assert!(compiled.evaluate(&model).value());
    }

    #[test]
    fn test_validate_invalid_regex() {
        let mut compiler = RuleCompiler::new();
        let result = compiler.compile_from_json(&condition_json("regex", json!("[invalid")));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("正则表达式无效"));
    }

    #[test]
    fn test_type_checks() {
        let mut compiler = RuleCompiler::new();

        let err = compiler
            .compile_from_json(&condition_json("gt", json!(true)))
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperator { .. }));

        let err = compiler
            .compile_from_json(&condition_json("starts_with", json!(3)))
            .unwrap_err();
        assert!(matches!(err, RuleError::TypeMismatch { .. }));

        let err = compiler
            .compile_from_json(&condition_json("before", json!("yesterday")))
            .unwrap_err();
        assert!(matches!(err, RuleError::ParseError(_)));

        let err = compiler
            .compile_from_json(&condition_json("and", json!(1)))
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperator { .. }));

        let err = compiler
            .compile_from_json(&condition_json("eq", json!(null)))
            .unwrap_err();
        assert!(err.to_string().contains("需要比较值"));
    }

    #[test]
    fn test_presence_operators() {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler
            .compile_from_json(&condition_json("is_empty", json!(null)))
            .unwrap();

        assert!(compiled.evaluate(&GenericModel::new()).value());
        let model = GenericModel::from_json(&json!({"subject": "x"}));
        assert!(!compiled.evaluate(&model).value());
    }

    #[test]
    fn test_temporal_condition() {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler
            .compile_from_json(&condition_json("after", json!("2024-01-01")))
            .unwrap();

        let later = GenericModel::from_json(&json!({"subject": "2024-01-15T10:00:00Z"}));
        let earlier = GenericModel::from_json(&json!({"subject": "2023-12-31"}));
        assert!(compiled.evaluate(&later).value());
        assert!(!compiled.evaluate(&earlier).value());
    }

    #[test]
    fn test_count_and_not() {
        let mut compiler = RuleCompiler::new();
        let json = json!({
            "id": "rule-002",
            "name": "profile",
            "short_circuit": false,
            "root": {
                "type": "count",
                "comparator": "greater_or_equals",
                "threshold": 2,
                "children": [
                    {"type": "condition", "field": "a", "operator": "gt", "value": 1},
                    {"type": "not", "child": {"type": "condition", "field": "b", "operator": "is_null"}},
                    {"type": "condition", "field": "c", "operator": "in", "value": ["x", "y"]}
                ]
            }
        });
        let compiled = compiler.compile_from_json(&json.to_string()).unwrap();
        assert!(!compiled.rule.is_short_circuit());
        assert_eq!(compiled.required_fields.len(), 3);

        let model = GenericModel::from_json(&json!({"a": 2, "b": "set", "c": "z"}));
        let result = compiled.evaluate(&model);
        assert!(result.value());
        assert_eq!(
            result.explain(Locale::En).as_deref(),
            Some("a > 1 and b is null")
        );
    }
}
