//! 映射规则注册表
//!
//! 按声明顺序依次执行映射规则。`validate_and_execute` 会跳过输入输出模型不满足的规则。

use super::MappingRule;
use crate::context::EvalContext;
use crate::error::Result;
use crate::model::FieldModel;
use crate::node::{NaryOperator, Node};
use std::sync::Arc;
use tracing::debug;
use verdict_shared::observability::metrics::record_mapping_execution;

#[derive(Clone)]
pub struct MappingRegistry {
    rules: Vec<Arc<dyn MappingRule>>,
    node: Arc<Node>,
}

impl MappingRegistry {
    pub fn mappings(rules: impl IntoIterator<Item = Arc<dyn MappingRule>>) -> Self {
        let rules: Vec<Arc<dyn MappingRule>> = rules.into_iter().collect();
        let node = Node::nary(
            NaryOperator::Mappings,
            rules.iter().map(|rule| rule.node()).collect(),
        );
        Self { rules, node }
    }

    /// 在当前规则之后追加规则，返回新的注册表
    pub fn with(&self, rules: impl IntoIterator<Item = Arc<dyn MappingRule>>) -> Self {
        Self::mappings(self.rules.iter().cloned().chain(rules))
    }

    pub fn rules(&self) -> &[Arc<dyn MappingRule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 只执行通过校验的规则，返回本次执行的上下文
    pub fn validate_and_execute(
        &self,
        input: &dyn FieldModel,
        output: &mut dyn FieldModel,
    ) -> Result<EvalContext> {
        let mut ctx = EvalContext::new(self.node.clone(), true);
        let mut executed = 0usize;
        for rule in &self.rules {
            if rule.validate(input, output) {
                rule.execute_on(input, output, &mut ctx)?;
                executed += 1;
            } else {
                debug!(mapping = %rule.node(), "映射规则校验未通过，跳过");
            }
        }
        record_mapping_execution(executed, self.rules.len() - executed);
        debug!(executed, total = self.rules.len(), "映射执行完成");
        Ok(ctx)
    }
}

impl std::fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("rules", &self.rules.len())
            .field("node", &self.node.id())
            .finish()
    }
}

impl MappingRule for MappingRegistry {
    fn node(&self) -> Arc<Node> {
        self.node.clone()
    }

    fn validate(&self, input: &dyn FieldModel, output: &dyn FieldModel) -> bool {
        self.rules.iter().all(|rule| rule.validate(input, output))
    }

    fn execute_on(
        &self,
        input: &dyn FieldModel,
        output: &mut dyn FieldModel,
        ctx: &mut EvalContext,
    ) -> Result<()> {
        for rule in &self.rules {
            rule.execute_on(input, output, ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::mapping::{IntoSharedRule, map, map_value};
    use crate::model::GenericModel;
    use crate::render::Locale;
    use crate::value::Value;

    #[test]
    fn test_validate_and_execute_skips_invalid() {
        let mut input = GenericModel::new();
        let name = input.text_field(Some("Ada"), "name");
        let mut output = GenericModel::new();
        let copy = output.text_field(None, "copy");
        let undeclared: Field<String> = Field::new("undeclared", "undeclared");

        let registry = MappingRegistry::mappings([
            map(&name).to(&copy).into_shared(),
            map_value("x".to_string()).to(&undeclared).into_shared(),
        ]);

        assert_eq!(registry.len(), 2);
        assert!(!registry.validate(&input, &output));
        registry.validate_and_execute(&input, &mut output).unwrap();

        assert_eq!(output.get(copy.id()), Some(Value::from("Ada")));
        assert!(!output.contains(undeclared.id()));
    }

    #[test]
    fn test_with_appends() {
        let mut output = GenericModel::new();
        let a = output.int_field(0, "a");
        let b = output.int_field(0, "b");

        let registry = MappingRegistry::mappings([map_value(1i64).to(&a).into_shared()]);
        let extended = registry.with([map_value(2i64).to(&b).into_shared()]);

        assert_eq!(registry.len(), 1);
        assert_eq!(extended.len(), 2);
        assert!(MappingRegistry::mappings(Vec::<Arc<dyn MappingRule>>::new()).is_empty());

        extended
            .validate_and_execute(&GenericModel::new(), &mut output)
            .unwrap();
        assert_eq!(output.get(b.id()), Some(Value::Int(2)));
        assert_eq!(
            extended.readable(Locale::En),
            "mappings (map 1 to a, map 2 to b)"
        );
    }
}
