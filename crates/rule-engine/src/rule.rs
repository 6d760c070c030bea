//! 校验规则
//!
//! `when(condition).validate()` 产生 [`ValidationRule`]。规则本身不可变，
//! 可以在多个线程间共享并重复执行；每次执行都有独立的求值上下文。

use crate::condition::StepCondition;
use crate::context::EvalContext;
use crate::model::{FieldModel, GenericModel};
use crate::node::Node;
use crate::render::{Locale, TextRenderer};
use crate::result::EvalResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use verdict_shared::observability::metrics::record_rule_evaluation;

pub fn when(condition: &StepCondition) -> When {
    When {
        condition: condition.clone(),
    }
}

#[derive(Debug, Clone)]
pub struct When {
    condition: StepCondition,
}

impl When {
    pub fn validate(&self) -> ValidationRule {
        ValidationRule::new(self.condition.clone())
    }
}

#[derive(Debug, Clone)]
pub struct ValidationRule {
    condition: StepCondition,
    short_circuit: bool,
}

impl ValidationRule {
    /// 默认开启短路
    pub fn new(condition: StepCondition) -> Self {
        Self {
            condition,
            short_circuit: true,
        }
    }

    pub fn condition(&self) -> &StepCondition {
        &self.condition
    }

    pub fn root(&self) -> &Arc<Node> {
        self.condition.node()
    }

    pub fn is_short_circuit(&self) -> bool {
        self.short_circuit
    }

    /// 返回切换了短路模式的规则，结构节点与计数共享
    pub fn with_short_circuit(&self, short_circuit: bool) -> Self {
        Self {
            condition: self.condition.clone(),
            short_circuit,
        }
    }

    /// 在空模型上执行
    pub fn execute(&self) -> EvalResult {
        self.execute_on(&GenericModel::new())
    }

    pub fn execute_on(&self, model: &dyn FieldModel) -> EvalResult {
        let start = Instant::now();
        let mut context = EvalContext::new(self.root().clone(), self.short_circuit);
        let value = self.condition.evaluate(model, &mut context);
        let elapsed = start.elapsed();

        record_rule_evaluation(value, elapsed.as_secs_f64());

        debug!(
            root = %self.root().id(),
            value,
            visited = context.visited().len(),
            short_circuit = self.short_circuit,
            duration_us = elapsed.as_micros() as u64,
            "规则求值完成"
        );

        EvalResult::new(value, context)
    }

    /// 规则的完整可读形式，如 `rule when a > 1 validate`
    pub fn readable(&self, locale: Locale) -> String {
        TextRenderer.render_rule(self.root(), locale)
    }
}
