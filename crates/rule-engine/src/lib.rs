//! 可解释的布尔规则引擎
//!
//! 提供：
//! - 基于字段模型的条件 DSL 与短路求值
//! - 结构化节点树，可合并、扁平化并按语言渲染为可读文本
//! - 结果归约：解释规则为何成立或失败
//! - 节点级求值统计
//! - 映射规则：条件化地在模型之间复制和转换字段
//! - JSON 规则定义、编译和线程安全的规则存储

pub mod compiler;
pub mod condition;
pub mod context;
pub mod dsl;
pub mod error;
pub mod field;
pub mod mapping;
pub mod model;
pub mod models;
pub mod node;
pub mod operators;
pub mod reducer;
pub mod render;
pub mod result;
pub mod rule;
pub mod stats;
pub mod store;
pub mod value;

pub use compiler::{CompiledRule, RuleCompiler};
pub use condition::{StepCondition, ValueCondition};
pub use context::EvalContext;
pub use error::{Result, RuleError};
pub use field::{Field, FieldRef, FieldValue};
pub use model::{FieldId, FieldModel, GenericModel};
pub use models::{ConditionDef, CountGroup, LogicalGroup, NotGroup, RuleDefinition, RuleNode};
pub use node::{Element, Leaf, NaryOperator, Node, NodeId, NodeKind};
pub use operators::{Comparator, LogicalOperator, Operator};
pub use render::{Locale, Renderer, TextRenderer};
pub use result::{EvalResult, ReduceType, Reduced};
pub use rule::{ValidationRule, when};
pub use store::{RuleStore, RuleStoreStats};
pub use value::{Value, ValueKind};
