//! 规则存储管理
//!
//! 使用 DashMap 缓存编译后的规则，多个线程可以同时加载、替换和执行规则。
//! 规则编译后不可变，读取方拿到的是 `Arc`，替换规则不会影响正在执行的旧版本。

use crate::compiler::{CompiledRule, RuleCompiler};
use crate::error::{Result, RuleError};
use crate::model::FieldModel;
use crate::models::RuleDefinition;
use crate::result::EvalResult;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use verdict_shared::observability::metrics::record_rule_load;

#[derive(Clone)]
pub struct RuleStore {
    rules: Arc<DashMap<String, Arc<CompiledRule>>>,
    compiler: Arc<Mutex<RuleCompiler>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
            compiler: Arc::new(Mutex::new(RuleCompiler::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 编译并加载规则，同 ID 的规则会被替换
    #[instrument(skip(self, definition), fields(rule_id = %definition.id, rule_name = %definition.name))]
    pub fn load(&self, definition: RuleDefinition) -> Result<()> {
        let compiled = self.compiler.lock().compile(definition);
        self.insert(compiled).map(|_| ())
    }

    #[instrument(skip(self, json))]
    pub fn load_from_json(&self, json: &str) -> Result<String> {
        let compiled = self.compiler.lock().compile_from_json(json);
        self.insert(compiled)
    }

    fn insert(&self, compiled: Result<CompiledRule>) -> Result<String> {
        let compiled = match compiled {
            Ok(compiled) => compiled,
            Err(e) => {
                record_rule_load("rejected");
                warn!("规则编译失败: {}", e);
                return Err(e);
            }
        };
        let rule_id = compiled.id().to_string();
        self.rules.insert(rule_id.clone(), Arc::new(compiled));
        record_rule_load("loaded");
        info!("规则已加载: {}", rule_id);
        Ok(rule_id)
    }

    /// 替换已存在的规则
    #[instrument(skip(self, definition), fields(rule_id = %definition.id))]
    pub fn update(&self, definition: RuleDefinition) -> Result<()> {
        if !self.rules.contains_key(&definition.id) {
            warn!("更新不存在的规则: {}", definition.id);
            return Err(RuleError::RuleNotFound(definition.id));
        }
        self.load(definition)
    }

    #[instrument(skip(self))]
    pub fn delete(&self, rule_id: &str) -> Result<()> {
        if self.rules.remove(rule_id).is_some() {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(RuleError::RuleNotFound(rule_id.to_string()))
        }
    }

    pub fn get(&self, rule_id: &str) -> Option<Arc<CompiledRule>> {
        self.rules.get(rule_id).map(|r| r.value().clone())
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    pub fn list_all(&self) -> Vec<Arc<CompiledRule>> {
        self.rules.iter().map(|r| r.value().clone()).collect()
    }

    /// 在模型上执行指定规则
    ///
    /// 先取出规则的 `Arc` 再执行，执行期间不持有 DashMap 的分片锁。
    #[instrument(skip(self, model))]
    pub fn evaluate(&self, rule_id: &str, model: &dyn FieldModel) -> Result<EvalResult> {
        let rule = self
            .get(rule_id)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))?;
        let result = rule.evaluate(model);
        debug!(value = result.value(), "规则执行完成");
        Ok(result)
    }

    /// 汇总当前加载的规则：引用到的字段（去重）以及关闭短路的规则数
    pub fn stats(&self) -> RuleStoreStats {
        let mut fields = HashSet::new();
        let mut exhaustive_rules = 0;
        for rule in self.rules.iter() {
            fields.extend(rule.required_fields.iter().cloned());
            if !rule.definition.short_circuit {
                exhaustive_rules += 1;
            }
        }
        RuleStoreStats {
            rules_count: self.rules.len(),
            distinct_fields: fields.len(),
            exhaustive_rules,
        }
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone)]
pub struct RuleStoreStats {
    pub rules_count: usize,
    pub distinct_fields: usize,
    pub exhaustive_rules: usize,
}
