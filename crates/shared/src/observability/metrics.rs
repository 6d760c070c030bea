//! 指标记录
//!
//! 基于 metrics 门面记录规则相关指标。未安装 recorder 时记录为空操作。

/// 注册指标描述
pub fn describe_metrics() {
    metrics::describe_counter!(
        "rule_evaluations_total",
        "Total number of rule evaluations by outcome"
    );
    metrics::describe_histogram!(
        "rule_evaluation_duration_seconds",
        "Rule evaluation duration in seconds"
    );
    metrics::describe_counter!("rule_loads_total", "Total number of rule loads by status");
    metrics::describe_counter!(
        "mapping_rules_executed_total",
        "Total number of mapping rules executed"
    );
}

/// 记录规则求值
#[inline]
pub fn record_rule_evaluation(matched: bool, duration_secs: f64) {
    metrics::counter!(
        "rule_evaluations_total",
        "outcome" => if matched { "success" } else { "failure" }
    )
    .increment(1);

    metrics::histogram!("rule_evaluation_duration_seconds").record(duration_secs);
}

/// 记录规则加载，status 为 loaded 或 rejected
#[inline]
pub fn record_rule_load(status: &'static str) {
    metrics::counter!("rule_loads_total", "status" => status).increment(1);
}

#[inline]
pub fn record_mapping_execution(executed: usize, skipped: usize) {
    metrics::counter!("mapping_rules_executed_total", "result" => "executed")
        .increment(executed as u64);
    metrics::counter!("mapping_rules_executed_total", "result" => "skipped")
        .increment(skipped as u64);
}
