//! 求值与归约的组合测试
//!
//! 覆盖逻辑组合的真值表、短路对结果的影响、各组合在两种归约下的解释文本以及节点计数。

use rule_engine::dsl::{always_false, always_true, constant, count, match_all, match_any, match_none};
use rule_engine::stats;
use rule_engine::{GenericModel, Locale, ReduceType, StepCondition, when};

fn flags(a: bool, b: bool) -> (GenericModel, StepCondition, StepCondition) {
    let mut model = GenericModel::new();
    let left = model.bool_field(a, "a").is_true();
    let right = model.bool_field(b, "b").is_true();
    (model, left, right)
}

fn explain(condition: &StepCondition, short_circuit: bool, kind: ReduceType) -> Option<String> {
    when(condition)
        .validate()
        .with_short_circuit(short_circuit)
        .execute()
        .reduce_message(Locale::En, kind)
}

// ==================== 真值表 ====================

#[test]
fn test_truth_tables_hold_in_both_modes() {
    let combos = [(false, false), (false, true), (true, false), (true, true)];

    for (a, b) in combos {
        let (model, left, right) = flags(a, b);
        let cases = [
            (left.and(&right), a && b),
            (left.or(&right), a || b),
            (left.xor(&right), a ^ b),
            (left.not(), !a),
            (match_any(&[left.clone(), right.clone()]), a || b),
            (match_all(&[left.clone(), right.clone()]), a && b),
            (match_none(&[left.clone(), right.clone()]), !a && !b),
        ];

        for (condition, expected) in cases {
            let rule = when(&condition).validate();
            for short_circuit in [true, false] {
                let result = rule.with_short_circuit(short_circuit).execute_on(&model);
                assert_eq!(
                    result.value(),
                    expected,
                    "{} with a={}, b={}, short_circuit={}",
                    condition.readable(Locale::En),
                    a,
                    b,
                    short_circuit
                );
            }
        }
    }
}

#[test]
fn test_count_comparators() {
    let children = [constant(true), constant(false), constant(true)];

    let cases = [
        (count(&children).greater_than(1), true),
        (count(&children).greater_than(2), false),
        (count(&children).greater_or_equals(2), true),
        (count(&children).lesser_than(2), false),
        (count(&children).lesser_or_equals(2), true),
        (count(&children).equals(2), true),
        (count(&children).not_equals(2), false),
    ];

    for (condition, expected) in cases {
        assert_eq!(
            when(&condition).validate().execute().value(),
            expected,
            "{}",
            condition.readable(Locale::En)
        );
    }
}

// ==================== 短路 ====================

#[test]
fn test_short_circuit_skips_right_operand() {
    let a = always_false("A");
    let b = always_true("B");
    let rule = when(&a.and(&b)).validate();

    let short = rule.execute();
    let exhaustive = rule.with_short_circuit(false).execute();

    assert_eq!(short.value(), exhaustive.value());
    assert_eq!(short.context().visited().len(), 2);
    assert_eq!(exhaustive.context().visited().len(), 3);
    assert!(!short.context().is_visited(b.node().id()));
    assert!(exhaustive.context().is_eval_true(b.node().id()));
}

#[test]
fn test_or_short_circuit_on_true_left() {
    let a = always_true("A");
    let b = always_false("B");
    let rule = when(&a.or(&b)).validate();

    assert_eq!(rule.execute().context().visited().len(), 2);
    assert_eq!(
        rule.with_short_circuit(false)
            .execute()
            .context()
            .visited()
            .len(),
        3
    );
}

#[test]
fn test_xor_and_nary_ignore_short_circuit() {
    let xor = always_true("A").xor(&always_true("B"));
    let nary = match_any(&[always_true("A"), always_true("B"), always_true("C")]);

    assert_eq!(when(&xor).validate().execute().context().visited().len(), 3);
    assert_eq!(when(&nary).validate().execute().context().visited().len(), 4);
}

// ==================== 归约 ====================

#[test]
fn test_and_failure_keeps_false_operands() {
    let rule = always_false("A").and(&always_false("B"));

    assert_eq!(
        explain(&rule, false, ReduceType::Failure).as_deref(),
        Some("always false A and always false B")
    );
    // 短路时右侧未被求值，不出现在解释中
    assert_eq!(
        explain(&rule, true, ReduceType::Failure).as_deref(),
        Some("always false A")
    );

    let mixed = always_true("A").and(&always_false("B"));
    assert_eq!(
        explain(&mixed, true, ReduceType::Failure).as_deref(),
        Some("always false B")
    );
    assert_eq!(explain(&mixed, true, ReduceType::Success), None);
}

#[test]
fn test_and_success_keeps_both() {
    let rule = always_true("A").and(&always_true("B"));
    assert_eq!(
        explain(&rule, true, ReduceType::Success).as_deref(),
        Some("always true A and always true B")
    );
}

#[test]
fn test_or_reduce() {
    let rule = always_false("A").or(&always_true("B"));
    assert_eq!(
        explain(&rule, true, ReduceType::Success).as_deref(),
        Some("always true B")
    );

    let both = always_true("A").or(&always_true("B"));
    assert_eq!(
        explain(&both, false, ReduceType::Success).as_deref(),
        Some("always true A or always true B")
    );
    assert_eq!(
        explain(&both, true, ReduceType::Success).as_deref(),
        Some("always true A")
    );

    let failing = always_false("A").or(&always_false("B"));
    assert_eq!(
        explain(&failing, true, ReduceType::Failure).as_deref(),
        Some("always false A or always false B")
    );
}

#[test]
fn test_exhaustive_reduce_drops_irrelevant_operand() {
    // 穷举求值时右侧也被访问，解释中仍只保留决定结果的一侧
    let or = always_true("A").or(&always_false("B"));
    assert_eq!(
        explain(&or, false, ReduceType::Success).as_deref(),
        Some("always true A")
    );
    assert_eq!(explain(&or, false, ReduceType::Failure), None);

    let and = always_false("A").and(&always_true("B"));
    assert_eq!(
        explain(&and, false, ReduceType::Failure).as_deref(),
        Some("always false A")
    );
    assert_eq!(explain(&and, false, ReduceType::Success), None);
}

#[test]
fn test_xor_reduce_uses_own_outcomes() {
    let rule = always_true("A").xor(&always_false("B"));
    assert_eq!(
        explain(&rule, true, ReduceType::Success).as_deref(),
        Some("always true A xor always false B")
    );

    let failing = always_true("A").xor(&always_true("B"));
    assert_eq!(
        explain(&failing, true, ReduceType::Failure).as_deref(),
        Some("always true A xor always true B")
    );
}

#[test]
fn test_not_reduce_flips_kind() {
    let rule = always_true("A").and(&always_false("B")).not();

    assert_eq!(
        explain(&rule, false, ReduceType::Success).as_deref(),
        Some("always false B")
    );
    assert_eq!(explain(&rule, false, ReduceType::Failure), None);
}

#[test]
fn test_nested_reduce_keeps_declaration_order() {
    let rule = always_false("A")
        .or(&always_true("B").and(&always_true("C")))
        .and(&always_true("D"));

    assert_eq!(
        explain(&rule, true, ReduceType::Success).as_deref(),
        Some("(always true B and always true C) and always true D")
    );
}

#[test]
fn test_match_all_failure_keeps_false_children() {
    let rule = match_all(&[always_true("A"), always_false("B"), always_false("C")]);
    assert_eq!(
        explain(&rule, true, ReduceType::Failure).as_deref(),
        Some("always false B and always false C")
    );
    assert_eq!(explain(&rule, true, ReduceType::Success), None);
}

#[test]
fn test_match_none_success_lists_all_false_children() {
    let rule = match_none(&[always_false("A"), always_false("B")]);
    assert_eq!(
        explain(&rule, true, ReduceType::Success).as_deref(),
        Some("always false A and always false B")
    );
}

#[test]
fn test_count_equals_reduces_each_child_by_own_outcome() {
    let rule = count(&[always_true("A"), always_false("B")]).equals(1);
    assert_eq!(
        explain(&rule, true, ReduceType::Success).as_deref(),
        Some("always true A and always false B")
    );
}

#[test]
fn test_explain_follows_result() {
    let passing = when(&always_true("A")).validate().execute();
    let failing = when(&always_false("A")).validate().execute();

    assert_eq!(passing.explain(Locale::En).as_deref(), Some("always true A"));
    assert_eq!(passing.failure_cause(Locale::En), None);
    assert_eq!(failing.explain(Locale::En).as_deref(), Some("always false A"));
    assert_eq!(
        failing.failure_cause(Locale::En).as_deref(),
        Some("always false A")
    );
}

// ==================== 计数 ====================

#[test]
fn test_counters_accumulate_across_executions() {
    let a = always_false("A");
    let b = always_true("B");
    let condition = a.and(&b);
    let rule = when(&condition).validate();

    for _ in 0..3 {
        rule.execute();
    }
    rule.with_short_circuit(false).execute();

    assert_eq!(a.node().false_eval_count(), 4);
    assert_eq!(a.node().true_eval_count(), 0);
    assert_eq!(b.node().true_eval_count(), 1);
    assert_eq!(condition.node().false_eval_count(), 4);

    let collected = stats::collect(rule.root());
    assert_eq!(collected.len(), 3);
    assert_eq!(collected[0].depth, 0);
    assert_eq!(collected[0].total(), 4);
    assert_eq!(collected[0].percentage(), Some(0));
    assert_eq!(collected[2].true_rate(), Some(1.0));

    stats::reset(rule.root());
    assert!(
        stats::collect(rule.root())
            .iter()
            .all(|s| s.total() == 0 && s.true_rate().is_none())
    );
}
