//! 条件求值性能基准测试
//!
//! 针对 DSL 构建的条件做细粒度测试：单个比较、短路组合、计数组合、归约与渲染。

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rule_engine::dsl::{count, today};
use rule_engine::{GenericModel, Locale, ReduceType, StepCondition, Value, when};
use std::hint::black_box;

struct Fixture {
    model: GenericModel,
    amount: StepCondition,
    country: StepCondition,
    phone: StepCondition,
    adult: StepCondition,
    tags: StepCondition,
}

fn fixture() -> Fixture {
    let mut model = GenericModel::new();
    let amount = model.int_field(1000, "amount");
    let country = model.text_field(Some("FR"), "country");
    let phone = model.text_field(Some("+33 6 12 34 56 78"), "phone");
    let birth = model.date_field(NaiveDate::from_ymd_opt(1990, 5, 17), "birth date");
    let tags = model.list_field(
        vec![Value::from("a"), Value::from("b"), Value::from("c")],
        "tags",
    );

    Fixture {
        amount: amount.greater_than(500),
        country: country.eq("FR".to_string()),
        phone: phone.starts_with("+33"),
        adult: birth.age_at(&today()).greater_or_equals(18),
        tags: tags.is_not_null(),
        model,
    }
}

fn bench_single_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_condition");
    let f = fixture();

    let cases = [
        ("numeric_gt", &f.amount),
        ("text_eq", &f.country),
        ("starts_with", &f.phone),
        ("age_at", &f.adult),
        ("is_not_null", &f.tags),
    ];

    for (name, condition) in cases {
        let rule = when(condition).validate();
        group.bench_function(name, |b| {
            b.iter(|| black_box(rule.execute_on(black_box(&f.model))))
        });
    }

    group.finish();
}

/// 组合深度相同，短路与否的对比
fn bench_short_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_circuit");
    let f = fixture();

    let failing_first = f.amount.not();
    let chain = [&f.country, &f.phone, &f.adult, &f.tags]
        .into_iter()
        .fold(failing_first, |acc, next| acc.and(next));
    let rule = when(&chain).validate();

    for short_circuit in [true, false] {
        let rule = rule.with_short_circuit(short_circuit);
        group.bench_with_input(
            BenchmarkId::new("and_chain", short_circuit),
            &short_circuit,
            |b, _| b.iter(|| black_box(rule.execute_on(black_box(&f.model)))),
        );
    }

    group.finish();
}

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("count");
    let f = fixture();

    let counted = count(&[
        f.amount.clone(),
        f.country.clone(),
        f.phone.clone(),
        f.adult.clone(),
        f.tags.clone(),
    ])
    .greater_than(3);
    let rule = when(&counted).validate();

    group.bench_function("greater_than", |b| {
        b.iter(|| black_box(rule.execute_on(black_box(&f.model))))
    });

    group.finish();
}

fn bench_explain(c: &mut Criterion) {
    let mut group = c.benchmark_group("explain");
    let f = fixture();

    let condition = f.amount.not().or(&f.country.and(&f.phone.xor(&f.adult)));
    let rule = when(&condition).validate().with_short_circuit(false);
    let result = rule.execute_on(&f.model);

    group.bench_function("reduce", |b| {
        b.iter(|| black_box(result.reduce(black_box(ReduceType::of(result.value())))))
    });

    for locale in [Locale::En, Locale::Fr, Locale::Zh] {
        group.bench_with_input(BenchmarkId::new("readable", locale), &locale, |b, locale| {
            b.iter(|| black_box(rule.readable(*locale)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_conditions,
    bench_short_circuit,
    bench_count,
    bench_explain,
);

criterion_main!(benches);
