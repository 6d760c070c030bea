//! verdict 命令行工具
//!
//! 在 JSON 模型上执行 JSON 规则定义，输出结果及其解释。
//!
//! ```bash
//! # 执行规则并解释结果
//! verdict eval -r rule.json -m model.json --locale fr
//!
//! # 关闭短路并输出每个节点的统计
//! verdict eval -r rule.json -m model.json --exhaustive --stats
//!
//! # 只打印规则的可读形式
//! verdict show -r rule.json --locale zh-CN
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rule_engine::stats::{self, NodeStats};
use rule_engine::{CompiledRule, GenericModel, Locale, RuleStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use verdict_shared::config::AppConfig;
use verdict_shared::observability;

#[derive(Parser, Debug)]
#[command(name = "verdict")]
#[command(version, about = "可解释的布尔规则执行工具")]
#[command(propagate_version = true)]
struct Cli {
    /// 日志级别，覆盖配置文件 (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// 输出语言标签，覆盖配置文件 (en, fr-FR, zh-CN)
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在模型上执行规则
    Eval {
        /// JSON 规则定义文件
        #[arg(short, long)]
        rule: PathBuf,

        /// JSON 模型文件，缺省时在空模型上执行
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// 关闭短路，求值所有节点
        #[arg(long)]
        exhaustive: bool,

        /// 输出每个节点的求值统计
        #[arg(long)]
        stats: bool,
    },

    /// 打印规则的可读形式
    Show {
        /// JSON 规则定义文件
        #[arg(short, long)]
        rule: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load("verdict").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let mut obs_config = config.observability.clone();
    if let Some(level) = &cli.log_level {
        obs_config.log_level = level.clone();
    }
    observability::init(&obs_config, &config.service_name)?;

    let locale: Locale = cli
        .locale
        .as_deref()
        .unwrap_or(&config.engine.locale)
        .parse()?;

    let store = RuleStore::new();

    match cli.command {
        Commands::Eval {
            rule,
            model,
            exhaustive,
            stats: show_stats,
        } => {
            let compiled = load_rule(&store, &rule)?;
            let model = match model {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("无法读取模型文件 {}", path.display()))?;
                    GenericModel::from_json_str(&text)?
                }
                None => GenericModel::new(),
            };

            let short_circuit =
                !exhaustive && config.engine.short_circuit && compiled.definition.short_circuit;
            let rule = compiled.rule.with_short_circuit(short_circuit);
            info!(rule_id = %compiled.id(), short_circuit, "执行规则");

            let result = rule.execute_on(&model);
            println!("{}", rule.readable(locale));
            println!("value: {}", result.value());
            if let Some(explanation) = result.explain(locale) {
                let label = if result.value() { "reason" } else { "failure cause" };
                println!("{}: {}", label, explanation);
            }

            if show_stats || config.engine.trace {
                println!();
                for node_stats in stats::collect(rule.root()) {
                    println!("{}", format_stats(&node_stats, locale));
                }
            }
        }
        Commands::Show { rule } => {
            let compiled = load_rule(&store, &rule)?;
            println!("{}", compiled.rule.readable(locale));
        }
    }

    Ok(())
}

fn load_rule(store: &RuleStore, path: &Path) -> Result<Arc<CompiledRule>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取规则文件 {}", path.display()))?;
    let rule_id = store.load_from_json(&json)?;
    store
        .get(&rule_id)
        .with_context(|| format!("规则 {} 加载后不存在", rule_id))
}

fn format_stats(node_stats: &NodeStats, locale: Locale) -> String {
    let rate = node_stats
        .percentage()
        .map(|p| format!("{}%", p))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}[{} true / {} false, {}] {}",
        "  ".repeat(node_stats.depth),
        node_stats.true_count,
        node_stats.false_count,
        rate,
        node_stats.node.readable(locale)
    )
}
