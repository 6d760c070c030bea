//! 规则引擎错误类型
//!
//! 只有构建期（合并节点、编译 JSON 定义）和协作方（类型转换、语言查找）会产生错误，
//! 规则求值与归约本身是全函数，不会返回错误。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: {0}")]
    ParseError(String),

    #[error("规则编译失败: {0}")]
    CompileError(String),

    #[error("节点无法合并: {left} 与 {right}")]
    IncompatibleMerge { left: String, right: String },

    #[error("无效的操作符: {operator} 不支持类型 {value_type}")]
    InvalidOperator {
        operator: String,
        value_type: String,
    },

    #[error("字段不存在: {0}")]
    FieldNotFound(String),

    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("类型转换失败: {0}")]
    ConversionError(String),

    #[error("不支持的语言: {0}")]
    UnsupportedLocale(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
