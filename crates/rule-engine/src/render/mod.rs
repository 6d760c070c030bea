//! 文本渲染
//!
//! 把结构树渲染为指定语言的可读文本。复合子节点用括号包裹，
//! 因此 `a 且 (b 且 c)` 这样的右嵌套结构保持可读。

mod phrases;

pub use phrases::phrase;

use crate::error::RuleError;
use crate::node::{Element, NaryOperator, Node, NodeKind};
use crate::operators::Operator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 渲染语言
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Zh,
}

impl FromStr for Locale {
    type Err = RuleError;

    /// 接受 `fr`、`fr-FR`、`zh_CN` 等形式，只看主语言标签
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            "zh" => Ok(Self::Zh),
            _ => Err(RuleError::UnsupportedLocale(tag.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Zh => "zh",
        };
        write!(f, "{}", s)
    }
}

/// 渲染器
pub trait Renderer {
    fn render(&self, node: &Node, locale: Locale) -> String;
}

/// 纯文本渲染器
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    /// 规则形式：`rule when <条件> validate`
    pub fn render_rule(&self, node: &Node, locale: Locale) -> String {
        format!(
            "{} {} {} {}",
            phrase(Operator::Rule, locale),
            phrase(Operator::When, locale),
            self.render(node, locale),
            phrase(Operator::Validate, locale)
        )
    }

    fn render_operand(&self, node: &Node, locale: Locale) -> String {
        if node.is_leaf() {
            self.render(node, locale)
        } else {
            format!("({})", self.render(node, locale))
        }
    }

    fn render_elements(&self, elements: &[Element], locale: Locale) -> String {
        elements
            .iter()
            .map(|element| match element {
                Element::Field(label) => label.clone(),
                Element::Operator(operator) => phrase(*operator, locale).to_string(),
                Element::Value(text) => text.clone(),
                Element::Group(inner) => format!("({})", self.render_elements(inner, locale)),
            })
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Renderer for TextRenderer {
    fn render(&self, node: &Node, locale: Locale) -> String {
        match node.kind() {
            NodeKind::Leaf(leaf) => self.render_elements(leaf.elements(), locale),
            NodeKind::Unary { operator, child } => format!(
                "{} {}",
                phrase(*operator, locale),
                self.render_operand(child, locale)
            ),
            NodeKind::Binary {
                operator,
                left,
                right,
            } => format!(
                "{} {} {}",
                self.render_operand(left, locale),
                phrase(*operator, locale),
                self.render_operand(right, locale)
            ),
            NodeKind::Nary { operator, children } => {
                let items: Vec<String> = children
                    .iter()
                    .map(|child| self.render(child, locale))
                    .collect();
                let mut out = format!(
                    "{} ({})",
                    phrase(operator.operator(), locale),
                    items.join(", ")
                );
                if let NaryOperator::Count {
                    comparator,
                    threshold,
                } = operator
                {
                    out.push_str(&format!(
                        " {} {}",
                        phrase(comparator.operator(), locale),
                        threshold
                    ));
                }
                out
            }
            NodeKind::Conditional {
                when,
                then,
                otherwise,
            } => {
                let mut out = format!(
                    "{} {} {} {}",
                    phrase(Operator::When, locale),
                    self.render_operand(when, locale),
                    phrase(Operator::Then, locale),
                    self.render_operand(then, locale)
                );
                if let Some(otherwise) = otherwise {
                    out.push_str(&format!(
                        " {} {}",
                        phrase(Operator::Else, locale),
                        self.render_operand(otherwise, locale)
                    ));
                }
                out
            }
        }
    }
}
