//! 操作符的本地化短语

use super::Locale;
use crate::operators::Operator;

pub fn phrase(operator: Operator, locale: Locale) -> &'static str {
    if let Some(symbol) = symbol(operator) {
        return symbol;
    }
    match locale {
        Locale::En => english(operator),
        Locale::Fr => french(operator),
        Locale::Zh => chinese(operator),
    }
}

/// 各语言通用的比较符号
fn symbol(operator: Operator) -> Option<&'static str> {
    match operator {
        Operator::Eq => Some("="),
        Operator::Neq => Some("!="),
        Operator::Gt => Some(">"),
        Operator::Gte => Some(">="),
        Operator::Lt => Some("<"),
        Operator::Lte => Some("<="),
        _ => None,
    }
}

fn english(operator: Operator) -> &'static str {
    match operator {
        Operator::And => "and",
        Operator::Or => "or",
        Operator::Xor => "xor",
        Operator::Not => "not",
        Operator::MatchAny => "match any",
        Operator::MatchAll => "match all",
        Operator::MatchNone => "match none",
        Operator::Count => "count",
        Operator::Between => "between",
        Operator::In => "is one of",
        Operator::NotIn => "is none of",
        Operator::Contains => "contains",
        Operator::StartsWith => "starts with",
        Operator::EndsWith => "ends with",
        Operator::Regex => "matches",
        Operator::Before => "before",
        Operator::BeforeOrEq => "before or equals",
        Operator::After => "after",
        Operator::AfterOrEq => "after or equals",
        Operator::IsNull => "is null",
        Operator::IsNotNull => "is not null",
        Operator::IsEmpty => "is empty",
        Operator::IsNotEmpty => "is not empty",
        Operator::IsTrue => "is true",
        Operator::IsFalse => "is false",
        Operator::AlwaysTrue => "always true",
        Operator::AlwaysFalse => "always false",
        Operator::AgeAt => "age at",
        Operator::Length => "length",
        Operator::Today => "today",
        Operator::Rule => "rule",
        Operator::When => "when",
        Operator::Validate => "validate",
        Operator::Then => "then",
        Operator::Else => "else",
        Operator::Map => "map",
        Operator::Using => "using",
        Operator::To => "to",
        Operator::Mappings => "mappings",
        Operator::Eq
        | Operator::Neq
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte => "",
    }
}

fn french(operator: Operator) -> &'static str {
    match operator {
        Operator::And => "et",
        Operator::Or => "ou",
        Operator::Xor => "ou exclusif",
        Operator::Not => "non",
        Operator::MatchAny => "correspond à au moins un",
        Operator::MatchAll => "correspond à tous",
        Operator::MatchNone => "ne correspond à aucun",
        Operator::Count => "nombre de",
        Operator::Between => "entre",
        Operator::In => "est l'un de",
        Operator::NotIn => "n'est aucun de",
        Operator::Contains => "contient",
        Operator::StartsWith => "commence par",
        Operator::EndsWith => "finit par",
        Operator::Regex => "correspond à",
        Operator::Before => "avant",
        Operator::BeforeOrEq => "avant ou égal à",
        Operator::After => "après",
        Operator::AfterOrEq => "après ou égal à",
        Operator::IsNull => "est nul",
        Operator::IsNotNull => "n'est pas nul",
        Operator::IsEmpty => "est vide",
        Operator::IsNotEmpty => "n'est pas vide",
        Operator::IsTrue => "est vrai",
        Operator::IsFalse => "est faux",
        Operator::AlwaysTrue => "toujours vrai",
        Operator::AlwaysFalse => "toujours faux",
        Operator::AgeAt => "âge à",
        Operator::Length => "longueur",
        Operator::Today => "la date du jour",
        Operator::Rule => "règle",
        Operator::When => "si",
        Operator::Validate => "valider",
        Operator::Then => "alors",
        Operator::Else => "sinon",
        Operator::Map => "associer",
        Operator::Using => "avec",
        Operator::To => "à",
        Operator::Mappings => "associations",
        Operator::Eq
        | Operator::Neq
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte => "",
    }
}

fn chinese(operator: Operator) -> &'static str {
    match operator {
        Operator::And => "且",
        Operator::Or => "或",
        Operator::Xor => "异或",
        Operator::Not => "非",
        Operator::MatchAny => "满足任一",
        Operator::MatchAll => "全部满足",
        Operator::MatchNone => "全不满足",
        Operator::Count => "满足个数",
        Operator::Between => "介于",
        Operator::In => "属于",
        Operator::NotIn => "不属于",
        Operator::Contains => "包含",
        Operator::StartsWith => "以此开头",
        Operator::EndsWith => "以此结尾",
        Operator::Regex => "匹配",
        Operator::Before => "早于",
        Operator::BeforeOrEq => "不晚于",
        Operator::After => "晚于",
        Operator::AfterOrEq => "不早于",
        Operator::IsNull => "为空值",
        Operator::IsNotNull => "不为空值",
        Operator::IsEmpty => "为空",
        Operator::IsNotEmpty => "不为空",
        Operator::IsTrue => "为真",
        Operator::IsFalse => "为假",
        Operator::AlwaysTrue => "恒真",
        Operator::AlwaysFalse => "恒假",
        Operator::AgeAt => "在此日期的年龄",
        Operator::Length => "长度",
        Operator::Today => "今天",
        Operator::Rule => "规则",
        Operator::When => "当",
        Operator::Validate => "校验",
        Operator::Then => "则",
        Operator::Else => "否则",
        Operator::Map => "映射",
        Operator::Using => "使用",
        Operator::To => "到",
        Operator::Mappings => "映射集",
        Operator::Eq
        | Operator::Neq
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_shared_across_locales() {
        for locale in [Locale::En, Locale::Fr, Locale::Zh] {
            assert_eq!(phrase(Operator::Gte, locale), ">=");
        }
    }

    #[test]
    fn test_localized_phrases() {
        assert_eq!(phrase(Operator::And, Locale::En), "and");
        assert_eq!(phrase(Operator::And, Locale::Fr), "et");
        assert_eq!(phrase(Operator::And, Locale::Zh), "且");
        assert_eq!(phrase(Operator::StartsWith, Locale::Fr), "commence par");
    }
}
