//! LSL Token Tools
//!
//! Регулярные выражения для лексем LSL и проверки строк на их основе.
//! Используются при валидации имён (переименование, генерация кода),
//! а не самим лексером.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Идентификатор без якорей.
pub static ID_REGEX: Lazy<Regex> = Lazy::new(|| compile(r"[a-zA-Z_][a-zA-Z0-9_]*"));

/// Идентификатор целиком.
pub static ID_REGEX_ANCHORED: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z_][a-zA-Z0-9_]*$"));

/// Вещественный литерал LSL без якорей (знак, экспонента, суффикс `f`).
pub static FLOAT_REGEX: Lazy<Regex> = Lazy::new(|| {
    compile(r"-?(?:(?:[0-9]+\.[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?|[0-9]+[eE][-+]?[0-9]+)[fF]?")
});

pub static FLOAT_REGEX_ANCHORED: Lazy<Regex> = Lazy::new(|| {
    compile(r"^-?(?:(?:[0-9]+\.[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?|[0-9]+[eE][-+]?[0-9]+)[fF]?$")
});

pub static ID_START_CHAR_REGEX: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z_]$"));
pub static ID_TRAILING_CHAR_REGEX: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z0-9_]$"));
pub static ID_ANY_CHAR_REGEX: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z0-9_]$"));

/// Зарезервированные слова LSL (не могут быть именами).
pub static LSL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        // Типы
        "integer", "float", "string", "key", "vector", "rotation", "quaternion", "list",
        // Управление потоком
        "if", "else", "while", "do", "for", "jump", "return", "state", "default",
    ])
});

// Шаблоны выше статические; ошибка компиляции здесь означает опечатку в исходниках.
fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid built-in token pattern {pattern:?}: {e}"),
    }
}

/// Корректный идентификатор, не являющийся ключевым словом.
pub fn is_valid_identifier(text: &str) -> bool {
    ID_REGEX_ANCHORED.is_match(text) && !is_keyword(text)
}

pub fn is_valid_float(text: &str) -> bool { FLOAT_REGEX_ANCHORED.is_match(text) }

pub fn is_keyword(word: &str) -> bool { LSL_KEYWORDS.contains(word) }

pub fn is_id_start_char(c: char) -> bool { ID_START_CHAR_REGEX.is_match(c.encode_utf8(&mut [0; 4])) }

pub fn is_id_char(c: char) -> bool { ID_ANY_CHAR_REGEX.is_match(c.encode_utf8(&mut [0; 4])) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("llSay"));
        assert!(is_valid_identifier("_tmp1"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("state"));
        assert!(!is_valid_identifier("a-b"));
        assert!(is_id_start_char('_'));
        assert!(!is_id_start_char('9'));
        assert!(is_id_char('9'));
        assert!(ID_TRAILING_CHAR_REGEX.is_match("z"));
    }

    #[test]
    fn floats() {
        for ok in ["1.0", "-1.5", ".5", "3.", "1e10", "2.5E-3", "4.0f", "-.25F"] {
            assert!(is_valid_float(ok), "{ok}");
        }
        for bad in ["1", "abc", "1.0.0", "e5", "."] {
            assert!(!is_valid_float(bad), "{bad}");
        }
        let found: Vec<&str> = FLOAT_REGEX.find_iter("x = 1.5 + .25;").map(|m| m.as_str()).collect();
        assert_eq!(found, vec!["1.5", ".25"]);
        assert_eq!(ID_REGEX.find("  foo_1 ").map(|m| m.as_str()), Some("foo_1"));
    }
}
