//! Symbol to type-name inflection
//!
//! `classify` turns a symbolic resource name into the type name a policy is
//! looked up under: the last word is singularized and the result is upper
//! camel cased (`"article_tags"` -> `"ArticleTag"`).

use heck::{ToSnakeCase, ToUpperCamelCase};

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
    "metadata",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("sexes", "sex"),
    ("moves", "move"),
    ("zombies", "zombie"),
    ("oxen", "ox"),
];

// First matching suffix wins; specific endings precede general ones.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("quizzes", "quiz"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("indices", "index"),
    ("aliases", "alias"),
    ("statuses", "status"),
    ("octopi", "octopus"),
    ("crises", "crisis"),
    ("analyses", "analysis"),
    ("shoes", "shoe"),
    ("buses", "bus"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("movies", "movie"),
    ("men", "man"),
    ("xes", "x"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("sses", "ss"),
    ("hives", "hive"),
    ("tives", "tive"),
    ("lves", "lf"),
    ("ies", "y"),
    ("ss", "ss"),
    ("us", "us"),
    ("is", "is"),
    ("s", ""),
];

/// Singular form of a single lower-case word
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return lower;
    }

    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return singular.to_string();
    }

    for (suffix, replacement) in SUFFIX_RULES {
        if let Some(stem) = lower.strip_suffix(suffix) {
            if stem.is_empty() && replacement.is_empty() {
                break;
            }
            return format!("{}{}", stem, replacement);
        }
    }

    lower
}

/// Type name for a symbolic resource name
///
/// # Examples
///
/// ```
/// use warrant_authz::finder::classify;
///
/// assert_eq!(classify("post"), "Post");
/// assert_eq!(classify("article_tags"), "ArticleTag");
/// assert_eq!(classify("categories"), "Category");
/// ```
pub fn classify(symbol: &str) -> String {
    let snake = symbol.to_snake_case();
    let singular = match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, singularize(last)),
        None => singularize(&snake),
    };
    singular.to_upper_camel_case()
}
