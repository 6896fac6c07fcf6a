//! Regex-based query intent classification.
//!
//! [`analyze_query`] is a pure function of the query string. Every signal is
//! an ordered `(pattern, result)` table compiled once; tables whose result is
//! a single value (role, language, framework) stop at the first match.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::{QueryIntent, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Example,
    Quickstart,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("intent patterns are valid regexes")
}

static CODE_REQUEST_RULES: LazyLock<Vec<(Regex, Signal)>> = LazyLock::new(|| {
    vec![
        // explicit requests
        (
            compile(r"\b(show|give|provide|find|get|see)\s+(me\s+)?(an?\s+)?example"),
            Signal::Example,
        ),
        (compile(r"\bexample\s+(code|implementation|of)\b"), Signal::Example),
        (compile(r"\bcode\s+(example|sample|snippet)"), Signal::Example),
        (compile(r"\bsample\s+(code|implementation)\b"), Signal::Example),
        // implementation requests
        (
            compile(r"\bhow\s+to\s+(implement|build|create|make|use|set\s*up)\b"),
            Signal::Example,
        ),
        (
            compile(r"\bhow\s+(do|can)\s+i\s+(implement|build|create|make|use)\b"),
            Signal::Example,
        ),
        // onboarding
        (compile(r"\bquick\s*start"), Signal::Quickstart),
        (compile(r"\bget(ting)?\s+started\b"), Signal::Quickstart),
        (compile(r"\btutorials?\b"), Signal::Quickstart),
        (compile(r"\bwalk\s*through\b"), Signal::Quickstart),
        // working code
        (compile(r"\bworking\s+(code|example)"), Signal::Example),
        (compile(r"\bcode\s+that\s+works\b"), Signal::Example),
        (compile(r"\bexamples?\b"), Signal::Example),
    ]
});

static ROLE_RULES: LazyLock<Vec<(Regex, Role)>> = LazyLock::new(|| {
    vec![
        (
            compile(r"\b(clients?|buyers?|consumers?|payers?|making?\s+payments?|pay(ing)?)\b"),
            Role::Client,
        ),
        (
            compile(
                r"\b(servers?|sellers?|providers?|merchants?|accept(ing)?\s+payments?|receiv(e|ing)\s+payments?)\b",
            ),
            Role::Server,
        ),
        (compile(r"\bfacilitators?\b"), Role::Facilitator),
    ]
});

static LANGUAGE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            compile(r"\b(typescript|ts|javascript|js|node|nodejs|node\.js)\b"),
            "typescript",
        ),
        (compile(r"\b(go|golang)\b"), "go"),
        (compile(r"\bpython\b"), "python"),
        (compile(r"\bjava\b"), "java"),
    ]
});

static FRAMEWORK_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (compile(r"\bfetch\b"), "fetch"),
        (compile(r"\baxios\b"), "axios"),
        (compile(r"\bexpress(\.?js)?\b"), "express"),
        (compile(r"\bhono\b"), "hono"),
        (compile(r"\bnext(\.?js|\s+js)\b"), "nextjs"),
    ]
});

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "in", "on", "at", "to", "for", "of", "with", "is", "are", "was",
        "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "show",
        "give", "provide", "find", "get", "see", "me", "my", "i", "you", "your", "how",
        "what", "when", "where", "why", "which", "can", "could", "would", "should",
    ]
    .into_iter()
    .collect()
});

/// Classify a free-text query into retrieval intent.
pub fn analyze_query(query: &str) -> QueryIntent {
    let lower = query.to_lowercase();

    let signals: Vec<Signal> = CODE_REQUEST_RULES
        .iter()
        .filter(|(re, _)| re.is_match(&lower))
        .map(|(_, signal)| *signal)
        .collect();
    let wants_quickstart = signals.contains(&Signal::Quickstart);

    QueryIntent {
        wants_examples: !signals.is_empty(),
        wants_quickstart,
        role: first_match(&ROLE_RULES, &lower),
        language: first_match(&LANGUAGE_RULES, &lower).map(str::to_string),
        framework: first_match(&FRAMEWORK_RULES, &lower).map(str::to_string),
        keywords: extract_keywords(&lower),
    }
}

fn first_match<T: Copy>(rules: &[(Regex, T)], query: &str) -> Option<T> {
    rules
        .iter()
        .find(|(re, _)| re.is_match(query))
        .map(|(_, value)| *value)
}

fn extract_keywords(lower: &str) -> Vec<String> {
    lower
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                .collect::<String>()
        })
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word.as_str()))
        .collect()
}
