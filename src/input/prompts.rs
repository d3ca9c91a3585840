//! Best-effort prompt labels for programs that read stdin.
//!
//! One prompt is produced per blocking-read call site, in source order. Labels come from
//! the nearest literal printed just before the read; they only affect display.

use std::sync::OnceLock;

use regex::Regex;

use super::InputPrompt;
use crate::execution::Language;

pub const GENERIC_LABEL: &str = "Enter value";

/// Lines above a read call that are searched for a printed label.
const LOOKBEHIND_LINES: usize = 2;

struct Patterns {
    read: Regex,
    print: Regex,
    comment: &'static str,
}

fn patterns(language: Language) -> &'static Patterns {
    static C: OnceLock<Patterns> = OnceLock::new();
    static PY: OnceLock<Patterns> = OnceLock::new();
    match language {
        Language::C => C.get_or_init(|| Patterns {
            read: Regex::new(r"\bscanf\s*\(").expect("valid regex"),
            print: Regex::new(r#"\bprintf\s*\(\s*(?:"([^"]*)"|'([^']*)')\s*[,)]"#).expect("valid regex"),
            comment: "//",
        }),
        Language::Python => PY.get_or_init(|| Patterns {
            // The optional literal is the prompt `input()` prints itself.
            read: Regex::new(r#"\binput\s*\(\s*(?:f?"([^"]*)"|f?'([^']*)')?"#).expect("valid regex"),
            print: Regex::new(r#"\bprint\s*\(\s*f?(?:"([^"]*)"|'([^']*)')\s*[,)]"#).expect("valid regex"),
            comment: "#",
        }),
    }
}

fn literal(caps: &regex::Captures<'_>) -> Option<String> {
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// Normalize escape sequences the way they would read on screen, then trim.
pub fn clean_label(raw: &str) -> String {
    raw.replace("\\n", " ")
        .replace("\\t", " ")
        .replace("\\\"", "\"")
        .replace("\\'", "'")
        .replace("\\r", " ")
        .trim()
        .to_string()
}

/// Nearest printed literal before byte offset `col` of line `idx`.
fn nearest_print(p: &Patterns, lines: &[&str], idx: usize, col: usize) -> Option<String> {
    let same_line = p
        .print
        .captures_iter(&lines[idx][..col])
        .filter_map(|c| literal(&c))
        .last();
    if same_line.is_some() {
        return same_line;
    }
    (idx.saturating_sub(LOOKBEHIND_LINES)..idx)
        .rev()
        .filter(|&i| !is_comment(p, lines[i]))
        .find_map(|i| p.print.captures_iter(lines[i]).filter_map(|c| literal(&c)).last())
}

fn is_comment(p: &Patterns, line: &str) -> bool {
    line.trim_start().starts_with(p.comment)
}

/// Prompts for every read call site in `source`.
pub fn extract_prompts(source: &str, language: Language) -> Vec<InputPrompt> {
    let p = patterns(language);
    let lines: Vec<&str> = source.lines().collect();
    let mut used: Vec<String> = Vec::new();
    let mut prompts = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if is_comment(p, line) {
            continue;
        }
        for caps in p.read.captures_iter(line) {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            let raw = literal(&caps).or_else(|| nearest_print(p, &lines, idx, start));
            let label = raw
                .map(|r| clean_label(&r))
                .filter(|l| !l.is_empty() && !used.contains(l));
            let label = match label {
                Some(l) => {
                    used.push(l.clone());
                    l
                }
                None => GENERIC_LABEL.to_string(),
            };
            prompts.push(InputPrompt { ordinal: prompts.len() + 1, label });
        }
    }
    prompts
}

/// Prompts for a run the service reported as blocked; never empty.
pub fn prompts_for_run(source: &str, language: Language) -> Vec<InputPrompt> {
    let prompts = extract_prompts(source, language);
    if prompts.is_empty() {
        vec![InputPrompt { ordinal: 1, label: GENERIC_LABEL.to_string() }]
    } else {
        prompts
    }
}
