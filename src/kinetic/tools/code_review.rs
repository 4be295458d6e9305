// SPDX-License-Identifier: MIT

//! Code review workflow: static checks over Python source
//!
//! The steps read `code` from state and build up `functions`,
//! `complexity_scores`, `issues`, `suggestions` and `quality_score`.
//! `code_review_graph` wires them into a loop that repeats the analysis
//! while the score stays under the threshold.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::adk::error::{FlowError, GraphError};
use crate::adk::tool::StepOutcome;
use crate::kinetic::workflow::builder::GraphBuilder;
use crate::kinetic::workflow::condition::CompareOp;
use crate::kinetic::workflow::graph::{Graph, END};
use crate::kinetic::workflow::registry::ToolRegistry;
use crate::kinetic::workflow::state::WorkflowState;

pub const LONG_FUNCTION_LINES: usize = 50;
pub const HIGH_COMPLEXITY: usize = 10;
pub const MAX_PARAMS: usize = 5;
pub const QUALITY_THRESHOLD: f64 = 7.0;

const DECISION_MARKERS: [&str; 7] = ["if ", "elif ", "for ", "while ", " and ", " or ", "except"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub line_start: usize,
    pub line_end: usize,
    pub args: Vec<String>,
    pub num_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityScore {
    pub function: String,
    pub complexity: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: String,
    pub severity: String,
    pub message: String,
}

/// Register every code review step under its function name
pub fn register_tools(registry: &mut ToolRegistry) {
    registry.register("extract_functions", extract_functions);
    registry.register("check_complexity", check_complexity);
    registry.register("detect_issues", detect_issues);
    registry.register("suggest_improvements", suggest_improvements);
    registry.register("calculate_quality_score", calculate_quality_score);
}

/// extract → analyze → detect → suggest → score, looping back to analyze
/// while `quality_score < 7.0`
pub fn code_review_graph() -> Result<Graph, GraphError> {
    GraphBuilder::new("Code Review Mini-Agent")
        .description("Analyzes Python code and iteratively improves quality")
        .node_with_description("extract", "extract_functions", "Extract function definitions from code")
        .node_with_description("analyze", "check_complexity", "Check code complexity")
        .node_with_description("detect", "detect_issues", "Detect code quality issues")
        .node_with_description("suggest", "suggest_improvements", "Generate improvement suggestions")
        .node_with_description("score", "calculate_quality_score", "Calculate quality score")
        .edge("extract", "analyze")
        .edge("analyze", "detect")
        .edge("detect", "suggest")
        .edge("suggest", "score")
        .conditional_edge(
            "score",
            "quality_score",
            CompareOp::Lt,
            json!(QUALITY_THRESHOLD),
            "analyze",
            END,
        )
        .start("extract")
        .build()
}

/// Unparseable code leaves no functions and a `parse_error` message
pub fn extract_functions(state: &mut WorkflowState) -> Result<StepOutcome, FlowError> {
    let code = code_of(state);
    let functions = match parse_functions(&code) {
        Ok(functions) => functions,
        Err(message) => {
            log::warn!("Could not parse code: {}", message);
            state.set("parse_error", json!(message));
            Vec::new()
        }
    };

    state.set("function_count", json!(functions.len()));
    state.set("functions", serde_json::to_value(functions)?);
    Ok(StepOutcome::Unchanged)
}

/// Simplified cyclomatic complexity: 1 plus one per decision marker
pub fn check_complexity(state: &mut WorkflowState) -> Result<StepOutcome, FlowError> {
    let code = code_of(state);
    let lines: Vec<&str> = code.lines().collect();
    let functions: Vec<FunctionInfo> = read_key(state, "functions")?;

    let scores: Vec<ComplexityScore> = functions
        .iter()
        .map(|func| {
            let start = func.line_start.saturating_sub(1).min(lines.len());
            let end = func.line_end.clamp(start, lines.len());
            let body = lines[start..end].join("\n");
            let complexity = 1 + DECISION_MARKERS
                .iter()
                .map(|marker| body.matches(marker).count())
                .sum::<usize>();

            ComplexityScore {
                function: func.name.clone(),
                complexity,
                lines: func.num_lines,
            }
        })
        .collect();

    let avg_complexity = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| s.complexity as f64).sum::<f64>() / scores.len() as f64
    };

    StepOutcome::merge(json!({
        "complexity_scores": scores,
        "avg_complexity": avg_complexity,
    }))
}

pub fn detect_issues(state: &mut WorkflowState) -> Result<StepOutcome, FlowError> {
    let functions: Vec<FunctionInfo> = read_key(state, "functions")?;
    let scores: Vec<ComplexityScore> = read_key(state, "complexity_scores")?;

    let mut issues = Vec::new();
    for (i, func) in functions.iter().enumerate() {
        if func.num_lines > LONG_FUNCTION_LINES {
            issues.push(issue(
                "long_function",
                func,
                "medium",
                format!(
                    "Function '{}' is {} lines long (recommended: < {})",
                    func.name, func.num_lines, LONG_FUNCTION_LINES
                ),
            ));
        }

        if let Some(score) = scores.get(i) {
            if score.complexity > HIGH_COMPLEXITY {
                issues.push(issue(
                    "high_complexity",
                    func,
                    "high",
                    format!(
                        "Function '{}' has complexity {} (recommended: < {})",
                        func.name, score.complexity, HIGH_COMPLEXITY
                    ),
                ));
            }
        }

        if func.args.len() > MAX_PARAMS {
            issues.push(issue(
                "too_many_params",
                func,
                "low",
                format!(
                    "Function '{}' has {} parameters (recommended: < {})",
                    func.name,
                    func.args.len(),
                    MAX_PARAMS
                ),
            ));
        }
    }

    StepOutcome::merge(json!({
        "issue_count": issues.len(),
        "issues": issues,
    }))
}

pub fn suggest_improvements(state: &mut WorkflowState) -> Result<StepOutcome, FlowError> {
    let issues: Vec<Issue> = read_key(state, "issues")?;

    let suggestions: Vec<Value> = issues
        .iter()
        .filter_map(|issue| {
            let suggestion = match issue.kind.as_str() {
                "long_function" => {
                    "Consider breaking this function into smaller, more focused functions"
                }
                "high_complexity" => {
                    "Reduce complexity by extracting conditional logic into separate functions"
                }
                "too_many_params" => {
                    "Consider using a configuration object or dataclass to group related parameters"
                }
                _ => return None,
            };
            Some(json!({"function": issue.function, "suggestion": suggestion}))
        })
        .collect();

    StepOutcome::merge(json!({ "suggestions": suggestions }))
}

/// Score in [0, 10]: minus 0.5 per issue (at most 5), minus 0.3 per point of
/// average complexity above 10 (at most 3)
pub fn calculate_quality_score(state: &mut WorkflowState) -> Result<StepOutcome, FlowError> {
    let issue_count = state.get("issue_count").and_then(Value::as_f64).unwrap_or(0.0);
    let avg_complexity = state.get("avg_complexity").and_then(Value::as_f64).unwrap_or(0.0);
    let iteration = state.get("iteration").and_then(Value::as_i64).unwrap_or(0);

    let mut score = 10.0 - (issue_count * 0.5).min(5.0);
    if avg_complexity > HIGH_COMPLEXITY as f64 {
        score -= ((avg_complexity - HIGH_COMPLEXITY as f64) * 0.3).min(3.0);
    }
    let score = (score.clamp(0.0, 10.0) * 100.0).round() / 100.0;

    log::debug!("Quality score {} after iteration {}", score, iteration + 1);

    StepOutcome::merge(json!({
        "quality_score": score,
        "iteration": iteration + 1,
    }))
}

fn code_of(state: &WorkflowState) -> String {
    state
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Deserialize a state key, treating a missing key as an empty list
fn read_key<T>(state: &WorkflowState, key: &str) -> Result<Vec<T>, FlowError>
where
    T: for<'de> Deserialize<'de>,
{
    match state.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| FlowError::step(format!("invalid '{}' in state: {}", key, e))),
    }
}

fn issue(kind: &str, func: &FunctionInfo, severity: &str, message: String) -> Issue {
    Issue {
        kind: kind.to_string(),
        function: func.name.clone(),
        severity: severity.to_string(),
        message,
    }
}

/// One physical line with string contents and comments blanked out
struct SourceLine {
    code: String,
    /// Line carries on a statement from an earlier line
    continuation: bool,
    blank: bool,
}

/// Split source into lines, masking string literals and comments.
///
/// Fails on unbalanced brackets and unterminated strings, with the message
/// and 1-based line number of the first problem.
fn scan_source(code: &str) -> Result<Vec<SourceLine>, String> {
    let mut lines = Vec::new();
    let mut brackets: Vec<(char, usize)> = Vec::new();
    // (quote, triple-quoted, line it opened on)
    let mut string: Option<(char, bool, usize)> = None;
    let mut joined = false;

    for (idx, raw) in code.lines().enumerate() {
        let lineno = idx + 1;
        let continuation = joined || string.is_some() || !brackets.is_empty();
        joined = false;

        let chars: Vec<char> = raw.chars().collect();
        let mut masked = String::with_capacity(raw.len());
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];

            if let Some((quote, triple, _)) = string {
                let width = if ch == '\\' {
                    joined = i + 1 == chars.len();
                    2.min(chars.len() - i)
                } else if ch == quote && (!triple || chars[i..].starts_with(&[quote; 3])) {
                    string = None;
                    if triple {
                        3
                    } else {
                        1
                    }
                } else {
                    1
                };
                masked.extend(std::iter::repeat(' ').take(width));
                i += width;
                continue;
            }

            match ch {
                '#' => break,
                '"' | '\'' => {
                    let triple = chars[i..].starts_with(&[ch; 3]);
                    let width = if triple { 3 } else { 1 };
                    string = Some((ch, triple, lineno));
                    masked.extend(std::iter::repeat(' ').take(width));
                    i += width;
                    continue;
                }
                '(' | '[' | '{' => brackets.push((ch, lineno)),
                ')' | ']' | '}' => match brackets.pop() {
                    None => return Err(format!("unmatched '{}' (line {})", ch, lineno)),
                    Some((open, _)) if closing_for(open) != ch => {
                        return Err(format!(
                            "closing parenthesis '{}' does not match opening parenthesis '{}' (line {})",
                            ch, open, lineno
                        ));
                    }
                    Some(_) => {}
                },
                '\\' if i + 1 == chars.len() => joined = true,
                _ => {}
            }
            masked.push(ch);
            i += 1;
        }

        // A single-quoted string only spans lines through a trailing backslash
        if let Some((_, false, opened)) = string {
            if !joined {
                return Err(format!("unterminated string literal (line {})", opened));
            }
        }

        lines.push(SourceLine {
            code: masked,
            continuation,
            blank: raw.trim().is_empty(),
        });
    }

    if let Some((_, triple, opened)) = string {
        let kind = if triple { "triple-quoted string" } else { "string" };
        return Err(format!("unterminated {} literal (line {})", kind, opened));
    }
    if let Some((open, line)) = brackets.first() {
        return Err(format!("'{}' was never closed (line {})", open, line));
    }

    Ok(lines)
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Find `def` statements by indentation. Line numbers are 1-based and the
/// end line is the last non-blank line of the body.
fn parse_functions(code: &str) -> Result<Vec<FunctionInfo>, String> {
    let lines = scan_source(code)?;
    let mut functions = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.continuation {
            continue;
        }
        let trimmed = line.code.trim_start();
        let Some(rest) = trimmed.strip_prefix("def ") else {
            continue;
        };
        let indent = line.code.len() - trimmed.len();

        let Some(paren) = rest.find('(') else {
            continue;
        };
        let name = rest[..paren].trim().to_string();
        if name.is_empty() {
            continue;
        }

        let (params, header_end) = collect_params(&lines, idx, indent + 4 + paren + 1);
        let line_end = body_end(&lines, header_end, indent);

        functions.push(FunctionInfo {
            name,
            line_start: idx + 1,
            line_end: line_end + 1,
            args: positional_args(&params),
            num_lines: line_end - idx + 1,
        });
    }

    Ok(functions)
}

/// Text between the opening paren at (`start_line`, `col`) and its match,
/// plus the index of the line holding the closing paren.
fn collect_params(lines: &[SourceLine], start_line: usize, col: usize) -> (String, usize) {
    let mut depth = 1usize;
    let mut params = String::new();

    for (offset, line) in lines[start_line..].iter().enumerate() {
        let text = if offset == 0 {
            line.code.get(col..).unwrap_or("")
        } else {
            line.code.as_str()
        };
        for ch in text.chars() {
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return (params, start_line + offset);
                    }
                }
                _ => {}
            }
            params.push(ch);
        }
        params.push(' ');
    }

    (params, lines.len().saturating_sub(1))
}

/// Last line of the body after `header_end`: statements indented deeper
/// than `indent` plus any lines they continue onto
fn body_end(lines: &[SourceLine], header_end: usize, indent: usize) -> usize {
    let mut end = header_end;
    for (offset, line) in lines[header_end + 1..].iter().enumerate() {
        if line.continuation {
            if !line.blank {
                end = header_end + 1 + offset;
            }
            continue;
        }
        let trimmed = line.code.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        if line.code.len() - trimmed.len() <= indent {
            break;
        }
        end = header_end + 1 + offset;
    }
    end
}

/// Plain positional-or-keyword parameter names: no positional-only
/// parameters (before `/`), nothing from `*` onwards
fn positional_args(params: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut parts = Vec::new();

    for ch in params.chars() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    parts.push(current);

    for part in parts {
        let name = part
            .split([':', '='])
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        match name.as_str() {
            "" => continue,
            "/" => args.clear(),
            n if n.starts_with('*') => break,
            _ => args.push(name),
        }
    }

    args
}
