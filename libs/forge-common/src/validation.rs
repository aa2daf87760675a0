//! Structural checks on test case sets and incoming grading requests
//!
//! Validation never stops at the first problem; callers render the whole
//! error list at once.

use crate::types::{Language, TestCase};
use serde::Serialize;
use serde_json::Value;

pub const MAX_TEST_INPUT_CHARS: usize = 10_000;
/// Pre-execution limit on submitted code
pub const MAX_REQUEST_CODE_CHARS: usize = 100_000;
/// Limit on code in a persisted submission record
pub const MAX_STORED_CODE_CHARS: usize = 50_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

fn field(index: usize, name: &str) -> String {
    format!("testCases[{}].{}", index, name)
}

fn check_input(index: usize, input: &str, errors: &mut Vec<String>) {
    if input.trim().is_empty() {
        errors.push(format!("{} must be a non-empty string", field(index, "input")));
    } else if input.chars().count() > MAX_TEST_INPUT_CHARS {
        errors.push(format!(
            "{} must be at most {} characters",
            field(index, "input"),
            MAX_TEST_INPUT_CHARS
        ));
    }
}

fn check_expected_output(index: usize, expected_output: &str, errors: &mut Vec<String>) {
    if expected_output.trim().is_empty() {
        errors.push(format!(
            "{} must be a non-empty string",
            field(index, "expectedOutput")
        ));
    }
}

/// Set-level rules. `hidden` holds `None` where a case's visibility is unknown.
fn check_set_shape(hidden: &[Option<bool>], errors: &mut Vec<String>) {
    if hidden.is_empty() {
        errors.push("At least one test case is required".to_string());
    } else if hidden.iter().all(|h| *h == Some(true)) {
        errors.push("At least one public test case is required".to_string());
    }
}

/// Validate a typed test case set
pub fn validate_test_cases(cases: &[TestCase]) -> ValidationReport {
    let mut errors = Vec::new();
    let hidden: Vec<Option<bool>> = cases.iter().map(|tc| Some(tc.is_hidden)).collect();
    check_set_shape(&hidden, &mut errors);

    for (index, case) in cases.iter().enumerate() {
        check_input(index, &case.input, &mut errors);
        check_expected_output(index, &case.expected_output, &mut errors);
    }
    ValidationReport::from_errors(errors)
}

fn string_field<'a>(
    obj: &'a serde_json::Map<String, Value>,
    index: usize,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match obj.get(name) {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => {
            errors.push(format!("{} must be a string", field(index, name)));
            None
        }
    }
}

/// Parse and validate test cases straight from request JSON
///
/// Type problems (not an array, non-string fields, non-boolean `isHidden`)
/// are reported alongside the structural checks of [`validate_test_cases`].
/// A case with a badly typed field still gets its other fields checked.
pub fn parse_test_cases(value: &Value) -> Result<Vec<TestCase>, ValidationReport> {
    let Some(items) = value.as_array() else {
        return Err(ValidationReport::from_errors(vec![
            "Test cases must be an array".to_string(),
        ]));
    };

    let mut case_errors = Vec::new();
    let mut hidden = Vec::with_capacity(items.len());
    let mut cases = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            case_errors.push(format!("testCases[{}] must be an object", index));
            hidden.push(None);
            continue;
        };

        let input = string_field(obj, index, "input", &mut case_errors);
        if let Some(input) = input {
            check_input(index, input, &mut case_errors);
        }

        let expected_output = string_field(obj, index, "expectedOutput", &mut case_errors);
        if let Some(expected_output) = expected_output {
            check_expected_output(index, expected_output, &mut case_errors);
        }

        let is_hidden = match obj.get("isHidden") {
            None | Some(Value::Null) => Some(false),
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                case_errors.push(format!("{} must be a boolean", field(index, "isHidden")));
                None
            }
        };
        hidden.push(is_hidden);

        if let (Some(input), Some(expected_output), Some(is_hidden)) =
            (input, expected_output, is_hidden)
        {
            cases.push(TestCase {
                input: input.to_string(),
                expected_output: expected_output.to_string(),
                is_hidden,
            });
        }
    }

    let mut errors = Vec::new();
    check_set_shape(&hidden, &mut errors);
    errors.append(&mut case_errors);

    if errors.is_empty() {
        Ok(cases)
    } else {
        Err(ValidationReport::from_errors(errors))
    }
}

/// Validate code and language for both run and submit requests
///
/// Returns the parsed language when it is supported.
pub fn validate_code_and_language(
    code: &str,
    language: &str,
    errors: &mut Vec<String>,
) -> Option<Language> {
    if code.is_empty() {
        errors.push("code is required".to_string());
    } else if code.chars().count() > MAX_REQUEST_CODE_CHARS {
        errors.push(format!(
            "code must be at most {} characters",
            MAX_REQUEST_CODE_CHARS
        ));
    }

    match language.parse::<Language>() {
        Ok(lang) => Some(lang),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    }
}

/// Validate the identity fields of a graded submission
pub fn validate_identity(uid: &str, problem_id: &str, errors: &mut Vec<String>) {
    if uid.trim().is_empty() {
        errors.push("uid is required".to_string());
    }
    if problem_id.trim().is_empty() {
        errors.push("problemId is required".to_string());
    }
}
