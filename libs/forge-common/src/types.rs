use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Languages accepted for grading. The set is closed; anything else is a
/// validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    Java,
    #[serde(rename = "C++")]
    Cpp,
    C,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::JavaScript,
        Language::Java,
        Language::Cpp,
        Language::C,
    ];

    /// User-facing name, also the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::C => "C",
        }
    }

    /// Lowercase identifier used in config files and Redis keys
    pub fn slug(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Accepts the display name or the slug, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| {
                lang.as_str().eq_ignore_ascii_case(wanted) || lang.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Overall outcome of a graded submission. Always derived by the
/// classifier, never taken from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Compilation Error")]
    CompilationError,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::CompilationError => "Compilation Error",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input/expected-output pair belonging to a problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

/// Outcome of running one test case against submitted code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub passed: bool,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    /// Milliseconds
    pub execution_time: f64,
    /// Bytes
    pub memory_usage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    /// Error text, if the collaborator reported a non-blank one
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Whether the caller is practicing against public cases or submitting for a grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Run,
    Submit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Run => f.write_str("run"),
            Action::Submit => f.write_str("submit"),
        }
    }
}

/// Timing and memory figures over a set of test results
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub total_execution_time: f64,
    pub average_execution_time: f64,
    pub max_execution_time: f64,
    pub total_memory_usage: f64,
    pub average_memory_usage: f64,
    pub max_memory_usage: f64,
}

/// A graded submission before the store has assigned an id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub uid: String,
    pub problem_id: String,
    pub code: String,
    pub language: Language,
    pub status: Verdict,
    pub execution_time: f64,
    pub memory_usage: f64,
    pub test_results: Vec<TestResult>,
}

/// A persisted, immutable submission record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub uid: String,
    pub problem_id: String,
    pub code: String,
    pub language: Language,
    pub status: Verdict,
    pub execution_time: f64,
    pub memory_usage: f64,
    pub test_results: Vec<TestResult>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn from_new(id: String, new: NewSubmission, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            uid: new.uid,
            problem_id: new.problem_id,
            code: new.code,
            language: new.language,
            status: new.status,
            execution_time: new.execution_time,
            memory_usage: new.memory_usage,
            test_results: new.test_results,
            submitted_at,
        }
    }
}

/// Historical roll-up over a user's or a problem's submissions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub total_submissions: usize,
    pub accepted_submissions: usize,
    /// Percentage, rounded to the nearest integer
    pub success_rate: u32,
    pub language_distribution: BTreeMap<String, usize>,
    pub status_distribution: BTreeMap<String, usize>,
    pub average_execution_time: f64,
    pub average_memory_usage: f64,
}
