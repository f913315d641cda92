//! Test case record extraction
//!
//! Recovers test cases from semi-structured generator output such as:
//!
//! ```text
//! * High Level Feature: Auth
//! * Test Case ID: TC-1
//! * Feature Name: Login
//! * Expected Result: Dashboard shown
//! ```
//!
//! Every record starts at the `High Level Feature` label. Labels are
//! recognized at line start, case-insensitively, with optional bullet and
//! markdown bold decoration. Missing fields become empty strings; records
//! without a `Test Case ID` are dropped.

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Recognized test case fields, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestCaseField {
    HighLevelFeature,
    TestCaseId,
    FeatureName,
    TestScenario,
    TestCaseType,
    Description,
    Preconditions,
    TestData,
    TestSteps,
    ExpectedResult,
    ActualResult,
    Priority,
    Severity,
    Status,
    Comments,
}

impl TestCaseField {
    pub const ALL: [TestCaseField; 15] = [
        TestCaseField::HighLevelFeature,
        TestCaseField::TestCaseId,
        TestCaseField::FeatureName,
        TestCaseField::TestScenario,
        TestCaseField::TestCaseType,
        TestCaseField::Description,
        TestCaseField::Preconditions,
        TestCaseField::TestData,
        TestCaseField::TestSteps,
        TestCaseField::ExpectedResult,
        TestCaseField::ActualResult,
        TestCaseField::Priority,
        TestCaseField::Severity,
        TestCaseField::Status,
        TestCaseField::Comments,
    ];

    /// Field that starts every record
    pub const ANCHOR: TestCaseField = TestCaseField::HighLevelFeature;

    /// Field a record must carry to be kept
    pub const IDENTIFIER: TestCaseField = TestCaseField::TestCaseId;

    pub fn label(self) -> &'static str {
        match self {
            TestCaseField::HighLevelFeature => "High Level Feature",
            TestCaseField::TestCaseId => "Test Case ID",
            TestCaseField::FeatureName => "Feature Name",
            TestCaseField::TestScenario => "Test Scenario",
            TestCaseField::TestCaseType => "Test Case Type",
            TestCaseField::Description => "Description",
            TestCaseField::Preconditions => "Preconditions",
            TestCaseField::TestData => "Test Data",
            TestCaseField::TestSteps => "Test Steps",
            TestCaseField::ExpectedResult => "Expected Result",
            TestCaseField::ActualResult => "Actual Result",
            TestCaseField::Priority => "Priority",
            TestCaseField::Severity => "Severity",
            TestCaseField::Status => "Status",
            TestCaseField::Comments => "Comments",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn from_label(label: &str) -> Option<Self> {
        let normalized = collapse_whitespace(label).to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.label().to_lowercase() == normalized)
    }
}

impl fmt::Display for TestCaseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label at line start: optional bullet, optional bold, label, optional bold, colon
static LABEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let labels = TestCaseField::ALL
        .iter()
        .map(|f| f.label().replace(' ', r"[ \t]+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?mi)^[ \t]*(?:[*\-•][ \t]*)?(?:\*\*|__)?[ \t]*({})[ \t]*(?:\*\*|__)?[ \t]*:[ \t]*(?:\*\*|__)?",
        labels
    ))
    .expect("valid label regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One test case; values are indexed by [`TestCaseField`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCaseRecord {
    values: [String; 15],
}

impl TestCaseRecord {
    pub fn get(&self, field: TestCaseField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: TestCaseField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn id(&self) -> &str {
        self.get(TestCaseField::IDENTIFIER)
    }

    /// Field/value pairs in column order
    pub fn fields(&self) -> impl Iterator<Item = (TestCaseField, &str)> {
        TestCaseField::ALL
            .into_iter()
            .map(move |f| (f, self.get(f)))
    }

    /// Case-insensitive match on feature name, scenario or description
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            TestCaseField::FeatureName,
            TestCaseField::TestScenario,
            TestCaseField::Description,
        ]
        .into_iter()
        .any(|f| self.get(f).to_lowercase().contains(&term))
    }

    /// Canonical `* Label: value` lines
    pub fn to_text(&self) -> String {
        self.fields()
            .map(|(field, value)| format!("* {}: {}\n", field.label(), value))
            .collect()
    }
}

impl Serialize for TestCaseRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.fields() {
            map.serialize_entry(field.label(), value)?;
        }
        map.end()
    }
}

/// Parse every test case block out of `raw_text`, in order
pub fn extract(raw_text: &str) -> Vec<TestCaseRecord> {
    let labels: Vec<(TestCaseField, usize, usize)> = LABEL_PATTERN
        .captures_iter(raw_text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let field = TestCaseField::from_label(caps.get(1)?.as_str())?;
            Some((field, whole.start(), whole.end()))
        })
        .collect();

    let mut records = Vec::new();
    let mut current: Option<(TestCaseRecord, [bool; 15])> = None;

    for (i, &(field, _, value_start)) in labels.iter().enumerate() {
        let value_end = labels
            .get(i + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(raw_text.len());
        let value = collapse_whitespace(&raw_text[value_start..value_end]);

        if field == TestCaseField::ANCHOR {
            if let Some((record, _)) = current.take() {
                push_if_identified(&mut records, record);
            }
            current = Some((TestCaseRecord::default(), [false; 15]));
        }

        // Labels before the first anchor belong to the discarded preamble
        let Some((record, seen)) = current.as_mut() else {
            continue;
        };
        if !seen[field.index()] {
            seen[field.index()] = true;
            record.set(field, value);
        }
    }

    if let Some((record, _)) = current {
        push_if_identified(&mut records, record);
    }
    records
}

fn push_if_identified(records: &mut Vec<TestCaseRecord>, record: TestCaseRecord) {
    if record.id().is_empty() {
        log::debug!("dropping test case block without identifier");
        return;
    }
    records.push(record);
}

/// Serialize records so that [`extract`] reproduces them
pub fn to_text(records: &[TestCaseRecord]) -> String {
    records
        .iter()
        .map(TestCaseRecord::to_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
