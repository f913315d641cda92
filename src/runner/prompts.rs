//! System prompts and message builders for the generation stages

use crate::crawler::CrawlResult;
use crate::parser::records::{TestCaseField, TestCaseRecord};
use crate::utils::prompt::Credentials;

pub const REFINER: &str = "\
You are an expert in writing clear, precise and unambiguous instructions for QA automation tasks.
Rewrite the provided instruction so another model can follow it without guessing:
- Use concise, actionable language with no vague terms or placeholders.
- Specify exact actions, selectors and validations, following Playwright sync API conventions.
- Describe self-healing locator strategies (ID, name, class name, tag name, CSS selector, XPath, role-based and text-based selectors), ordered by reliability and stability.
- Cover setup steps (navigate, prepare data), action steps (click, fill, submit), verification steps (assertions, checks) and error handling.
- Ask for per-step pass/fail logging and assertions.
Output only the refined instruction as plain text. Do not output any test cases in this step.";

pub const INSPECTOR: &str = "\
You are a site inspector. You analyze snippets of crawled web pages together with the user's instruction to extract reliable Playwright locators and QA-relevant insights.
- Summarize the site structure, key pages, navigation flows and discovered features such as forms, buttons and user journeys.
- Identify test scenarios: core functionality, alternative flows, edge cases and error conditions.
- Recommend reliable Playwright locators for the key elements, prioritized by stability (ID > role-based > text-based > CSS/XPath).
- Suggest self-healing locator strategies and waits for dynamic content.
Start your answer with 'Site Insights and Recommended Locators: ' followed by the sections Site Structure, Discovered Test Scenarios and Recommended Locators.
If no page content is available, derive generic but reliable locators and insights from common web patterns and the instruction.";

pub const PLANNER: &str = "\
You are an expert QA test planner.
First cover the core functionality described in the instruction and discovered in the site insights: basic flow, alternative flows, preconditions, postconditions and validation rules.
Then expand to functional, negative, boundary, performance, security, integration, usability, regression, smoke, sanity, end-to-end and exploratory test cases where they apply, with several variations per type.
Write every test case as a block of labeled lines, exactly in this form and order:
* High Level Feature: <feature area>
* Test Case ID: <unique id such as TC-001>
* Feature Name: <feature>
* Test Scenario: <scenario>
* Test Case Type: <Functional, Negative, Boundary, ...>
* Description: <what is tested>
* Preconditions: <required setup>
* Test Data: <inputs used>
* Test Steps: <numbered steps with selectors, actions and validations>
* Expected Result: <clear pass/fail criteria>
* Actual Result: <leave empty>
* Priority: <High, Medium or Low>
* Severity: <Critical, Major, Minor>
* Status: <Not Executed>
* Comments: <optional notes>
Separate test cases with a blank line. Output only the test cases.";

pub const CODEGEN: &str = "\
You are an expert in generating executable Python scripts for QA automation with the Playwright sync API.
Use the test cases and the locator recommendations from the context.
If none of the test cases can be automated through Playwright UI automation (manual steps, network throttling, direct database access), respond with 'Not Automatable' only.
Otherwise produce a complete standalone Python script that:
- imports sync_playwright and expect from playwright.sync_api
- launches chromium headless once and reuses one context and one page
- implements preconditions and steps with the recommended or self-healing locators
- validates with expect(page.locator(selector)) assertions
- wraps every test case in try/except and prints its pass or fail result
Any notes or explanations must be Python comments. Output only the script.";

pub fn no_url_prompt(key_elements: &str, instruction: &str) -> String {
    format!(
        "No URL provided. Generate reliable Playwright locators, self-healing strategies and generic site insights (e.g., common flows for {}) based on common web patterns and the instruction: {}",
        key_elements, instruction
    )
}

pub fn no_credentials_prompt(key_elements: &str, instruction: &str) -> String {
    format!(
        "No login credentials provided. Generate reliable Playwright locators and insights for {} based on common web patterns and the instruction: {}",
        key_elements, instruction
    )
}

pub fn no_content_prompt(key_elements: &str, instruction: &str) -> String {
    format!(
        "No URL content crawled. Generate reliable Playwright locators and insights for {} based on common web patterns and the instruction: {}",
        key_elements, instruction
    )
}

pub fn crawl_summary_prompt(
    site_url: &str,
    key_elements: &str,
    instruction: &str,
    pages: &CrawlResult,
) -> String {
    let snippets = pages
        .iter()
        .map(|p| format!("Page: {}\nHTML Snippet:\n{}", p.url, p.content_excerpt))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!(
        "Start URL: {}\nKey Elements to Focus: {}\nUser Instruction: {}\nCrawled Pages Snippets:\n{}",
        site_url, key_elements, instruction, snippets
    )
}

pub fn recommendations_prompt(summary: &str, key_elements: &str, instruction: &str) -> String {
    format!(
        "Analyze the crawl summary for site insights and locators: {}\nUser Key Elements: {}\nUser Instruction: {}",
        summary, key_elements, instruction
    )
}

/// Single message asking for one script covering every test case
pub fn unified_message(
    test_cases: &[TestCaseRecord],
    context: &str,
    instruction: &str,
    site_url: Option<&str>,
    credentials: &Credentials,
) -> String {
    let cases = test_cases
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "### Test Case {}: {}\n{}",
                i + 1,
                record.get(TestCaseField::FeatureName),
                record.to_text()
            )
        })
        .collect::<Vec<_>>()
        .join("---------------------------------------------\n");

    format!(
        "Generate a single unified Python Playwright script that executes ALL of the following test cases in one continuous flow.

Requirements:
- Use `with sync_playwright() as p:` once and launch the browser once (headless=True).
- Reuse the same `context` and `page`; if login is required, perform it once at the start.
- Run each test case in its own try/except block and keep going after a failure.
- After each test print \"Test Passed - [Test Name]\" or \"Test Failed - [Test Name]: [error]\".
- Close the browser at the end.
- Use self-healing locator strategies prioritized by reliability and stability.
- Use provided URL: {url}
- Username: {username}
- Password: {password}
- Any comments or notes must be Python comments.

Here are the test cases:
{cases}
Locator Recommendations and Context:
{context}
{instruction}
",
        url = site_url.unwrap_or("N/A"),
        username = or_na(&credentials.username),
        password = or_na(&credentials.password),
    )
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_lists_every_label() {
        for field in TestCaseField::ALL {
            assert!(
                PLANNER.contains(&format!("* {}:", field.label())),
                "missing {}",
                field
            );
        }
    }

    #[test]
    fn test_unified_message_includes_cases_and_credentials() {
        let mut record = TestCaseRecord::default();
        record.set(TestCaseField::TestCaseId, "TC-1");
        record.set(TestCaseField::FeatureName, "Login");
        let message = unified_message(
            &[record],
            "refined context",
            "test login",
            Some("https://example.com"),
            &Credentials::new("qa", ""),
        );
        assert!(message.contains("### Test Case 1: Login"));
        assert!(message.contains("* Test Case ID: TC-1"));
        assert!(message.contains("Use provided URL: https://example.com"));
        assert!(message.contains("Username: qa"));
        assert!(message.contains("Password: N/A"));
        assert!(message.contains("refined context\ntest login"));
    }
}
