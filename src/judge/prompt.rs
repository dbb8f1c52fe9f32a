//! Evaluation prompt
//!
//! Deterministic: the same problem and code always render the same text.

use std::fmt::Write;

use crate::models::Problem;

const INSTRUCTIONS: &str = r#"INSTRUCTIONS:
1. Analyze the logic and correctness of the code
2. Check if it would produce correct output for all test cases
3. Check for potential runtime errors, out of bounds, etc.

Respond in this EXACT format (use these exact words):
VERDICT: [Accepted/Wrong Answer/Runtime Error/Compilation Error]
FEEDBACK: [Brief explanation of why the code passed or failed, max 2-3 sentences]

Be fair but strict. If the logic is correct and handles all cases, mark it as Accepted."#;

/// Render the judge prompt for `code` against every test case of `problem`.
pub fn build_evaluation_prompt(problem: &Problem, code: &str) -> String {
    let mut test_cases = String::new();
    for (i, tc) in problem.test_cases.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = write!(
            test_cases,
            "\nTest Case {}:\nInput: {}\nExpected Output: {}\n",
            i + 1,
            tc.input,
            tc.expected
        );
    }

    format!(
        "You are a code judge for a DSA practice platform. Evaluate the following C++ solution.\n\n\
         PROBLEM: {}\n\n\
         DESCRIPTION:\n{}\n\n\
         TEST CASES:{}\n\n\
         USER'S CODE:\n{}\n\n\
         {}",
        problem.title, problem.description, test_cases, code, INSTRUCTIONS
    )
}
