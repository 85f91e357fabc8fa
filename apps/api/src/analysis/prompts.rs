// Prompt constants for résumé feedback.

/// System prompt for résumé analysis. Sent together with `JSON_ONLY_SYSTEM`.
pub const FEEDBACK_SYSTEM: &str = "You are an expert in ATS (Applicant Tracking Systems) \
    and resume analysis. You give honest, specific, actionable feedback.";

/// Shape of the feedback object the model must return.
pub const FEEDBACK_FORMAT: &str = r#"{
  "overallScore": 0,
  "ATS": {
    "score": 0,
    "tips": [{"type": "good" | "improve", "tip": "short headline"}]
  },
  "toneAndStyle": {
    "score": 0,
    "tips": [{"type": "good" | "improve", "tip": "short headline", "explanation": "detailed explanation"}]
  },
  "content": {
    "score": 0,
    "tips": [{"type": "good" | "improve", "tip": "short headline", "explanation": "detailed explanation"}]
  },
  "structure": {
    "score": 0,
    "tips": [{"type": "good" | "improve", "tip": "short headline", "explanation": "detailed explanation"}]
  },
  "skills": {
    "score": 0,
    "tips": [{"type": "good" | "improve", "tip": "short headline", "explanation": "detailed explanation"}]
  }
}
All scores are integers from 0 to 100. Give 3-4 tips per category."#;

/// Opening of the instructions, up to the job title.
const INSTRUCTIONS_PREAMBLE: &str = "Analyze and rate this resume and suggest how to improve it.
The rating can be low if the resume is bad. Be thorough and detailed.
Do not hesitate to point out mistakes or areas for improvement; low scores help the user improve.
If a job description is provided, take it into consideration and score the resume against it.

The job title is: ";

const DESCRIPTION_LABEL: &str = "\nThe job description is: ";

const FORMAT_LABEL: &str = "\n\nProvide the feedback using the following format:\n";

const RETURN_CLAUSE: &str =
    "\n\nReturn the analysis as a JSON object, without any other text and without backticks.";

/// Builds the free-text instructions sent alongside a résumé.
/// Deterministic: the same inputs always produce the same instructions.
/// Job fields are inserted verbatim; braces in them are never expanded.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    format!(
        "{INSTRUCTIONS_PREAMBLE}{}{DESCRIPTION_LABEL}{}{FORMAT_LABEL}{FEEDBACK_FORMAT}{RETURN_CLAUSE}",
        job_title.trim(),
        job_description.trim(),
    )
}
