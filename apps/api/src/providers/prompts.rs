// All LLM prompt constants for the parse and score collaborators.

/// System prompt for résumé extraction — enforces JSON-only output.
pub const RESUME_PARSE_SYSTEM: &str =
    "You are an expert resume parser. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT generate information that is not present in the input.";

/// Résumé extraction prompt template. Replace `{resume_text}` before sending.
pub const RESUME_PARSE_PROMPT_TEMPLATE: &str = r#"I will provide you with the raw text of a resume.
Return a structured JSON object representing the resume, including these fields when available:
- name
- contact (with email, phone, linkedin, github, website, and location)
- summary
- education
- experience
- projects
- skills (categorized if possible)
- certifications
- awards
- volunteering

Omit fields that are not present in the input. Keep the format clean and consistent.

Here is the resume:
{resume_text}"#;

/// System prompt for match scoring — enforces JSON-only output.
pub const MATCH_SCORE_SYSTEM: &str =
    "You are an expert technical recruiter who compares resumes to job descriptions \
    and ranks candidates. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Match scoring prompt template.
/// Replace `{resume_json}` and `{job_description}` before sending.
pub const MATCH_SCORE_PROMPT_TEMPLATE: &str = r#"Compare this resume to the job description and rate how well it matches.

Resume:
{resume_json}

Job Description:
{job_description}

Return a JSON object with this EXACT schema (no extra fields):
{
  "match_score": 72.5,
  "explanation": "Two sentences on why the candidate does or does not fit."
}

match_score is a number from 0 to 100. Base it only on evidence in the resume."#;
