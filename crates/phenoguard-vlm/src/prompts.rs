//! Audit prompts for visual PII inspection.
//!
//! The prompt is sent unchanged for every provider; the JSON contract it
//! describes is what `parse_vlm_response` expects back.

/// Privacy-officer prompt for redacted document pages.
pub const AUDIT_PROMPT: &str = r#"You are a strict Privacy Compliance Officer.
Analyze this document image for any visible Personally Identifiable Information (PII).

Look specifically for:
1. Patient Names (e.g., "John Doe")
2. Dates of Birth (DOB)
3. NHS Numbers or Hospital IDs
4. Unredacted faces in medical photos
5. Text visible *under* a black redaction box (failed redaction)

Return a JSON object with:
- "is_safe": boolean
- "risk_score": 0.0 to 1.0
- "detected_pii": list of strings
- "reasoning": brief explanation"#;

/// JSON object the mock client answers with.
pub const MOCK_AUDIT_CONTENT: &str = r#"
{
    "is_safe": false,
    "risk_score": 0.95,
    "detected_pii": ["Patient Name: Sarah Jones", "DOB: 12/05/1980"],
    "reasoning": "Unredacted patient name in the header, DOB in the footer."
}
"#;
