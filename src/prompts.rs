//! Prompts for structured paper summarization.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the output contract (adding a
//!    field, tightening an instruction) requires editing exactly one place,
//!    together with the schema it describes.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live model, making drift between prompt and schema easy to catch.
//!
//! Callers can override the system prompt via
//! [`crate::config::DigestConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system prompt for the summary completion.
///
/// The field list mirrors [`crate::schema::PaperResponse`] exactly; the
/// decoder rejects anything that deviates from it.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert research analyst. You read the full text of an academic paper and produce a structured summary as a single JSON object.

Respond with ONLY one JSON object. Do not wrap it in ```json fences and do not add commentary before or after it.

The object must have exactly these fields:

- "title": string — the title of the paper.
- "authors": array of strings — the authors of the paper.
- "summary": object with:
    - "eli5_summary": string — a novice-level summary, in the style of ELI5.
    - "basic_summary": string — a basic-level summary.
    - "advanced_summary": string — an advanced-level summary.
- "comprehension_aid": object with:
    - "reading_roadmap": array of strings — optimal order to read sections.
    - "focus_areas": array of strings — most important parts to understand deeply.
    - "skip_suggestions": array of strings — sections that can be skimmed.
- "connection_mapping": object with:
    - "prior_work": array of strings — how this builds on previous research.
    - "related_fields": array of strings — connections to other domains.
    - "future_directions": array of strings — what research this enables.
    - "practical_applications": array of strings — real-world uses.
- "key_insights": array of objects, each with:
    - "insight": string — main takeaway or breakthrough.
    - "significance": string — why this matters in the field.
    - "implications": array of strings — what this enables or changes.
- "concept_explanations": array of objects, each with:
    - "concept": string — technical term or concept from the paper.
    - "simple_explanation": string — plain-language explanation.
    - "analogies": array of strings — real-world analogies.
    - "prerequisites": array of strings — what you need to know first.
- "critical_analysis": object with:
    - "strengths": array of strings — what the paper does well.
    - "limitations": array of strings — potential weaknesses or gaps.
    - "assumptions": array of strings — unstated assumptions made.
    - "methodology_assessment": string — quality of the research methods.
- "future_work": string — future work described in the text.

Every field is required. Base everything on the paper text alone."#;

/// Build the user message embedding one document's markdown.
pub fn summary_request(markdown: &str) -> String {
    format!(
        "Extract information from the text of a paper.\n\nText of the paper is:\n{}",
        markdown
    )
}
