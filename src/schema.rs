//! The fixed shape of a structured paper summary.
//!
//! [`PaperResponse`] is the contract between the prompt (which describes
//! these fields to the model) and the decoder (which rejects any response
//! that does not deserialize into them). Every field is required; unknown
//! extra fields from the model are ignored rather than rejected, since
//! models occasionally volunteer additions and the decoded shape is what
//! downstream consumers rely on.

use serde::{Deserialize, Serialize};

/// One technical concept from the paper, explained for a non-expert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptExplanation {
    /// Technical term or concept from the paper.
    pub concept: String,
    /// Plain-language explanation.
    pub simple_explanation: String,
    /// Real-world analogies to aid understanding.
    pub analogies: Vec<String>,
    /// What you need to know first.
    pub prerequisites: Vec<String>,
}

/// A major takeaway and why it matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInsight {
    /// Main takeaway or breakthrough.
    pub insight: String,
    /// Why this matters in the field.
    pub significance: String,
    /// What this enables or changes.
    pub implications: Vec<String>,
}

/// The paper summarized at three levels of assumed background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLevels {
    /// Novice-level summary, in the style of ELI5.
    pub eli5_summary: String,
    /// Basic-level summary.
    pub basic_summary: String,
    /// Advanced-level summary.
    pub advanced_summary: String,
}

/// Balanced assessment of the work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalAnalysis {
    /// What the paper does well.
    pub strengths: Vec<String>,
    /// Potential weaknesses or gaps.
    pub limitations: Vec<String>,
    /// Unstated assumptions made.
    pub assumptions: Vec<String>,
    /// Quality of the research methods.
    pub methodology_assessment: String,
}

/// How the work fits into the broader research landscape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMapping {
    /// How this builds on previous research.
    pub prior_work: Vec<String>,
    /// Connections to other domains.
    pub related_fields: Vec<String>,
    /// What research this enables.
    pub future_directions: Vec<String>,
    /// Real-world uses.
    pub practical_applications: Vec<String>,
}

/// A guide for how to approach reading the paper itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensionAid {
    /// Optimal order to read sections.
    pub reading_roadmap: Vec<String>,
    /// Most important parts to understand deeply.
    pub focus_areas: Vec<String>,
    /// Sections that can be skimmed.
    pub skip_suggestions: Vec<String>,
}

/// The complete structured summary of one paper.
///
/// This is the decoded form of a single LLM response; one is produced per
/// successfully loaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperResponse {
    /// The title of the paper.
    pub title: String,
    /// The authors of the paper.
    pub authors: Vec<String>,
    /// Multi-level summary of the paper.
    pub summary: SummaryLevels,
    /// Guide for how to approach reading the paper.
    pub comprehension_aid: ComprehensionAid,
    /// How this work fits in the broader landscape.
    pub connection_mapping: ConnectionMapping,
    /// Major breakthroughs and findings.
    pub key_insights: Vec<KeyInsight>,
    /// Concept explanations for the paper.
    pub concept_explanations: Vec<ConceptExplanation>,
    /// Balanced assessment of the work.
    pub critical_analysis: CriticalAnalysis,
    /// Future work described in the text.
    pub future_work: String,
}

/// A minimal complete response as the model is asked to produce it.
///
/// Shared by the schema, decode, and driver tests.
#[cfg(test)]
pub(crate) fn sample_response_json() -> String {
    serde_json::json!({
        "title": "Attention Is All You Need",
        "authors": ["Vaswani", "Shazeer"],
        "summary": {
            "eli5_summary": "A new way for computers to read.",
            "basic_summary": "Introduces the Transformer.",
            "advanced_summary": "Replaces recurrence with self-attention."
        },
        "comprehension_aid": {
            "reading_roadmap": ["Abstract", "Section 3"],
            "focus_areas": ["Scaled dot-product attention"],
            "skip_suggestions": ["Appendix"]
        },
        "connection_mapping": {
            "prior_work": ["seq2seq"],
            "related_fields": ["machine translation"],
            "future_directions": ["larger models"],
            "practical_applications": ["translation"]
        },
        "key_insights": [{
            "insight": "Attention suffices",
            "significance": "Removes recurrence",
            "implications": ["parallel training"]
        }],
        "concept_explanations": [{
            "concept": "self-attention",
            "simple_explanation": "Each word looks at every other word.",
            "analogies": ["a room of people listening to each other"],
            "prerequisites": ["dot products"]
        }],
        "critical_analysis": {
            "strengths": ["simplicity"],
            "limitations": ["quadratic cost"],
            "assumptions": ["fixed-length context"],
            "methodology_assessment": "Strong benchmarks."
        },
        "future_work": "Apply to other modalities."
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_response_deserializes() {
        let resp: PaperResponse = serde_json::from_str(&sample_response_json()).unwrap();
        assert_eq!(resp.title, "Attention Is All You Need");
        assert_eq!(resp.authors.len(), 2);
        assert_eq!(resp.key_insights[0].implications, vec!["parallel training"]);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        // Drop `title` — deserialization must fail, not default.
        let mut v: serde_json::Value = serde_json::from_str(&sample_response_json()).unwrap();
        v.as_object_mut().unwrap().remove("title");
        let err = serde_json::from_value::<PaperResponse>(v).unwrap_err();
        assert!(err.to_string().contains("title"), "got: {err}");
    }

    #[test]
    fn unknown_extra_fields_are_tolerated() {
        let mut v: serde_json::Value = serde_json::from_str(&sample_response_json()).unwrap();
        v.as_object_mut()
            .unwrap()
            .insert("confidence".into(), serde_json::json!(0.9));
        let resp: PaperResponse = serde_json::from_value(v).unwrap();
        assert_eq!(resp.authors[0], "Vaswani");
    }

    #[test]
    fn response_round_trips_through_json() {
        let resp: PaperResponse = serde_json::from_str(&sample_response_json()).unwrap();
        let json = serde_json::to_string(&resp).unwrap();
        let back: PaperResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.future_work, resp.future_work);
    }
}
