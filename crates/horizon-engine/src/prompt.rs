//! Prompt construction
//!
//! The prompts encode the task plus explicit output-schema instructions;
//! parsing of the response lives in the invoker. No prompting protocol
//! beyond "structured input, structured JSON output" is assumed, so the
//! generation backend stays swappable.

use horizon_types::{Gap, RetrievedPassage};

/// Build the compare-and-classify prompt for one regulation passage
///
/// The passage is compared against the full set of retrieved policy
/// passages. The model decides coverage and, on a shortfall, quotes the
/// exact policy text (or declares the control absent) and assigns severity.
#[must_use]
pub fn classify_prompt(
    regulation_id: &str,
    policy_id: &str,
    regulation_passage: &RetrievedPassage,
    policy_passages: &[RetrievedPassage],
) -> String {
    let policy_context = if policy_passages.is_empty() {
        "(no relevant policy passages were found)".to_string()
    } else {
        policy_passages
            .iter()
            .enumerate()
            .map(|(i, p)| format!("[{i}] {}", p.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a compliance analyst. Decide whether the policy passages below \
         adequately cover the requirement stated in the regulation passage.\n\
         \n\
         Regulation ID: {regulation_id}\n\
         Policy ID: {policy_id}\n\
         \n\
         Regulation passage:\n{reg_text}\n\
         \n\
         Policy passages:\n{policy_context}\n\
         \n\
         Respond with ONLY a JSON object, no prose:\n\
         {{\n\
           \"covered\": bool,           // true if the requirement is adequately covered\n\
           \"title\": string,           // short gap title (omit when covered)\n\
           \"description\": string,     // what is missing and why it matters (omit when covered)\n\
           \"policy_text\": string,     // EXACT text copied from one policy passage that\n\
                                        // demonstrates the shortfall, or \"\" if the policy\n\
                                        // omits the control entirely\n\
           \"severity\": \"critical\" | \"high\" | \"medium\" | \"low\",\n\
           \"confidence\": number       // 0.0 to 1.0\n\
         }}\n\
         \n\
         Quote policy_text verbatim; never paraphrase it.",
        reg_text = regulation_passage.text,
    )
}

/// Build the drafting prompt for one gap
///
/// Carries the gap's description and both verbatim excerpts plus the
/// surrounding policy context, and instructs the model to preserve the
/// voice and formatting of the surrounding policy text.
#[must_use]
pub fn draft_prompt(gap: &Gap, surrounding_context: &[RetrievedPassage]) -> String {
    let context = if surrounding_context.is_empty() {
        "(no surrounding policy context retrieved)".to_string()
    } else {
        surrounding_context
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n")
    };
    let current = if gap.coverage_absent() {
        "(the policy has no text covering this requirement)"
    } else {
        gap.policy_text.as_str()
    };

    format!(
        "You are a policy amendment specialist. Draft a specific amendment to the \
         policy that closes the compliance gap below.\n\
         \n\
         Gap: {title}\n\
         Description: {description}\n\
         \n\
         Regulation text:\n{regulation_text}\n\
         \n\
         Current policy text:\n{current}\n\
         \n\
         Surrounding policy context:\n{context}\n\
         \n\
         Preserve the voice and formatting of the surrounding policy text.\n\
         \n\
         Respond with ONLY a JSON object, no prose:\n\
         {{\n\
           \"policy_section\": string,   // section or heading the change lands in\n\
           \"original_text\": string,    // exact current wording being changed, \"\" for pure additions\n\
           \"proposed_text\": string,    // the amended or inserted wording\n\
           \"change_type\": \"addition\" | \"modification\",\n\
           \"rationale\": string,        // why this change closes the gap\n\
           \"impact\": string            // impact assessment\n\
         }}",
        title = gap.title,
        description = gap.description,
        regulation_text = gap.regulation_text,
    )
}
