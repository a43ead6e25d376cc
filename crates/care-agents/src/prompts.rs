//! System prompts and user-prompt formatting for handler backend calls.
//!
//! Each prompt opens with a distinct role line so test backends can script
//! replies per handler.

use care_core::{Language, QueryContext};

pub const MEDICATION_SYSTEM_PROMPT: &str = r#"You are a medication safety assistant.

You receive a patient question (identifiers already removed), the patient's context, and findings from a rule-based interaction check. Explain the findings in plain language.

Guidelines:
- Never tell the patient to start, stop or change a dose on their own.
- Name every interaction and contraindication listed in FINDINGS and what to do about it.
- Recommend talking to a pharmacist or physician whenever FINDINGS says so.
- Keep the answer under 200 words.
- Answer in the language given in RESPOND IN."#;

pub const EMERGENCY_SYSTEM_PROMPT: &str = r#"You are an emergency triage assistant.

You receive a patient message (identifiers already removed) and a triage assessment. Give short, numbered, immediately actionable instructions that match the assessment.

Guidelines:
- If the disposition is call_emergency_services, the first line must tell the patient to call emergency services now (115 in Vietnam, 911 in the US).
- Do not diagnose. Do not delay care.
- Keep the answer under 120 words.
- Answer in the language given in RESPOND IN."#;

pub const CLINICAL_SYSTEM_PROMPT: &str = r#"You are a clinical decision support assistant.

You receive a patient question (identifiers already removed), context, and a ranked list of conditions to consider with independent probabilities. Explain what the findings may mean and what the sensible next steps are.

Guidelines:
- Present conditions as possibilities, never as a diagnosis.
- Mention recommended tests and referrals listed in FINDINGS.
- Advise seeing a physician when FINDINGS says physician review is needed.
- Keep the answer under 200 words.
- Answer in the language given in RESPOND IN."#;

pub const CULTURAL_SYSTEM_PROMPT: &str = r#"You are a Vietnamese cultural health assistant (trợ lý sức khỏe văn hóa Việt Nam).

You receive a patient question (identifiers already removed) about traditional remedies or care practices, plus a safety review of the remedies mentioned. Respect traditional practice while keeping the patient safe.

Guidelines:
- Give two tracks: traditional practice (Y học cổ truyền) and conventional medicine (Y học hiện đại).
- State clearly when a remedy should not be combined with the patient's medicines or conditions.
- Recommend seeing a physician whenever FINDINGS says consultation is required.
- Use respectful forms of address.
- Keep the answer under 200 words.
- Answer in the language given in RESPOND IN."#;

/// Format the user-side prompt for a handler call.
pub fn format_handler_input(
    text: &str,
    context: &QueryContext,
    findings: &[String],
    language: &Language,
) -> String {
    let mut parts = vec![format!("[QUERY: {}]", text)];

    let context_desc = describe_context(context);
    if !context_desc.is_empty() {
        parts.push(format!("[CONTEXT: {}]", context_desc));
    }

    if findings.is_empty() {
        parts.push("[FINDINGS: none]".to_string());
    } else {
        parts.push(format!("[FINDINGS: {}]", findings.join(" | ")));
    }

    parts.push(format!("[RESPOND IN: {}]", respond_in(language)));
    parts.join("\n")
}

fn respond_in(language: &Language) -> &str {
    match language {
        Language::English => "English",
        Language::Vietnamese => "Vietnamese",
        Language::Mixed => "Vietnamese, with key terms also in English",
        Language::Other(raw) => raw,
    }
}

/// Compact description of the patient context. Empty when nothing is known.
pub fn describe_context(context: &QueryContext) -> String {
    let mut parts = Vec::new();

    if let Some(age) = context.age {
        parts.push(format!("age {}", age));
    }
    if !context.conditions.is_empty() {
        parts.push(format!("conditions: {}", context.conditions.join(", ")));
    }
    if !context.current_medications.is_empty() {
        parts.push(format!("medications: {}", context.current_medications.join(", ")));
    }
    if !context.allergies.is_empty() {
        parts.push(format!("allergies: {}", context.allergies.join(", ")));
    }
    if let Some(status) = context.pregnancy_status {
        parts.push(format!("pregnancy: {:?}", status).to_lowercase());
    }
    if let Some(severity) = context.self_reported_severity {
        parts.push(format!("self-reported severity {}/10", severity));
    }

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_handler_input() {
        let ctx = QueryContext::default()
            .with_age(70)
            .with_medication("warfarin");
        let input = format_handler_input(
            "can I take aspirin",
            &ctx,
            &["warfarin + aspirin: major".to_string()],
            &Language::English,
        );

        assert_eq!(
            input,
            "[QUERY: can I take aspirin]\n[CONTEXT: age 70; medications: warfarin]\n[FINDINGS: warfarin + aspirin: major]\n[RESPOND IN: English]"
        );
    }

    #[test]
    fn test_empty_context_omitted() {
        let input = format_handler_input("hi", &QueryContext::default(), &[], &Language::Vietnamese);
        assert!(!input.contains("[CONTEXT"));
        assert!(input.contains("[FINDINGS: none]"));
        assert!(input.ends_with("[RESPOND IN: Vietnamese]"));
    }

    #[test]
    fn test_prompts_have_distinct_roles() {
        let roles = [
            MEDICATION_SYSTEM_PROMPT,
            EMERGENCY_SYSTEM_PROMPT,
            CLINICAL_SYSTEM_PROMPT,
            CULTURAL_SYSTEM_PROMPT,
        ]
        .map(|p| p.lines().next().unwrap_or_default());
        for (i, a) in roles.iter().enumerate() {
            for b in &roles[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
