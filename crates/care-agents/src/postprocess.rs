//! Post-processing shared by every handler: disclaimers and cultural notes.

use care_core::{Classification, CulturalContext, Language};

use crate::envelope::ResponseEnvelope;

/// Urgency above which a disclaimer is mandatory.
pub const DISCLAIMER_THRESHOLD: f32 = 0.7;

pub const DISCLAIMER_EN: &str = "This information does not replace professional medical advice. \
If symptoms are severe or getting worse, contact a healthcare provider or emergency services.";

pub const DISCLAIMER_VI: &str = "Thông tin này không thay thế lời khuyên y tế chuyên môn. \
Nếu triệu chứng nặng hoặc xấu đi, hãy liên hệ bác sĩ hoặc gọi cấp cứu 115.";

pub fn needs_disclaimer(envelope: &ResponseEnvelope) -> bool {
    envelope.urgency > DISCLAIMER_THRESHOLD || envelope.requires_escalation
}

/// Notes for Vietnamese-speaking patients in a given cultural context.
pub fn cultural_notes(context: CulturalContext) -> Vec<String> {
    let mut notes = vec![
        "Hãy báo cho bác sĩ biết mọi loại thuốc nam, thuốc bắc hoặc thực phẩm chức năng bạn đang dùng."
            .to_string(),
    ];
    match context {
        CulturalContext::Traditional => notes.push(
            "Y học cổ truyền có thể hỗ trợ điều trị nhưng không thay thế chẩn đoán của bác sĩ.".to_string(),
        ),
        CulturalContext::Modern => notes.push(
            "Nếu cần, bạn có thể nhờ người nhà đi cùng khi khám để hỗ trợ trao đổi với bác sĩ.".to_string(),
        ),
        CulturalContext::Mixed => notes.push(
            "Khi kết hợp thuốc nam và thuốc tây, nên uống cách nhau và hỏi ý kiến dược sĩ.".to_string(),
        ),
    }
    notes
}

/// Append the disclaimer and cultural notes, and record language and culture.
pub fn postprocess(mut envelope: ResponseEnvelope, classification: &Classification) -> ResponseEnvelope {
    let language = classification.language.clone();
    let cultural_context = envelope
        .metadata
        .cultural_context
        .or(classification.cultural_context);

    if needs_disclaimer(&envelope) && !envelope.text.contains(DISCLAIMER_EN) {
        envelope.text.push_str("\n\n");
        envelope.text.push_str(DISCLAIMER_EN);
        if language.includes_vietnamese() {
            envelope.text.push('\n');
            envelope.text.push_str(DISCLAIMER_VI);
        }
        envelope.metadata.disclaimer_added = true;
    }

    if let Some(context) = cultural_context {
        if matches!(language, Language::Vietnamese | Language::Mixed) {
            envelope.metadata.cultural_notes = cultural_notes(context);
        }
    }

    envelope.metadata.language = Some(language);
    envelope.metadata.cultural_context = cultural_context;
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerKind;

    fn classification(language: Language, cultural: Option<CulturalContext>) -> Classification {
        let mut c = Classification::fallback();
        c.language = language;
        c.cultural_context = cultural;
        c
    }

    #[test]
    fn test_no_disclaimer_below_threshold() {
        let env = ResponseEnvelope::new(HandlerKind::Medication, "Take it with food.").with_urgency(0.7);
        let env = postprocess(env, &classification(Language::English, None));
        assert!(!env.metadata.disclaimer_added);
        assert_eq!(env.text, "Take it with food.");
    }

    #[test]
    fn test_english_disclaimer_on_urgency() {
        let env = ResponseEnvelope::new(HandlerKind::Clinical, "See a doctor.").with_urgency(0.75);
        let env = postprocess(env, &classification(Language::English, None));
        assert!(env.metadata.disclaimer_added);
        assert!(env.text.ends_with(DISCLAIMER_EN));
        assert!(!env.text.contains(DISCLAIMER_VI));
    }

    #[test]
    fn test_bilingual_disclaimer_on_escalation() {
        let env = ResponseEnvelope::new(HandlerKind::Medication, "Hỏi dược sĩ.").with_escalation(true);
        let env = postprocess(env, &classification(Language::Vietnamese, None));
        assert!(env.text.contains(DISCLAIMER_EN));
        assert!(env.text.ends_with(DISCLAIMER_VI));
    }

    #[test]
    fn test_disclaimer_not_duplicated() {
        let env = ResponseEnvelope::new(HandlerKind::Emergency, "Call 115.").with_urgency(0.9);
        let c = classification(Language::English, None);
        let once = postprocess(env, &c);
        let twice = postprocess(once.clone(), &c);
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn test_cultural_notes_for_vietnamese_only() {
        let env = ResponseEnvelope::new(HandlerKind::CulturallyLocalized, "ok");
        let vi = postprocess(
            env.clone(),
            &classification(Language::Vietnamese, Some(CulturalContext::Traditional)),
        );
        assert_eq!(vi.metadata.cultural_notes.len(), 2);
        assert_eq!(vi.metadata.cultural_context, Some(CulturalContext::Traditional));

        let en = postprocess(env, &classification(Language::English, Some(CulturalContext::Traditional)));
        assert!(en.metadata.cultural_notes.is_empty());
        assert_eq!(en.metadata.language, Some(Language::English));
    }
}
