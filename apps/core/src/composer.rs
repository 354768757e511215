//! Response templates.
//!
//! Pure formatting: every function here maps already-decided outcomes to text.
//! No routing decisions are made in this module.

use crate::brain::{RiskLevel, SupportTopic};
use crate::models::{ActionId, Response, SuggestedAction};
use crate::screening::{Instrument, ScreeningResult, ValidationError};
use crate::screening::instrument::ANSWER_SCALE;

pub const LIFELINE: &str = "13 11 14";
pub const KIDS_HELPLINE: &str = "1800 55 1800";
pub const EMERGENCY: &str = "000";

/// The three numbers every crisis or failure message carries.
pub fn hotline_block() -> String {
    format!(
        "📞 **Lifeline: {}** (24/7)\n🧒 **Kids Helpline: {}** (24/7)\n🚨 **Emergency: {}**",
        LIFELINE, KIDS_HELPLINE, EMERGENCY
    )
}

// --- Crisis path ---

/// Reply for a HIGH or IMMINENT classification.
pub fn crisis_response(level: RiskLevel, name: &str) -> Response {
    let text = match level {
        RiskLevel::Imminent => format!(
            "🚨 **{name}, your safety comes first right now.**\n\n\
             **If you are in immediate danger, call {EMERGENCY} now** or go to your nearest emergency department.\n\n\
             Please reach out immediately:\n{}\n\n\
             If you can, stay with someone you trust until help arrives. You matter. 💙",
            hotline_block()
        ),
        _ => format!(
            "🚨 **I'm very concerned about your safety, {name}.**\n\n\
             Please reach out for immediate help:\n{}\n\n\
             You don't have to go through this alone. You matter and professional help is available right now. 💙",
            hotline_block()
        ),
    };
    Response::with_actions(
        text,
        vec![SuggestedAction::new("🆘 Crisis resources", ActionId::Crisis)],
    )
}

/// Full resource sheet for `/crisis`.
pub fn crisis_resources() -> Response {
    Response::text(format!(
        "🆘 **Crisis Support Resources - Australia**\n\n\
         **If you're in immediate danger, call {EMERGENCY} now.**\n\n\
         **24/7 Crisis Support:**\n\
         📞 **Lifeline Australia: {LIFELINE}**\n   • Suicide prevention and crisis support\n   • Available 24/7, free and confidential\n\n\
         🧒 **Kids Helpline: {KIDS_HELPLINE}**\n   • For people aged 5-25 years\n   • Phone and online counseling 24/7\n\n\
         💬 **Crisis Text Support:**\n   • Text **HELLO** to **0477 13 11 14**\n   • Available 6PM - midnight AEST\n\n\
         🌐 **Beyond Blue: 1300 22 4636**\n   • Depression, anxiety, suicide prevention\n\n\
         **Remember:** Crisis feelings are temporary. You don't have to face this alone.\n\n\
         Your life has value and meaning. 💙"
    ))
}

/// Generic reply when storage or the actor system failed.
pub fn technical_difficulty() -> Response {
    Response::text(format!(
        "I'm having a technical issue right now. If this is urgent:\n\n{}",
        hotline_block()
    ))
}

// --- Screening ---

/// Header, scale and first question.
pub fn screening_intro(instrument: Instrument) -> String {
    let icon = match instrument {
        Instrument::Phq9 => "📋",
        Instrument::Gad7 => "😰",
    };
    format!(
        "{icon} **{} Screening ({})**\n\n\
         Over the last 2 weeks, how often have you been bothered by the following problems?\n\n\
         **Respond with:**\n{ANSWER_SCALE}\n\n{}",
        instrument.topic(),
        instrument.name(),
        question_prompt(instrument, 0)
    )
}

/// Prompt for the question at a 0-based index.
pub fn question_prompt(instrument: Instrument, index: usize) -> String {
    let text = instrument.question(index).unwrap_or_default();
    format!(
        "**Question {} of {}:**\n\"{}\"\n\n{}",
        index + 1,
        instrument.question_count(),
        text,
        ANSWER_SCALE
    )
}

/// Re-prompt after a rejected answer.
pub fn reprompt(error: &ValidationError) -> Response {
    match error {
        ValidationError::NotANumber => {
            Response::text("Please respond with a number: 0, 1, 2, or 3")
        }
        ValidationError::OutOfRange(_) => {
            Response::text(format!("Please respond with 0, 1, 2, or 3:\n{}", ANSWER_SCALE))
        }
        ValidationError::NoActiveScreening => {
            Response::text("There is no screening in progress. Use /assess to start one.")
        }
    }
}

/// Result summary, with crisis resources appended when the score escalates.
pub fn screening_result(result: &ScreeningResult) -> Response {
    let instrument = result.instrument;
    let next_steps = match instrument {
        Instrument::Phq9 => {
            "**Next Steps:**\n\
             • Continue self-care and healthy habits\n\
             • Consider professional support if symptoms persist\n\
             • Contact crisis support if you have thoughts of self-harm\n\n\
             **Resources:**\n\
             • GP for Mental Health Care Plan\n\
             • Headspace (12-25 years): headspace.org.au"
        }
        Instrument::Gad7 => {
            "**Anxiety Management:**\n\
             • Deep breathing exercises\n\
             • Progressive muscle relaxation\n\
             • Mindfulness techniques\n\
             • Regular exercise\n\n\
             **Professional Support:**\n\
             • GP for Mental Health Care Plan\n\
             • Anxiety-specific therapy (CBT)\n\
             • Headspace or local counseling"
        }
    };
    let mut text = format!(
        "📊 **{} Assessment Results ({})**\n\n\
         **Your Score:** {}/{}\n\
         **Level:** {}\n\n\
         **Recommendation:** {}\n\n\
         {}\n\n\
         Remember: this is a screening tool, not a diagnosis.",
        instrument.topic(),
        instrument.name(),
        result.total_score,
        instrument.max_score(),
        result.severity,
        result.recommendation,
        next_steps
    );
    if result.escalate {
        text.push_str(&format!(
            "\n\n---\n\nGiven your score, please consider reaching out for professional support. \
             If you have thoughts of self-harm, please call for help immediately:\n{}",
            hotline_block()
        ));
    }
    Response::text(text)
}

// --- Commands and menus ---

pub fn welcome(name: &str) -> Response {
    Response::with_actions(
        format!(
            "🌟 **Welcome**\n\n\
             Hi {name}! I'm your mental health support companion.\n\n\
             **What I can help with:**\n\
             • Mental health screening\n\
             • Coping strategies for anxiety and depression\n\
             • Crisis support and safety resources\n\n\
             **Available commands:**\n\
             /assess - Take a mental health screening\n\
             /crisis - Emergency support resources\n\
             /help - View all commands\n\n\
             **Important:** I provide support and coping skills, but I'm not a replacement for professional therapy or emergency services.\n\n\
             How are you feeling today? 💙"
        ),
        main_menu(),
    )
}

pub fn help() -> Response {
    Response::with_actions(
        format!(
            "🌟 **Commands**\n\n\
             /start - Welcome and introduction\n\
             /help - Show this help menu\n\
             /cancel - Cancel any active process\n\
             /assess - Mental health screening\n\
             /crisis - Emergency crisis support resources\n\n\
             Just message me about how you're feeling, or use /assess for a formal screening.\n\n\
             **Crisis Support (24/7):**\n{}",
            hotline_block()
        ),
        main_menu(),
    )
}

pub fn assess_menu() -> Response {
    Response::with_actions(
        format!(
            "📊 **Mental Health Screening**\n\n\
             **Depression Screening ({})** - {} questions, about 3 minutes\n\
             **Anxiety Screening ({})** - {} questions, about 2 minutes\n\n\
             Your answers help identify whether additional support would be beneficial.\n\n\
             Which screening would you like to complete?",
            Instrument::Phq9.name(),
            Instrument::Phq9.question_count(),
            Instrument::Gad7.name(),
            Instrument::Gad7.question_count()
        ),
        vec![
            SuggestedAction::new("📋 Depression Screening (PHQ-9)", ActionId::AssessDepression),
            SuggestedAction::new("😰 Anxiety Screening (GAD-7)", ActionId::AssessAnxiety),
            SuggestedAction::new("🛡️ Safety Check", ActionId::AssessSafety),
        ],
    )
}

pub fn safety_check() -> Response {
    Response::with_actions(
        format!(
            "The safety check is not available yet. For immediate help, call Lifeline: {}",
            LIFELINE
        ),
        vec![SuggestedAction::new("🆘 Crisis resources", ActionId::Crisis)],
    )
}

pub fn cancelled(had_active_process: bool) -> Response {
    if had_active_process {
        Response::text("✅ Process cancelled. You can start fresh anytime!")
    } else {
        Response::text("No active process to cancel. Use /help to see available commands.")
    }
}

pub fn unknown_command(command: &str) -> Response {
    Response::text(format!(
        "I don't know the command {}. Use /help to see available commands.",
        command
    ))
}

fn main_menu() -> Vec<SuggestedAction> {
    vec![
        SuggestedAction::new("📊 Take a screening", ActionId::AssessDepression),
        SuggestedAction::new("🆘 Crisis resources", ActionId::Crisis),
    ]
}

// --- Fallback replies ---

/// Local supportive reply for a detected topic.
pub fn supportive_reply(topic: SupportTopic, name: &str) -> String {
    match topic {
        SupportTopic::Anxiety => format!(
            "I understand you're feeling anxious, {name}. That's really tough to deal with.\n\n\
             **Try this grounding technique:**\n\
             • 5 things you can see\n• 4 things you can touch\n• 3 things you can hear\n\
             • 2 things you can smell\n• 1 thing you can taste\n\n\
             **Remember:** Anxiety is temporary and manageable. You've gotten through difficult times before.\n\n\
             What's causing you the most anxiety right now? 🌸"
        ),
        SupportTopic::Depression => format!(
            "I hear the pain in your message, {name}. Depression can make everything feel overwhelming.\n\n\
             **Small steps that can help:**\n\
             • One tiny activity you used to enjoy\n• Reaching out to one person who cares\n\
             • Taking a warm shower or bath\n• Listening to music\n\n\
             **Remember:** You matter, and these feelings can change with support.\n\n\
             Is there one small thing you could do for yourself today? 💜"
        ),
        SupportTopic::Stress => format!(
            "It sounds like you're under a lot of pressure, {name}. That's exhausting.\n\n\
             **Quick stress relief:**\n\
             • Take 3 deep breaths (in for 4, out for 6)\n• Name 3 things you're grateful for\n\
             • Do some gentle stretching\n\n\
             **For ongoing stress:** Break big problems into smaller, manageable pieces.\n\n\
             What's the biggest source of stress for you right now? 📚"
        ),
        SupportTopic::Greeting => format!(
            "Hello {name}! 🌟 I'm here to provide mental health support and coping strategies.\n\n\
             You can:\n\
             • Talk to me about how you're feeling\n\
             • Use /assess for a mental health screening\n\
             • Use /crisis for emergency resources\n\
             • Use /help for all available commands\n\n\
             How are you feeling today? 💙"
        ),
        SupportTopic::General => format!(
            "Thank you for sharing that with me, {name}. I'm here to listen and provide support.\n\n\
             **Available resources:**\n\
             • /assess - Mental health screening\n\
             • /crisis - Emergency support numbers\n\
             • /help - All available commands\n\n\
             What's most on your mind right now? 🌟"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::engine::score;

    fn has_all_hotlines(text: &str) -> bool {
        text.contains(LIFELINE) && text.contains(KIDS_HELPLINE) && text.contains(EMERGENCY)
    }

    #[test]
    fn test_crisis_templates_differ() {
        let high = crisis_response(RiskLevel::High, "Sam");
        let imminent = crisis_response(RiskLevel::Imminent, "Sam");
        assert_ne!(high.text, imminent.text);
        assert!(has_all_hotlines(&high.text));
        assert!(has_all_hotlines(&imminent.text));
        assert!(imminent.text.contains("immediate danger, call 000"));
    }

    #[test]
    fn test_technical_difficulty_has_hotlines() {
        assert!(has_all_hotlines(&technical_difficulty().text));
    }

    #[test]
    fn test_result_escalation_text() {
        let calm = screening_result(&score(Instrument::Gad7, &[0, 0, 1, 0, 0, 0, 0]));
        assert!(calm.text.contains("1/21"));
        assert!(!calm.text.contains(LIFELINE));

        let severe = screening_result(&score(Instrument::Gad7, &[3; 7]));
        assert!(severe.text.contains("21/21"));
        assert!(severe.text.contains("Severe"));
        assert!(has_all_hotlines(&severe.text));
    }

    #[test]
    fn test_supportive_replies_carry_no_hotlines() {
        for topic in [
            SupportTopic::Anxiety,
            SupportTopic::Depression,
            SupportTopic::Stress,
            SupportTopic::Greeting,
            SupportTopic::General,
        ] {
            let reply = supportive_reply(topic, "Sam");
            assert!(reply.contains("Sam"));
            assert!(!reply.contains(LIFELINE), "{} reply has hotline", topic);
        }
    }

    #[test]
    fn test_menu_has_actions() {
        let menu = assess_menu();
        let ids: Vec<ActionId> = menu.suggested_actions.iter().map(|a| a.action_id).collect();
        assert_eq!(
            ids,
            vec![ActionId::AssessDepression, ActionId::AssessAnxiety, ActionId::AssessSafety]
        );
    }
}
