//! Chat recommendation types and the offline keyword recommender
//!
//! The chat endpoint normally asks the generative-text API for a reply. When
//! no API key is configured, [`offline_reply`] answers from a fixed table
//! keyed by the mood detected in the message.

use serde::{Deserialize, Serialize};

/// Structured reply shown in the chat popup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Meditation,
    Music,
    Breathwork,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    /// Human-readable length, e.g. "10 min"
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RecommendationAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "set-timer")]
    SetTimer,
}

/// Actionable directive: set the timer and optionally queue an ambient sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: String,
    /// Minutes
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_sound: Option<String>,
}

/// Mood detected from free text by keyword matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedMood {
    Stressed,
    Sad,
    Angry,
    Tired,
    Happy,
    Neutral,
}

/// Checked in order; the first mood with a matching keyword wins.
const MOOD_KEYWORDS: &[(DetectedMood, &[&str])] = &[
    (
        DetectedMood::Stressed,
        &["stress", "anxious", "overwhelmed", "panic", "busy", "pressure", "tense"],
    ),
    (
        DetectedMood::Sad,
        &["sad", "depressed", "down", "unhappy", "cry", "lonely", "grief"],
    ),
    (
        DetectedMood::Angry,
        &["angry", "mad", "furious", "irritated", "annoyed", "rage"],
    ),
    (
        DetectedMood::Tired,
        &["tired", "exhausted", "sleepy", "fatigue", "drained", "burnout"],
    ),
    (
        DetectedMood::Happy,
        &["happy", "joy", "excited", "great", "good", "wonderful", "blessed"],
    ),
    (
        DetectedMood::Neutral,
        &["ok", "fine", "normal", "nothing", "bored"],
    ),
];

pub fn analyze_mood(input: &str) -> DetectedMood {
    let lower = input.to_lowercase();

    MOOD_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(mood, _)| *mood)
        .unwrap_or(DetectedMood::Neutral)
}

fn timed(
    kind: RecommendationKind,
    title: &str,
    description: &str,
    minutes: u32,
    link: &str,
) -> Recommendation {
    Recommendation {
        kind,
        title: title.to_string(),
        description: description.to_string(),
        duration: format!("{} min", minutes),
        link: Some(link.to_string()),
        action: Some(RecommendationAction {
            kind: ActionKind::SetTimer,
            label: format!("Start {}m Timer", minutes),
            duration: minutes,
            ambient_sound: None,
        }),
    }
}

fn music(title: &str, description: &str, minutes: u32) -> Recommendation {
    Recommendation {
        kind: RecommendationKind::Music,
        title: title.to_string(),
        description: description.to_string(),
        duration: format!("{} min", minutes),
        link: None,
        action: None,
    }
}

/// Canned reply for a detected mood
pub fn recommendations_for(mood: DetectedMood) -> ChatReply {
    use RecommendationKind::{Breathwork, Meditation};

    let (message, recommendations) = match mood {
        DetectedMood::Stressed => (
            "I hear you. It sounds like you're carrying a lot right now. Let's take a moment to slow down.",
            vec![
                timed(Meditation, "Deep Relaxation", "A 10-minute guided meditation to release tension.", 10, "/meditate?type=relaxation"),
                timed(Breathwork, "Box Breathing", "Inhale 4s, Hold 4s, Exhale 4s, Hold 4s.", 5, "/meditate?type=box-breathing"),
                music("Alpha Waves", "Binaural beats to calm the mind.", 15),
            ],
        ),
        DetectedMood::Sad => (
            "It's okay to feel this way. Be gentle with yourself. Here are some soothing options.",
            vec![
                timed(Meditation, "Loving Kindness", "Send love to yourself and others.", 15, "/meditate?type=loving-kindness"),
                music("Gentle Piano", "Soft melodies to comfort you.", 20),
            ],
        ),
        DetectedMood::Angry => (
            "I understand. Anger is a strong energy. Let's channel it safely.",
            vec![
                timed(Breathwork, "Cooling Breath", "Sitali breath to cool down the body and mind.", 5, "/meditate?type=cooling-breath"),
                timed(Meditation, "Observing Emotions", "Watch the anger without reacting.", 10, "/meditate?type=observing"),
            ],
        ),
        DetectedMood::Tired => (
            "Rest is important. If you can't sleep yet, try these to recharge gently.",
            vec![
                timed(Meditation, "Yoga Nidra", "Non-sleep deep rest for recovery.", 20, "/meditate?type=yoga-nidra"),
                music("Delta Waves", "Deep sleep frequencies.", 30),
            ],
        ),
        DetectedMood::Happy => (
            "That's wonderful! Let's amplify that positive energy.",
            vec![
                timed(Meditation, "Gratitude Flow", "Focus on what you are thankful for.", 10, "/meditate?type=gratitude"),
                timed(Breathwork, "Energizing Breath", "Kapalabhati breath for vitality.", 5, "/meditate?type=energizing"),
            ],
        ),
        DetectedMood::Neutral => (
            "I'm here to support you. How are you feeling right now? You can tell me if you're stressed, sad, or just want to relax.",
            vec![timed(Meditation, "Mindfulness Check-in", "A quick scan of how you are doing.", 5, "/meditate?type=mindfulness")],
        ),
    };

    ChatReply {
        message: message.to_string(),
        recommendations,
    }
}

/// Answer a message without the generative API
pub fn offline_reply(message: &str) -> ChatReply {
    recommendations_for(analyze_mood(message))
}
