//! Scripted response generation.
//!
//! This module provides the [`ScriptedGenerator`], a deterministic stand-in
//! for a hosted model. It parses help prompts back into the student's name
//! and message, then picks a reply from a fixed keyword script. Prompts in
//! any other shape are refused so the caller can fall back.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::{GenerationError, TextGenerator};

/// Deterministic generator that answers from a fixed response script.
///
/// Replies are keyed on keywords in the student's message, checked in a
/// fixed order, with a generic reply for anything unmatched. Only help
/// prompts are understood; see [`crate::help_prompt`] for the shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedGenerator;

impl ScriptedGenerator {
    /// Creates a new scripted generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some(message) = extract_message(prompt) else {
            return Err(GenerationError::unscripted(
                "prompt has no quoted student message",
            ));
        };
        let student_name = extract_student_name(prompt);

        debug!(student = %student_name, "Picking scripted reply");
        Ok(scripted_reply(&message, &student_name))
    }

    fn mode(&self) -> &'static str {
        "Scripted Simulator"
    }
}

/// Pulls the student's name out of a help prompt.
///
/// Pattern parts:
/// - `Student Name: ` - literal label
/// - `([^\n]+)` - capture group: rest of the line
fn extract_student_name(prompt: &str) -> String {
    let Ok(re) = Regex::new(r"Student Name: ([^\n]+)") else {
        return "Student".to_string();
    };

    re.captures(prompt)
        .and_then(|cap| cap.get(1))
        .map_or_else(|| "Student".to_string(), |m| m.as_str().trim().to_string())
}

/// Pulls the quoted student message out of a help prompt.
fn extract_message(prompt: &str) -> Option<String> {
    let re = Regex::new(r#"Student's Message/Question: "([^"]+)""#).ok()?;
    let cap = re.captures(prompt)?;
    Some(cap.get(1)?.as_str().trim().to_string())
}

/// Picks the scripted reply for a message.
///
/// Keyword classes are checked in order; the first hit wins.
fn scripted_reply(message: &str, student_name: &str) -> String {
    let lowered = message.to_lowercase();

    if lowered.contains("ts") || lowered.contains("typescript") {
        return format!(
            "Hi {student_name}! TypeScript is a programming language developed by \
             Microsoft. It's a superset of JavaScript that adds static typing, which \
             helps catch errors during development rather than at runtime. TypeScript \
             compiles to regular JavaScript and is widely used in large-scale \
             applications for better maintainability and developer experience. Would \
             you like me to explain any specific TypeScript feature?"
        );
    }

    if lowered.contains("sad") || lowered.contains("unhappy") || lowered.contains("depressed") {
        return format!(
            "I'm sorry to hear you're feeling sad, {student_name}. \u{1f614} Learning \
             can sometimes be overwhelming, but remember that it's okay to have \
             difficult days. Take a deep breath, maybe take a short break, and \
             remember that progress in learning is never linear. You're doing great \
             by reaching out! Is there something specific that's troubling you about \
             the lesson?"
        );
    }

    if lowered.contains("react") || lowered.contains("usestate") || lowered.contains("hook") {
        return format!(
            "Great question about React, {student_name}! React is a JavaScript \
             library for building user interfaces. It uses a component-based \
             architecture where you can create reusable UI pieces. useState is a \
             React hook that lets you add state to functional components - it's one \
             of the most commonly used hooks! Would you like a code example?"
        );
    }

    if lowered.contains("programming") || lowered.contains("code") || lowered.contains("develop") {
        return format!(
            "That's a great topic, {student_name}! Programming is the process of \
             writing instructions for computers to execute. It involves learning \
             languages like JavaScript, Python, or Java, understanding algorithms, \
             and solving problems. The key is to start with fundamentals and practice \
             regularly. What specific area of programming interests you?"
        );
    }

    if lowered.contains("learn") || lowered.contains("study") || lowered.contains("understand") {
        return format!(
            "Learning is a journey, {student_name}! The best approach is to break \
             complex topics into smaller parts, practice regularly, and don't be \
             afraid to make mistakes - they're part of the learning process. \
             Consistency is more important than intensity. What subject are you \
             currently learning?"
        );
    }

    if lowered.contains("feeling") || lowered.contains("how are you") {
        return format!(
            "Thanks for asking, {student_name}! I'm here to support your learning \
             journey. How are you feeling about your progress today? Remember, it's \
             normal to have ups and downs while learning new things."
        );
    }

    if lowered.contains("doubt") || lowered.contains("question") || lowered.contains("confus") {
        return format!(
            "I'm here to help with any doubts, {student_name}! Asking questions is \
             one of the best ways to learn. What specific concept or topic are you \
             finding challenging? I'll do my best to explain it clearly."
        );
    }

    format!(
        "Thank you for your question, {student_name}! \"{message}\" - that's an \
         interesting topic. As your learning assistant, I want to help you \
         understand this better. Could you tell me a bit more about what \
         specifically you'd like to know or what part is confusing you?"
    )
}
