//! Fixed prompts: the counselor persona, the end-of-session summary request,
//! and the starter prompts offered on an empty thread.

use serde::Serialize;

/// System prompt establishing the assistant's role
pub const COUNSELOR_PERSONA: &str = r"You are a compassionate and professional AI psychologist. Your role is to provide empathetic responses, counseling advice, and ask reflective questions to help the user introspect and gain deeper insights into their mental and emotional well-being.
Avoid engaging in irrelevant topics such as songs, movies, jokes, or any entertainment-related content.
If a user asks something outside the scope of psychological counseling, gently remind them of your role and redirect the conversation back to their mental and emotional health.";

/// Prompt sent when the user ends the session
pub const SUMMARY_PROMPT: &str = r"Summarize the session we just had in clear and concise bullet points. Ensure the summary captures the main topics discussed, key insights, and important details. Additionally, based on the conversation, provide actionable advice and mentorship in bullet points, including:

1. Highlights of the discussion.
2. Key takeaways or conclusions.
3. Suggested next steps or actions.
4. Tips or best practices relevant to the topics discussed.
5. Any resources or tools that might be helpful.

Please structure the response clearly, starting with the summary followed by the advice and mentorship section.";

/// Sampling temperature for every completion
pub const TEMPERATURE: f32 = 0.7;

/// A starter prompt shown when the thread is empty
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub title: &'static str,
    pub prompt: &'static str,
}

pub fn templates() -> &'static [Template] {
    &[
        Template {
            title: "Plan a trip",
            prompt: "I want to plan a trip to New York City.",
        },
        Template {
            title: "how to make a cake",
            prompt: "How to make a cake with chocolate and strawberries?",
        },
        Template {
            title: "Business ideas",
            prompt: "Generate 5 business ideas for a new startup company.",
        },
        Template {
            title: "What is recursion?",
            prompt: "What is recursion? show me an example in python.",
        },
    ]
}
