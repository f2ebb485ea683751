//! Prompt templates for the hosted model.

/// Collection of prompts used for answering, quizzing and grading.
pub struct Prompts;

impl Prompts {
    /// Answer a question from the document only.
    pub fn answer(context: &str, question: &str) -> String {
        format!(
            r#"You are a research assistant. Answer based only on the document below:

DOCUMENT:
"""
{context}
"""

Q: {question}
A:"#
        )
    }

    /// Ask for three numbered comprehension questions.
    pub fn generate_questions(context: &str) -> String {
        format!(
            r#"Generate 3 logic-based or comprehension questions from this document:

"""
{context}
"""

Return the questions numbered as 1., 2., 3."#
        )
    }

    /// Grade a user's answer against the document.
    pub fn evaluate(context: &str, question: &str, answer: &str) -> String {
        format!(
            r#"Evaluate the user's answer based only on this document:

"""
{context}
"""

Question: {question}
Answer: {answer}

Give a short evaluation like 'Correct', 'Partially correct', or 'Incorrect' with a one-line justification."#
        )
    }
}
