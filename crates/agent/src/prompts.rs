//! Prompt templates for the evaluator and answer models.

/// Prompt for the first search query of a question.
pub fn initial_query(user_query: &str) -> String {
    format!(
        "Given this user question: {user_query}\n\n\
         Generate a focused search query to find relevant information on the web. \
         Output ONLY the search query text without quotes or any other formatting. \
         Just the plain search terms.\n\n\
         Search query:"
    )
}

/// Prompt for a follow-up query after an unsatisfying search.
pub fn refined_query(user_query: &str, previous_query: &str, previous_evaluation: &str) -> String {
    format!(
        "Previous search did not provide sufficient information.\n\
         Query used: {previous_query}\n\n\
         User question: {user_query}\n\
         Previous evaluation: {previous_evaluation}\n\n\
         Generate a NEW, more specific search query. \
         Output ONLY the search query text without quotes or any other formatting. \
         Just the plain search terms.\n\n\
         Search query:"
    )
}

/// Prompt asking the evaluator to grade the evidence gathered so far.
///
/// The two-line response format is what [`crate::confidence`] parses.
pub fn evaluation(user_query: &str, formatted_results: &str, accumulated: &str) -> String {
    format!(
        "User question: {user_query}\n\n\
         Search results:\n{formatted_results}\n\n\
         All previous context:\n{accumulated}\n\n\
         Evaluate if we have enough information to answer the question. \
         Respond ONLY in this format:\n\
         CONFIDENCE: [number from 0-100]\n\
         EXPLANATION: [brief explanation]"
    )
}

/// The single user turn sent to the answer model on the search path.
pub fn grounded_answer(user_query: &str, evidence: &str) -> String {
    format!(
        "User question: {user_query}\n\n\
         Based on the following search results, provide a comprehensive, accurate answer:\n\n\
         {evidence}\n\n\
         Important: Use the search results to provide factual, up-to-date information. \
         Cite sources when possible."
    )
}

/// Normalize a generated query: surrounding whitespace and quotes removed.
pub fn clean_query(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '\u{201c}' | '\u{201d}'))
        .trim()
        .to_string()
}
