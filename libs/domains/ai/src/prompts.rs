//! Prompt text sent to the chat deployment.

pub const REWRITE_SYSTEM_PROMPT: &str = "\
Generate a full-text search query for a SQL database based on a user question. \
Do not generate the whole SQL query; only generate the string to go inside the MATCH parameter for FTS5 indexes. \
Use SQL boolean operators if the user has been specific about what they want to exclude in the search. \
If the question is not in English, translate the question to English before generating the search query. \
If you cannot generate a search query, return just the number 0.";

/// (user question, expected keyword query) pairs replayed before the real question
pub const REWRITE_EXAMPLES: &[(&str, &str)] = &[
    (
        "Generate a search query for: a waterproof tent for two people",
        "waterproof tent two person",
    ),
    (
        "Generate a search query for: zapatos rojos, no zapatillas",
        "red shoes NOT sneakers",
    ),
    (
        "Generate a search query for: what is the weather like today?",
        "0",
    ),
];

pub fn rewrite_user_prompt(query: &str) -> String {
    format!("Generate a search query for: {}", query)
}

pub fn describe_system_prompt(language: &str) -> String {
    format!(
        "You are a retail catalog assistant. Describe the main product in the image \
         as a short search query of at most 15 words: product type, colour, material and style. \
         Reply in {} with the description only.",
        language
    )
}

pub const DESCRIBE_USER_PROMPT: &str = "Describe the product in this image.";
