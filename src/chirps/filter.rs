use std::sync::OnceLock;

use regex::Regex;

use crate::error::AppError;

pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

fn profanity() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let words: Vec<String> = PROFANE_WORDS.iter().map(|w| regex::escape(w)).collect();
        Regex::new(&format!(r"(?i)\b(?:{})\b", words.join("|"))).expect("static pattern compiles")
    })
}

pub fn validate_body(body: &str) -> Result<(), AppError> {
    if body.trim().is_empty() {
        return Err(AppError::ValidationError("Chirp is empty".into()));
    }
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(AppError::ValidationError("Chirp is too long".into()));
    }
    Ok(())
}

/// Masks profane words, matched case-insensitively on word boundaries.
pub fn clean_body(body: &str) -> String {
    profanity().replace_all(body, MASK).into_owned()
}
