//! System prompts, one per AI feature.

pub const SEARCH: &str = include_str!("prompts/search.md");
pub const SUMMARIZE: &str = include_str!("prompts/summarize.md");
pub const CONVERSATION_PREP: &str = include_str!("prompts/conversation_prep.md");
pub const SUGGEST_FOLLOW_UPS: &str = include_str!("prompts/suggest_follow_ups.md");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Collection;

    #[test]
    fn test_search_prompt_lists_every_allowed_field() {
        for table in Collection::all() {
            let line = SEARCH
                .lines()
                .find(|l| l.starts_with(&format!("- {}:", table)))
                .unwrap_or_else(|| panic!("no field line for {}", table));
            for field in table.text_fields() {
                assert!(line.contains(field.as_str()), "{} missing {}", table, field.as_str());
            }
            for field in table.date_fields() {
                assert!(line.contains(field.as_str()), "{} missing {}", table, field.as_str());
            }
        }
    }

    #[test]
    fn test_json_prompts_forbid_prose() {
        assert!(SEARCH.contains("exactly one JSON object"));
        assert!(SUGGEST_FOLLOW_UPS.contains("exactly one JSON object"));
    }
}
