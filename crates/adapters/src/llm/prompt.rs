//! Prompt construction and reply parsing shared by every provider

use audience_tagger_domain::{AudienceLabel, ClassificationRequest};

/// System persona for chat-style providers
pub const SYSTEM_PROMPT: &str = "You are a film and television audience analyst. \
You decide who a title was made for and answer with a single word.";

/// Build the classification prompt for one item
///
/// Missing fields are rendered as fixed placeholders so identical inputs
/// always produce the identical prompt.
pub fn build_classification_prompt(request: &ClassificationRequest) -> String {
    let year = request
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let rating = non_blank(request.rating.as_deref()).unwrap_or("Not Rated");
    let overview = non_blank(request.overview.as_deref()).unwrap_or("No overview available");
    let genres = request
        .genres
        .as_ref()
        .map(|g| {
            g.iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let mut prompt = String::new();

    prompt.push_str("Determine the primary target audience of the following title.\n\n");

    prompt.push_str("## Title Details\n");
    prompt.push_str(&format!("Title: {}\n", request.title.trim()));
    prompt.push_str(&format!("Year: {}\n", year));
    prompt.push_str(&format!("Content rating: {}\n", rating));
    prompt.push_str(&format!("Genres: {}\n", genres));
    prompt.push_str(&format!("Overview: {}\n\n", overview));

    prompt.push_str(
        r#"## Audiences
- kids: made primarily for children
- teens: made primarily for teenagers
- adults: made primarily for adults

## Guidance
- Target audience is not the same as content appropriateness. The rating says who may watch; you must decide who the title was made for.
- A title with a general or family rating can still be aimed at adults.
- Titles released before 1990 often carried general ratings while targeting adult audiences. Account for the era.

## Output Format
Respond with exactly one word: kids, teens, or adults.
"#,
    );

    prompt
}

/// Coerce free text from a model into an audience label
///
/// Checks run in a fixed order: kids/children, then teens/teenagers, then
/// adults/mature. Text that matches none of them, including empty text,
/// yields `Adults`.
pub fn parse_audience_label(response: &str) -> AudienceLabel {
    let normalized = response
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if normalized.contains("kids") || normalized.contains("children") {
        AudienceLabel::Kids
    } else if normalized.contains("teens") || normalized.contains("teenagers") {
        AudienceLabel::Teens
    } else {
        // "adults" / "mature" and unrecognised text share the same label
        AudienceLabel::Adults
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
