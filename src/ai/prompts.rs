use crate::analysis::types::AnalysisReport;
use crate::entities::Listing;

/// Text representation of a listing's metadata, used when no script is
/// available and as framing when one is.
pub fn listing_text(listing: &Listing) -> String {
    let mut parts = vec![format!("Title: {}", listing.title)];
    if let Some(tagline) = &listing.tagline {
        parts.push(format!("Tagline: {}", tagline));
    }
    parts.push(format!("Genre: {}", listing.genre));
    parts.push(format!("Format: {}", listing.format));
    if let Some(logline) = &listing.logline {
        parts.push(format!("Logline: {}", logline));
    }
    parts.push(format!("\nDescription:\n{}", listing.description));
    if !listing.themes.is_empty() {
        parts.push(format!("Themes: {}", listing.themes.join(", ")));
    }
    if let Some(audience) = &listing.target_audience {
        parts.push(format!("Target Audience: {}", audience));
    }
    if !listing.comparables.is_empty() {
        parts.push(format!("Comparables: {}", listing.comparables.join(", ")));
    }
    parts.join("\n")
}

/// Prompt for the commercial analysis. The reply must be a JSON object
/// matching [`AnalysisReport`].
pub fn analysis_prompt(listing: &Listing, script_text: Option<&str>) -> String {
    let material = match script_text {
        Some(script) => format!("**Script Text:**\n{}", script),
        None => format!("**Listing Details:**\n{}", listing_text(listing)),
    };

    format!(
        r#"You are an experienced script analyst and IP evaluator. Analyze this material and provide a professional assessment.

**Title:** {title}
**Genre:** {genre}
**Format:** {format}

{material}

Return ONLY a JSON object with these keys:
- commercial_score (integer 1-10)
- executive_summary (string, 2-3 paragraphs)
- strengths (array of 3-5 strings)
- improvements (array of 2-3 strings)
- comparables (array of 3-5 strings naming similar successful titles)
- target_audience (string)
- budget_range (string: indie/mid/high)
"#,
        title = listing.title,
        genre = listing.genre,
        format = listing.format,
        material = material,
    )
}

/// Prompt for a markdown pitch one-pager.
pub fn one_pager_prompt(listing: &Listing, report: Option<&AnalysisReport>) -> String {
    let mut prompt = format!(
        r#"Write a professional one-page pitch document in markdown for the following IP listing. Use this structure: a title heading, a one-sentence logline in bold, an Overview section, a Why Now section, and a Key Selling Points section.

{}
"#,
        listing_text(listing),
    );

    if let Some(report) = report {
        prompt.push_str(&format!(
            "\nIncorporate these assessment findings:\nSummary: {}\nStrengths: {}\n",
            report.executive_summary,
            report.strengths.join("; "),
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AnalysisStatus, ListingStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn listing() -> Listing {
        Listing {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Orbital Decay".to_string(),
            tagline: Some("Gravity always wins".to_string()),
            description: "A stranded salvage crew races a collapsing orbit.".to_string(),
            slug: "orbital-decay-a1b2c3".to_string(),
            genre: "sci-fi".to_string(),
            format: "feature".to_string(),
            logline: None,
            themes: vec!["survival".to_string()],
            target_audience: None,
            comparables: vec!["Gravity".to_string()],
            rights_holder: None,
            available_rights: vec![],
            script_url: None,
            poster_url: None,
            status: ListingStatus::Published,
            ai_analysis_status: AnalysisStatus::NotStarted,
            ai_score: None,
            ai_strengths: vec![],
            ai_improvements: vec![],
            featured: false,
            view_count: 0,
            save_count: 0,
            inquiry_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn metadata_prompt_carries_listing_fields() {
        let prompt = analysis_prompt(&listing(), None);
        assert!(prompt.contains("Orbital Decay"));
        assert!(prompt.contains("sci-fi"));
        assert!(prompt.contains("Listing Details"));
        assert!(prompt.contains("commercial_score"));
    }

    #[test]
    fn script_prompt_prefers_script_text() {
        let prompt = analysis_prompt(&listing(), Some("FADE IN: a derelict station."));
        assert!(prompt.contains("Script Text"));
        assert!(prompt.contains("FADE IN"));
        assert!(!prompt.contains("Listing Details"));
    }

    #[test]
    fn one_pager_prompt_includes_findings_when_present() {
        let report = AnalysisReport {
            commercial_score: 8,
            executive_summary: "Tight, commercial survival story.".to_string(),
            strengths: vec!["contained setting".to_string()],
            improvements: vec![],
            comparables: vec![],
            target_audience: None,
            budget_range: None,
        };
        let with = one_pager_prompt(&listing(), Some(&report));
        assert!(with.contains("Tight, commercial survival story."));

        let without = one_pager_prompt(&listing(), None);
        assert!(!without.contains("assessment findings"));
    }
}
