use serde_json::Value;

use crate::models::Differential;
use crate::pipeline::llm::GenerationRequest;

pub const RANKING_SYSTEM_PROMPT: &str = r#"
You are assisting a physician with differential diagnosis ordering. You are
given candidate diagnoses that were already ranked by a rule-based engine,
together with the findings that support each one.

RULES:
1. Reorder ONLY the diagnoses you are given. Never add new ones.
2. Do not output probabilities, explanations or advice.
3. Output a JSON object: {"ranking": ["diagnosis 1", "diagnosis 2", ...]}
"#;

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"
You are a clinical documentation assistant. Rephrase the encounter summary
you are given into fluent clinical prose for a case sheet.

RULES:
1. Keep every fact, value and unit exactly as given.
2. NEVER add findings, diagnoses, advice or interpretation.
3. Output plain text only, at most five sentences.
"#;

pub fn ranking_request(differentials: &[Differential]) -> GenerationRequest {
    let mut candidates = String::new();
    for (i, d) in differentials.iter().enumerate() {
        candidates.push_str(&format!(
            "{}. {} (p={:.2}; findings: {})\n",
            i + 1,
            d.diagnosis,
            d.probability,
            d.supporting_features.join(", ")
        ));
    }

    GenerationRequest::json(
        RANKING_SYSTEM_PROMPT,
        format!("<candidates>\n{candidates}</candidates>\n\nReturn the ranking JSON."),
    )
}

pub fn summary_request(summary: &str) -> GenerationRequest {
    GenerationRequest::text(
        SUMMARY_SYSTEM_PROMPT,
        format!("<summary>\n{summary}\n</summary>"),
    )
}

/// Diagnosis names from a ranking response: a bare JSON array, or the
/// first array inside a JSON object. Fenced blocks are unwrapped.
pub fn parse_ranking(response: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(unfence(response)).ok()?;
    let list = match value {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().find_map(|(_, v)| match v {
            Value::Array(items) => Some(items),
            _ => None,
        })?,
        _ => return None,
    };

    let names: Vec<String> = list
        .into_iter()
        .filter_map(|item| item.as_str().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect();
    (!names.is_empty()).then_some(names)
}

fn unfence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let body = &trimmed[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_is_parsed() {
        let names = parse_ranking(r#"["pneumonia", "asthma"]"#).unwrap();
        assert_eq!(names, vec!["pneumonia", "asthma"]);
    }

    #[test]
    fn object_wrapper_is_parsed() {
        let names = parse_ranking(r#"{"ranking": ["asthma", " pneumonia "]}"#).unwrap();
        assert_eq!(names, vec!["asthma", "pneumonia"]);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let names = parse_ranking("Here:\n```json\n[\"dengue fever\"]\n```").unwrap();
        assert_eq!(names, vec!["dengue fever"]);
    }

    #[test]
    fn prose_or_empty_list_is_rejected() {
        assert!(parse_ranking("I think pneumonia is most likely").is_none());
        assert!(parse_ranking("[]").is_none());
        assert!(parse_ranking(r#"{"ranking": "pneumonia"}"#).is_none());
    }

    #[test]
    fn ranking_prompt_lists_candidates() {
        let d = Differential {
            diagnosis: "pneumonia".into(),
            code: None,
            probability: 0.42,
            prior: 0.05,
            supporting_features: vec!["fever".into(), "cough".into()],
            recommended_investigations: vec![],
            red_flags: vec![],
            urgency: crate::models::Urgency::Routine,
        };
        let request = ranking_request(&[d]);
        assert!(request.structured);
        assert!(request.prompt.contains("1. pneumonia (p=0.42; findings: fever, cough)"));
    }
}
