//! Fixed lexical/regex pattern set, one group per entity type, each with a
//! base confidence in [0.7, 0.95] (§4.3 step 1).

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::EntityType;

use super::Candidate;

struct PatternSet {
    entity_type: EntityType,
    regex: Regex,
    confidence: f32,
}

fn pattern_sets() -> &'static Vec<PatternSet> {
    static SETS: OnceLock<Vec<PatternSet>> = OnceLock::new();
    SETS.get_or_init(|| {
        vec![
            PatternSet {
                entity_type: EntityType::Symptom,
                regex: Regex::new(
                    r"(?i)\b(chest pain|shortness of breath|fever|fatigue|nausea|dizziness|headache|cough|vomiting|abdominal pain|back pain)\b",
                )
                .unwrap(),
                confidence: 0.8,
            },
            PatternSet {
                entity_type: EntityType::Condition,
                regex: Regex::new(
                    r"(?i)\b(hypertension|diabetes mellitus|diabetes|asthma|pneumonia|copd|atrial fibrillation|coronary artery disease|heart failure|stroke)\b",
                )
                .unwrap(),
                confidence: 0.85,
            },
            PatternSet {
                entity_type: EntityType::Medication,
                regex: Regex::new(
                    r"(?i)\b(aspirin|metformin|lisinopril|atorvastatin|albuterol|insulin|warfarin|amoxicillin|ibuprofen|acetaminophen)\b",
                )
                .unwrap(),
                confidence: 0.9,
            },
            PatternSet {
                entity_type: EntityType::Procedure,
                regex: Regex::new(
                    r"(?i)\b(chest x-ray|ct scan|mri|echocardiogram|colonoscopy|biopsy|ekg|electrocardiogram|blood test|ultrasound)\b",
                )
                .unwrap(),
                confidence: 0.85,
            },
            PatternSet {
                entity_type: EntityType::BodyPart,
                regex: Regex::new(
                    r"(?i)\b(chest|abdomen|lung|heart|liver|kidney|spine|knee|shoulder|head)\b",
                )
                .unwrap(),
                confidence: 0.7,
            },
            PatternSet {
                entity_type: EntityType::Temporal,
                regex: Regex::new(
                    r"(?i)\b(today|yesterday|last week|last month|\d+ (?:days?|weeks?|months?|years?) ago|since \d{4})\b",
                )
                .unwrap(),
                confidence: 0.75,
            },
        ]
    })
}

/// Run every pattern against `text`, lowercase-normalizing matched spans
/// (§4.3 step 2) while preserving the original byte offsets for dedup.
pub fn match_all(text: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    for set in pattern_sets() {
        for m in set.regex.find_iter(text) {
            out.push(Candidate {
                text: m.as_str().to_lowercase(),
                entity_type: set.entity_type,
                confidence: set.confidence,
                span: (m.start(), m.end()),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_vocabulary_across_types() {
        let text = "Patient has hypertension and chest pain, prescribed lisinopril, scheduled for a chest x-ray.";
        let candidates = match_all(text);
        let types: Vec<EntityType> = candidates.iter().map(|c| c.entity_type).collect();
        assert!(types.contains(&EntityType::Condition));
        assert!(types.contains(&EntityType::Symptom));
        assert!(types.contains(&EntityType::Medication));
        assert!(types.contains(&EntityType::Procedure));
    }

    #[test]
    fn unmatched_text_yields_no_candidates() {
        assert!(match_all("the weather is pleasant today in the park").len() <= 1);
    }
}
