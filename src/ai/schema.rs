// src/ai/schema.rs
//
// The single gate between "arbitrary AI text" and data persistence may
// trust. Cheap omissions (a missing description, absent searchStrings)
// are repaired; structural violations (missing title, out-of-range
// correctIndex) reject.

use serde_json::Value;

use super::AiError;

/// A roadmap that satisfies every shape invariant persistence relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRoadmap {
    pub title: String,
    pub description: String,
    pub weeks: Vec<GeneratedWeek>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWeek {
    pub title: String,
    pub description: String,
    pub goals: String,
    pub topics: Vec<GeneratedTopic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTopic {
    pub name: String,
    pub description: String,
    pub estimated_hours: f64,
    pub why_this_first: String,
    pub search_strings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuiz {
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: i64,
    pub explanation: Option<String>,
}

fn malformed(msg: impl Into<String>) -> AiError {
    AiError::Malformed(msg.into())
}

/// A field the structure cannot do without: must be a non-empty string.
fn required_str(obj: &Value, field: &str, ctx: &str) -> Result<String, AiError> {
    match obj[field].as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(malformed(format!("{}: missing required field '{}'", ctx, field))),
    }
}

/// A cosmetic field: absent or wrong-typed becomes an empty string.
fn optional_str(obj: &Value, field: &str) -> String {
    obj[field].as_str().unwrap_or_default().trim().to_string()
}

/// Accepts a JSON number or a numeric string ("2.5"). Anything else is None.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn validate_roadmap(value: &Value) -> Result<GeneratedRoadmap, AiError> {
    let title = required_str(value, "title", "roadmap")?;
    let description = optional_str(value, "description");

    let raw_weeks = value["weeks"]
        .as_array()
        .filter(|w| !w.is_empty())
        .ok_or_else(|| malformed("roadmap: 'weeks' must be a non-empty array"))?;

    let mut weeks = Vec::with_capacity(raw_weeks.len());
    for (wi, raw_week) in raw_weeks.iter().enumerate() {
        let ctx = format!("week {}", wi + 1);
        let week_title = required_str(raw_week, "title", &ctx)?;
        let goals = required_str(raw_week, "goals", &ctx)?;
        let description = optional_str(raw_week, "description");

        let raw_topics = raw_week["topics"]
            .as_array()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| malformed(format!("{}: 'topics' must be a non-empty array", ctx)))?;

        let mut topics = Vec::with_capacity(raw_topics.len());
        for (ti, raw_topic) in raw_topics.iter().enumerate() {
            let tctx = format!("week {} topic {}", wi + 1, ti + 1);
            let name = required_str(raw_topic, "name", &tctx)?;
            let why_this_first = required_str(raw_topic, "whyThisFirst", &tctx)?;

            let estimated_hours = coerce_number(&raw_topic["estimatedHours"])
                .filter(|h| *h > 0.0)
                .ok_or_else(|| {
                    malformed(format!("{}: 'estimatedHours' must be a positive number", tctx))
                })?;

            // Missing searchStrings is tolerated; non-string elements are
            // dropped rather than failing the whole roadmap.
            let search_strings = raw_topic["searchStrings"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default();

            topics.push(GeneratedTopic {
                name,
                description: optional_str(raw_topic, "description"),
                estimated_hours,
                why_this_first,
                search_strings,
            });
        }

        weeks.push(GeneratedWeek {
            title: week_title,
            description,
            goals,
            topics,
        });
    }

    Ok(GeneratedRoadmap {
        title,
        description,
        weeks,
    })
}

pub fn validate_quiz(value: &Value) -> Result<GeneratedQuiz, AiError> {
    // Some models return a bare array instead of {"questions": [...]}.
    let raw_questions = value["questions"]
        .as_array()
        .or_else(|| value.as_array())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| malformed("quiz: 'questions' must be a non-empty array"))?;

    let mut questions = Vec::with_capacity(raw_questions.len());
    for (qi, raw) in raw_questions.iter().enumerate() {
        let ctx = format!("question {}", qi + 1);
        let question = required_str(raw, "question", &ctx)?;

        let options: Vec<String> = raw["options"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        if options.len() < 2 {
            return Err(malformed(format!("{}: 'options' must have at least 2 entries", ctx)));
        }

        // Out of range is corruption, not a cosmetic slip. Clamping would
        // silently produce a wrong-but-plausible quiz, so reject.
        let correct_index = raw["correctIndex"]
            .as_i64()
            .ok_or_else(|| malformed(format!("{}: 'correctIndex' must be an integer", ctx)))?;
        if correct_index < 0 || correct_index as usize >= options.len() {
            return Err(malformed(format!(
                "{}: 'correctIndex' {} out of range for {} options",
                ctx,
                correct_index,
                options.len()
            )));
        }

        let explanation = raw["explanation"]
            .as_str()
            .map(|s| s.to_string())
            .filter(|s| !s.trim().is_empty());

        questions.push(GeneratedQuestion {
            question,
            options,
            correct_index,
            explanation,
        });
    }

    Ok(GeneratedQuiz { questions })
}
