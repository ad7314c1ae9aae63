// src/ai/prompt.rs

use crate::models::roadmap::CreateRoadmapRequest;

/// Builds the roadmap-generation prompt, optionally augmented with
/// research prose gathered beforehand.
pub fn roadmap_prompt(input: &CreateRoadmapRequest, research: &str) -> String {
    let research_section = if research.is_empty() {
        String::new()
    } else {
        format!(
            "\n\n**Research Data (from web search - use this to inform your roadmap):**\n{}\n\n",
            research
        )
    };

    let research_point = if research.is_empty() {
        ""
    } else {
        "\n6. Incorporates the researched resources and current best practices from the research data above"
    };

    format!(
        r#"You are an expert learning path designer. Create a detailed, personalized learning roadmap based on the following inputs:

**Current Skills:** {current_skills}
**Target Goal:** {target_goal}
**Available Time:** {hours_per_week} hours per week
**Duration:** {total_weeks} weeks
{research_section}
Generate a structured learning path that:
1. Builds on existing knowledge progressively
2. Prioritizes foundational concepts before advanced topics
3. Includes practical projects and exercises
4. Provides reasoning for topic ordering (prerequisites)
5. Includes search strings for finding quality resources{research_point}

Return a JSON object with this exact structure:
{{
  "title": "Descriptive title for the learning path",
  "description": "Brief overview of what the learner will achieve",
  "weeks": [
    {{
      "title": "Week title",
      "description": "What this week covers",
      "goals": "What the learner should be able to do after this week",
      "topics": [
        {{
          "name": "Topic name",
          "description": "Brief description of what to learn",
          "estimatedHours": 2.5,
          "whyThisFirst": "Explanation of why this topic comes at this point in the curriculum",
          "searchStrings": ["search query 1", "search query 2", "search query 3"]
        }}
      ]
    }}
  ]
}}

Make sure:
- Total hours across all topics roughly equals {total_hours} hours
- Distribute topics across exactly {total_weeks} weeks with 2-4 topics per week
- Search strings are specific and would yield high-quality educational resources
- The progression is logical and builds upon previous weeks

Return ONLY valid JSON, no additional text or markdown formatting."#,
        current_skills = input.current_skills,
        target_goal = input.target_goal,
        hours_per_week = input.hours_per_week,
        total_weeks = input.total_weeks,
        research_section = research_section,
        research_point = research_point,
        total_hours = input.hours_per_week * input.total_weeks,
    )
}

/// Builds the quiz-generation prompt for one week's topics.
pub fn quiz_prompt(week_title: &str, topics: &[(String, String)]) -> String {
    let topic_list = topics
        .iter()
        .map(|(name, description)| format!("- {}: {}", name, description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Generate a quiz with 5 multiple-choice questions to test understanding of these topics from "{week_title}":

{topic_list}

Return a JSON object with this exact structure:
{{
  "questions": [
    {{
      "question": "The question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctIndex": 0,
      "explanation": "Brief explanation of why this is the correct answer"
    }}
  ]
}}

Make questions:
- Test conceptual understanding, not memorization
- Include a mix of difficulty levels
- Have plausible but clearly wrong distractors
- Cover different topics from the week

Return ONLY valid JSON, no additional text or markdown formatting."#,
    )
}
