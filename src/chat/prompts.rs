use super::repo_types::Phase;

const ONBOARDING_SYSTEM_PROMPT: &str = r#"You are a friendly assistant for a meal planning app. Run a short, personal onboarding to learn about the user and their household.

Read the conversation history first. Never ask for something that has already been answered.

Cover these areas, one question at a time:
1. Name: "What's your name?"
2. Household: how many people, their names, ages for any children (ages are only needed for kids), and any dietary restrictions.
3. Cooking: skill level (beginner, intermediate, or advanced), how much time they usually have, and any notable kitchen equipment.
4. Food preferences: favourite cuisines and foods they avoid.

If the user answers several areas at once, acknowledge all of it and only ask for what is still missing. If they say they already told you, apologise and use what they said.

Once you know the household members, cooking skill and food preferences, reply with a short friendly wrap-up and include the word PROFILE_COMPLETE."#;

const WEEKLY_PLANNING_SYSTEM_PROMPT: &str = r#"You are a warm, efficient meal planning assistant. The household profile and food preferences are already known. Focus ONLY on this week's schedule:
- busy days or special events
- nights no dinner is needed (eating out, travelling, parties)
- nights that need extra food (guests, leftovers)
- specific meal requests for this week

Keep it short, two or three questions at most. Do not ask about general food preferences, dietary restrictions or cooking skill.

Once you understand the week, summarise it in one or two sentences and include the word WEEK_UNDERSTOOD."#;

const ONBOARDING_EXTRACTION_PROMPT: &str = r#"You are a precise data extraction agent. Analyse the completed onboarding conversation and extract structured data.

REQUIRED FIELDS:
- members: array of household members with name, age (null for adults), is_adult, dietary_restrictions
- cooking_skill: "beginner", "intermediate" or "advanced"

OPTIONAL FIELDS:
- max_cooking_time: maximum cooking time in minutes if mentioned (default 45)
- favorite_cuisines: inferred from food mentions ("love pasta" -> "Italian")
- dislikes: specific foods or ingredients to avoid
- kitchen_equipment: appliances or tools mentioned

RULES:
- Children get their exact age; adults get age null.
- is_adult is true when no age is given or age >= 18.
- dietary_restrictions covers allergies and diets (vegetarian, vegan, gluten-free, ...).

Return ONLY valid JSON, no other text:
{
  "members": [{"name": "string", "age": null, "is_adult": true, "dietary_restrictions": []}],
  "cooking_skill": "beginner|intermediate|advanced",
  "max_cooking_time": 45,
  "favorite_cuisines": [],
  "dislikes": [],
  "kitchen_equipment": []
}"#;

const ONBOARDING_WELCOME: &str = "Hi! I'm here to help you set up your meal planning profile.\n\nI'll ask a few quick questions, it should take less than two minutes.\n\nFirst question: what's your name?";

const WEEKLY_PLANNING_WELCOME: &str = "Great! Let's plan your dinners for the week ahead.\n\nTell me about your upcoming week: any busy days where you need quick meals, special events, or nights you won't need dinner (eating out, travelling, etc.)?";

impl Phase {
    /// Sentinel the assistant emits once it has everything it needs.
    pub fn marker(&self) -> &'static str {
        match self {
            Phase::Onboarding => "PROFILE_COMPLETE",
            Phase::WeeklyPlanning => "WEEK_UNDERSTOOD",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Phase::Onboarding => ONBOARDING_SYSTEM_PROMPT,
            Phase::WeeklyPlanning => WEEKLY_PLANNING_SYSTEM_PROMPT,
        }
    }

    pub fn welcome(&self) -> &'static str {
        match self {
            Phase::Onboarding => ONBOARDING_WELCOME,
            Phase::WeeklyPlanning => WEEKLY_PLANNING_WELCOME,
        }
    }
}

pub fn onboarding_extraction_prompt() -> &'static str {
    ONBOARDING_EXTRACTION_PROMPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_mention_their_own_marker_only() {
        for phase in [Phase::Onboarding, Phase::WeeklyPlanning] {
            assert!(phase.system_prompt().contains(phase.marker()));
            assert!(!phase.welcome().contains(phase.marker()));
        }
        assert!(!Phase::Onboarding.system_prompt().contains("WEEK_UNDERSTOOD"));
    }
}
