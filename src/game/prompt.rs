use super::domain::{EvaluationContext, MODEL_CHANGE_MAX, MODEL_CHANGE_MIN, VIOLATION_SENTINEL};

const ROLE_FRAMING: &str = "You are the impartial arbiter of a religion-founding simulation. \
Each round the founder issues one policy decision and you judge how the follower count responds.";

const POLICY_RULES: &str = "Scoring rules:\n\
- Reward decisions that build trust, community, and sustainable growth.\n\
- Penalize coercion, fear-mongering, and short-sighted extraction.\n\
- Ordinary administrative decisions should score close to zero.";

const PROHIBITED_RULES: &str = "Prohibited acts: violence, incitement, fraud, extortion, and any \
decision endangering life or law. A prohibited decision must be scored with the violation value \
instead of a normal change.";

/// Assemble the single evaluation request for one decision.
///
/// Concatenation is deterministic and the decision text is passed through
/// untouched; any length policy belongs to the caller.
pub fn build_prompt(decision: &str, context: &EvaluationContext) -> String {
    let mut prompt = String::new();

    prompt.push_str(ROLE_FRAMING);
    prompt.push_str("\n\n");
    prompt.push_str(POLICY_RULES);
    prompt.push_str("\n\n");
    prompt.push_str(PROHIBITED_RULES);
    prompt.push_str("\n\nCurrent state:\n");
    prompt.push_str(&format!(
        "- Religion: {}\n- Round: {} of 10\n- Followers: {}\n",
        context.religion_name, context.round, context.followers
    ));
    prompt.push_str("\nThe founder's decision this round:\n");
    prompt.push_str(decision);
    prompt.push_str(&format!(
        "\n\nRespond with a single JSON object and nothing else:\n\
        {{\"change\": <integer between {MODEL_CHANGE_MIN} and {MODEL_CHANGE_MAX}, \
or {VIOLATION_SENTINEL} for a prohibited decision>, \
\"comment\": <one-sentence verdict>, \"tips\": [<up to three short suggestions>]}}"
    ));

    prompt
}
