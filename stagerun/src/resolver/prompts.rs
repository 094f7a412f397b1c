//! Prompt templates for the complaint-resolution stages.
//!
//! Each template names the section header its answer must start with;
//! [`ResolutionSummary`](super::ResolutionSummary) relies on the evaluator's
//! two headers.

/// Header the evaluator's urgency section starts with.
pub const URGENCY_HEADER: &str = "URGENCY_REEVALUATION:";
/// Header the evaluator's high-priority tracking section starts with.
pub const HIGH_PRIORITY_HEADER: &str = "HIGH_PRIORITY_STATE:";

/// Phase 1: assign one category per complaint.
#[must_use]
pub fn categorizer_prompt(complaints: &str) -> String {
    format!(
        "Phase 1: Complaint Categorization\n\
         Role: Categorizer\n\n\
         Assign exactly one primary category to each complaint, choosing from: \
         Billing, Technical Issue, Service Delay, Product Defect, Account / Access, \
         Policy / Refund, Customer Experience.\n\n\
         Answer in this format:\n\
         CATEGORIZATION:\n\
         <complaint id> → <category>\n\n\
         Complaints:\n{complaints}\n"
    )
}

/// Phase 2: rank urgency using the categorization.
#[must_use]
pub fn prioritizer_prompt(complaints: &str, categorization: &str) -> String {
    format!(
        "Phase 2: Priority Assessment\n\
         Role: Prioritizer\n\n\
         Complaints:\n{complaints}\n\n\
         Categorization:\n{categorization}\n\n\
         Assign Low, Medium, High or Critical to each complaint based on customer \
         impact, reputational risk, time sensitivity and legal or financial exposure.\n\n\
         Answer in this format:\n\
         PRIORITIZATION:\n\
         <complaint id> → <priority>\n"
    )
}

/// Phase 3: draft a reply per complaint.
#[must_use]
pub fn drafter_prompt(complaints: &str, priorities: &str) -> String {
    format!(
        "Phase 3: Response Drafting\n\
         Role: Communications\n\n\
         Complaints:\n{complaints}\n\n\
         Priorities:\n{priorities}\n\n\
         Write a clear, empathetic reply for each complaint. Match the tone to the \
         severity and make no promises that cannot be kept.\n\n\
         Answer in this format:\n\
         RESPONSE_TEMPLATES:\n\
         <complaint id> →\n<reply>\n"
    )
}

/// Phase 4: recommend operational follow-up.
#[must_use]
pub fn planner_prompt(complaints: &str, drafts: &str, priorities: &str) -> String {
    format!(
        "Phase 4: Recommended Next Actions\n\
         Role: Operations\n\n\
         Complaints:\n{complaints}\n\n\
         Drafts:\n{drafts}\n\n\
         Priorities:\n{priorities}\n\n\
         Recommend concrete follow-up steps beyond the reply (escalation, refund, \
         technical investigation, follow-up timeline), in line with each priority.\n\n\
         Answer in this format:\n\
         RECOMMENDED_ACTIONS:\n\
         <complaint id> → <action plan>\n"
    )
}

/// Phases 5 and 6: reassess urgency and list what still needs tracking.
#[must_use]
pub fn evaluator_prompt(history: &str) -> String {
    format!(
        "Phase 5 & 6: Urgency Re-evaluation and State Tracking\n\
         Role: Risk and Compliance\n\n\
         Results of the previous phases:\n{history}\n\n\
         1. Reassess each complaint's urgency now that replies are drafted \
         (Reduced, Unchanged or Increased) and justify the change.\n\
         2. List every complaint that is still High or Critical.\n\n\
         Answer in this format:\n\
         {URGENCY_HEADER}\n\
         <complaint id> → <updated urgency> + <justification>\n\n\
         {HIGH_PRIORITY_HEADER}\n\
         - Complaint ID:\n  Category:\n  Current Urgency:\n  Pending Actions:\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_their_inputs() {
        assert!(categorizer_prompt("C1").contains("C1"));

        let p = prioritizer_prompt("C1", "CAT");
        assert!(p.contains("C1") && p.contains("CAT") && p.contains("PRIORITIZATION:"));

        let p = drafter_prompt("C1", "PRIO");
        assert!(p.contains("PRIO") && p.contains("RESPONSE_TEMPLATES:"));

        let p = planner_prompt("C1", "DRAFT", "PRIO");
        assert!(p.contains("DRAFT") && p.contains("PRIO"));
    }

    #[test]
    fn test_evaluator_prompt_names_both_headers() {
        let p = evaluator_prompt("Categorization: x");
        assert!(p.contains(URGENCY_HEADER));
        assert!(p.contains(HIGH_PRIORITY_HEADER));
        assert!(p.contains("Categorization: x"));
    }
}
