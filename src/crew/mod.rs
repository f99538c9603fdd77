//! The sequential analysis crew.
//!
//! Three role-scoped agents run in a fixed order, each producing its own
//! Markdown report. Later agents receive earlier outputs as context, so the
//! executive summary is grounded in the cash-flow and risk analyses.

pub mod llm;
pub mod pipeline;

pub use llm::{LlmClient, LlmConfig};
pub use pipeline::run_pipeline;

/// A role-scoped agent definition.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

/// One pipeline stage: an agent plus the task it performs.
#[derive(Debug, Clone)]
pub struct PipelineTask {
    pub agent: AgentSpec,
    /// Section title used in the combined report.
    pub title: &'static str,
    /// What the agent is asked to do.
    pub description: &'static str,
    /// Shape of the answer the agent is told to produce.
    pub expected_output: &'static str,
    /// Filename the output is written to, inside the output directory.
    pub output_file: &'static str,
    /// Indices of earlier tasks whose outputs are fed in as context.
    pub context: &'static [usize],
}

/// The default three-agent pipeline, in execution order.
pub fn default_pipeline() -> Vec<PipelineTask> {
    vec![
        PipelineTask {
            agent: AgentSpec {
                name: "Cash Flow Analyst",
                role: "Cash Flow Analyst",
                goal: "Analyze financial transactions and cash flow",
                backstory: "Expert in cash flow analysis for small and medium businesses, \
                            focused on liquidity and collection patterns",
            },
            title: "Cash Flow Analysis",
            description: "Analyze the cash flow data below. Cover the current cash position, \
                          inflow and outflow composition, the largest customers and vendors, \
                          and how the payment-status mix affects liquidity.",
            expected_output: "Detailed cash flow analysis with specific customer names, \
                              amounts, and metrics from the data provided",
            output_file: "cash_flow_analysis.md",
            context: &[],
        },
        PipelineTask {
            agent: AgentSpec {
                name: "Risk Analyst",
                role: "Credit Risk Analyst",
                goal: "Assess financial health and identify risks",
                backstory: "Expert in financial risk assessment, specialized in receivables \
                            exposure and counterparty concentration",
            },
            title: "Risk Assessment",
            description: "Assess the financial risks in the data below. Identify which \
                          customers and amounts are overdue, which payables are pending, \
                          concentration risk among top counterparties, and the most urgent \
                          collection actions.",
            expected_output: "Risk assessment with specific customer names, exact amounts \
                              owed or pending, and prioritized actions",
            output_file: "risk_assessment.md",
            context: &[0],
        },
        PipelineTask {
            agent: AgentSpec {
                name: "Communications Manager",
                role: "Communications & Action Manager",
                goal: "Draft communications and compile reports",
                backstory: "Expert in financial communications who turns analysis into an \
                            executive report the business owner can act on",
            },
            title: "Executive Summary",
            description: "Create an executive financial health report from the data and the \
                          prior analyses. Summarize the cash position, the key risks, and a \
                          concrete action list, including payment reminders worth sending.",
            expected_output: "Executive report with real customer names, specific amounts, \
                              and actionable recommendations based on actual financial data",
            output_file: "financial_health_report.md",
            context: &[0, 1],
        },
    ]
}

/// Build the system prompt for an agent.
pub fn system_prompt(agent: &AgentSpec) -> String {
    format!(
        "You are {role}. {backstory}.\nYour goal: {goal}.",
        role = agent.role,
        backstory = agent.backstory,
        goal = agent.goal
    )
}

/// Build the user prompt for a task.
///
/// The digest is embedded verbatim, and the model is told to use the actual
/// numbers. Prior outputs, when present, are appended under their own banner.
pub fn user_prompt(task: &PipelineTask, digest: &str, prior_outputs: &[(&str, &str)]) -> String {
    let mut prompt = String::new();

    prompt.push_str(task.description);
    prompt.push_str("\n\nHERE IS THE ACTUAL FINANCIAL DATA TO ANALYZE:\n\n");
    prompt.push_str(digest);

    for (title, output) in prior_outputs {
        prompt.push_str(&format!("\n\n=== CONTEXT: {} ===\n\n", title));
        prompt.push_str(output);
    }

    prompt.push_str(&format!(
        "\n\nEXPECTED OUTPUT: {}\n\n\
         IMPORTANT: Analyze THIS ACTUAL DATA above. Use the real customer and \
         vendor names, exact amounts, and payment statuses from the data. Do \
         NOT invent generic examples or placeholder names. Respond in Markdown.",
        task.expected_output
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_order() {
        let pipeline = default_pipeline();

        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[0].agent.role, "Cash Flow Analyst");
        assert_eq!(pipeline[1].agent.role, "Credit Risk Analyst");
        assert_eq!(pipeline[2].agent.role, "Communications & Action Manager");

        // Later tasks consume earlier outputs.
        assert_eq!(pipeline[0].context, &[] as &[usize]);
        assert_eq!(pipeline[1].context, &[0]);
        assert_eq!(pipeline[2].context, &[0, 1]);
    }

    #[test]
    fn test_output_files_are_distinct() {
        let pipeline = default_pipeline();
        let mut files: Vec<&str> = pipeline.iter().map(|t| t.output_file).collect();
        files.dedup();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_user_prompt_embeds_digest_and_context() {
        let pipeline = default_pipeline();
        let digest = "CASH POSITION SNAPSHOT\nCurrent Cash Balance: $1,000.00";
        let prior = vec![("Cash Flow Analysis", "prior analysis text")];

        let prompt = user_prompt(&pipeline[1], digest, &prior);

        assert!(prompt.contains("Current Cash Balance: $1,000.00"));
        assert!(prompt.contains("=== CONTEXT: Cash Flow Analysis ==="));
        assert!(prompt.contains("prior analysis text"));
        assert!(prompt.contains("Do NOT invent"));
    }

    #[test]
    fn test_system_prompt_carries_role() {
        let pipeline = default_pipeline();
        let prompt = system_prompt(&pipeline[0].agent);
        assert!(prompt.contains("You are Cash Flow Analyst"));
        assert!(prompt.contains("Your goal: Analyze financial transactions"));
    }
}
