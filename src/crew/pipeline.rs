//! Sequential execution of the analysis crew.
//!
//! Tasks run strictly in order; each output is written to disk as soon as
//! the model returns it, so a failure mid-pipeline leaves the earlier
//! reports intact.

use crate::crew::{default_pipeline, system_prompt, user_prompt, LlmClient};
use crate::models::AgentReport;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Run the three-agent pipeline against the digest.
///
/// Returns one [`AgentReport`] per task, in execution order.
pub async fn run_pipeline(
    client: &LlmClient,
    digest: &str,
    output_dir: &Path,
    show_progress: bool,
) -> Result<Vec<AgentReport>> {
    let tasks = default_pipeline();
    let mut reports: Vec<AgentReport> = Vec::with_capacity(tasks.len());

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    for (index, task) in tasks.iter().enumerate() {
        info!(
            "Running agent {}/{}: {}",
            index + 1,
            tasks.len(),
            task.agent.name
        );

        let spinner = if show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap(),
            );
            pb.set_message(format!(
                "{} ({}/{}) thinking...",
                task.agent.name,
                index + 1,
                tasks.len()
            ));
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let prior_outputs: Vec<(&str, &str)> = task
            .context
            .iter()
            .filter_map(|&i| reports.get(i))
            .map(|r: &AgentReport| (r.title.as_str(), r.content.as_str()))
            .collect();

        let system = system_prompt(&task.agent);
        let user = user_prompt(task, digest, &prior_outputs);

        let start = Instant::now();
        let result = client.complete(&system, &user).await;
        let duration = start.elapsed().as_secs_f64();

        if let Some(pb) = &spinner {
            pb.finish_and_clear();
        }

        let content = result.with_context(|| {
            format!("Agent '{}' failed", task.agent.name)
        })?;

        let output_path = output_dir.join(task.output_file);
        std::fs::write(&output_path, &content).with_context(|| {
            format!("Failed to write report to {}", output_path.display())
        })?;

        info!(
            "Agent {} finished in {:.1}s -> {}",
            task.agent.name,
            duration,
            output_path.display()
        );

        reports.push(AgentReport {
            agent: task.agent.name.to_string(),
            title: task.title.to_string(),
            file_name: task.output_file.to_string(),
            content,
            duration_seconds: duration,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::default_pipeline;

    #[test]
    fn test_context_indices_resolve_to_earlier_tasks() {
        // Every context index must point at an already-completed task,
        // otherwise the prior-output lookup would silently drop it.
        for (index, task) in default_pipeline().iter().enumerate() {
            for &ctx in task.context {
                assert!(ctx < index, "task {} references future task {}", index, ctx);
            }
        }
    }
}
