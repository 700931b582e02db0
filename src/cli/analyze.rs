//! Analyze command: commit records and snapshot ownership per repository

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use smelltrail::config::AnalysisConfig;
use smelltrail::models::ProjectSummary;
use smelltrail::pipeline::ProjectOrchestrator;
use smelltrail::report::{self, write_table};

pub fn run(repos_dir: &Path, output: &Path, config: AnalysisConfig) -> Result<()> {
    super::require_dir(repos_dir, "Repositories directory")?;
    super::create_output_dir(output)?;

    let bar = super::project_bar();
    bar.set_message("Analyzing repositories");
    let orchestrator =
        ProjectOrchestrator::new(config).with_progress_callback(super::progress_callback(bar.clone()));
    let outcome = orchestrator.analyze(repos_dir)?;
    bar.finish_and_clear();

    let delimiter = orchestrator.config().output.delimiter.as_str();
    let mut written = Vec::new();
    for (project, analysis) in &outcome.results {
        let commits_path = output.join(report::commits_file(project));
        write_table(&commits_path, delimiter, &analysis.commits)
            .with_context(|| format!("Failed to write commits of {}", project))?;
        written.push(commits_path);

        let ownership_path = output.join(report::ownership_file(project));
        write_table(&ownership_path, delimiter, &analysis.ownership)
            .with_context(|| format!("Failed to write ownership of {}", project))?;
        written.push(ownership_path);
    }

    let summaries: Vec<ProjectSummary> = outcome
        .results
        .iter()
        .map(|(_, analysis)| analysis.summary.clone())
        .collect();
    let projects_path = output.join(report::PROJECTS_FILE);
    write_table(&projects_path, delimiter, &summaries).context("Failed to write project summaries")?;
    written.push(projects_path);

    for summary in &summaries {
        info!(
            "[{}] {} commits, ownership coverage {:.1}%",
            summary.project,
            summary.commits,
            summary.ownership_coverage() * 100.0
        );
    }
    super::print_summary("smelltrail analyze", &outcome, &written);
    super::check_outcome(&outcome)
}
