//! Bind command: smell instances joined with file ownership

use anyhow::{Context, Result};
use std::path::Path;

use smelltrail::config::AnalysisConfig;
use smelltrail::pipeline::{ProjectLayout, ProjectOrchestrator};
use smelltrail::report::{self, write_table};

pub fn run(input: &Path, repos: &Path, output: &Path, config: AnalysisConfig) -> Result<()> {
    super::require_dir(input, "Input directory")?;
    super::require_dir(repos, "Repositories directory")?;
    super::create_output_dir(output)?;

    let layout = ProjectLayout {
        input_dir: input.to_path_buf(),
        repos_dir: repos.to_path_buf(),
        ..Default::default()
    };

    let bar = super::project_bar();
    bar.set_message("Binding smells");
    let orchestrator =
        ProjectOrchestrator::new(config).with_progress_callback(super::progress_callback(bar.clone()));
    let outcome = orchestrator.bind(&layout)?;
    bar.finish_and_clear();

    let delimiter = orchestrator.config().output.delimiter.as_str();
    let mut written = Vec::new();
    for (project, records) in &outcome.results {
        let path = output.join(report::smell_ownership_file(project));
        write_table(&path, delimiter, records)
            .with_context(|| format!("Failed to write smell ownership of {}", project))?;
        written.push(path);
    }

    super::print_summary("smelltrail bind", &outcome, &written);
    super::check_outcome(&outcome)
}
