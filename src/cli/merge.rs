//! Merge command: lifecycle events, smell commit counters and commit context

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use smelltrail::config::AnalysisConfig;
use smelltrail::models::{EventKind, SmellCommitCounts, SmellLifecycleEvent};
use smelltrail::pipeline::{ProjectLayout, ProjectOrchestrator};
use smelltrail::report::{self, write_table};

pub fn run(
    input: &Path,
    repos: &Path,
    logs: Option<PathBuf>,
    commits: Option<PathBuf>,
    output: &Path,
    config: AnalysisConfig,
) -> Result<()> {
    super::require_dir(input, "Input directory")?;
    super::require_dir(repos, "Repositories directory")?;
    super::create_output_dir(output)?;

    let with_context = commits.is_some();
    let layout = ProjectLayout {
        input_dir: input.to_path_buf(),
        repos_dir: repos.to_path_buf(),
        logs_dir: logs,
        commits_dir: commits,
    };

    let bar = super::project_bar();
    bar.set_message("Merging smell lifecycles");
    let orchestrator =
        ProjectOrchestrator::new(config).with_progress_callback(super::progress_callback(bar.clone()));
    let outcome = orchestrator.merge(&layout)?;
    bar.finish_and_clear();

    let delimiter = orchestrator.config().output.delimiter.as_str();
    let mut written = Vec::new();

    let events: Vec<&SmellLifecycleEvent> = outcome
        .results
        .iter()
        .flat_map(|(_, merged)| merged.events.iter())
        .collect();
    for kind in EventKind::ALL {
        let rows: Vec<SmellLifecycleEvent> = events
            .iter()
            .filter(|event| event.kind == kind)
            .map(|event| (*event).clone())
            .collect();
        let path = output.join(report::lifecycle_file(kind));
        write_table(&path, delimiter, &rows)
            .with_context(|| format!("Failed to write {} events", kind))?;
        written.push(path);
    }

    let counts: Vec<SmellCommitCounts> = outcome
        .results
        .iter()
        .map(|(_, merged)| merged.counts.clone())
        .collect();
    let counts_path = output.join(report::SMELL_COMMIT_COUNTS_FILE);
    write_table(&counts_path, delimiter, &counts).context("Failed to write smell commit counts")?;
    written.push(counts_path);

    if with_context {
        let context: Vec<_> = outcome
            .results
            .iter()
            .filter_map(|(_, merged)| merged.context.as_ref())
            .flatten()
            .cloned()
            .collect();
        let context_path = output.join(report::COMMITS_CONTEXT_FILE);
        write_table(&context_path, delimiter, &context).context("Failed to write commit context")?;
        written.push(context_path);
    }

    super::print_summary("smelltrail merge", &outcome, &written);
    super::check_outcome(&outcome)
}
