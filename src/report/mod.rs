use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::commit::{Commit, CommitSource};
use crate::provider::Repository;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write documentation file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Write the generated Markdown to stdout (default) or to a file.
#[instrument(skip(markdown), fields(chars = markdown.len()))]
pub fn output(markdown: &str, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing documentation to stdout");
            println!("{}", markdown);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing documentation to file");
            std::fs::write(path, markdown)?;
            Ok(())
        }
    }
}

/// One line per commit, in prompt order.
///
/// 1. [GITHUB] a1b2c3d  Add login page (alice)
pub fn format_commit_summary(commits: &[Commit]) -> String {
    let mut out = String::new();
    for (i, commit) in commits.iter().enumerate() {
        let title = commit.message().lines().next().unwrap_or_default();
        let _ = write!(
            out,
            "{:>3}. [{}] {}  {}",
            i + 1,
            colorize_source(commit.source()),
            commit.hash().bold(),
            title
        );
        if let Some(author) = commit.author() {
            let _ = write!(out, " ({})", author);
        }
        out.push('\n');
    }
    out
}

/// Print the commit list to stderr so stdout stays clean for Markdown.
pub fn print_commit_summary(commits: &[Commit]) {
    eprintln!("{}", format!("Collected {} commit(s):", commits.len()).bold());
    eprint!("{}", format_commit_summary(commits));
}

/// Inline error shown next to the source that failed to fetch.
pub fn print_fetch_failure(source: CommitSource, reference: &str, error: &dyn std::fmt::Display) {
    eprintln!(
        "{} [{}] {}: {}",
        "✗".red().bold(),
        source,
        reference,
        error.to_string().red()
    );
}

pub fn print_fetch_success(commit: &Commit) {
    eprintln!(
        "{} [{}] {} {}",
        "✓".green().bold(),
        commit.source(),
        commit.hash(),
        commit.message().lines().next().unwrap_or_default()
    );
}

/// Tab-separated `name  project  webUrl` lines for the repository picker.
pub fn format_repositories(repos: &[Repository]) -> String {
    if repos.is_empty() {
        return "No repositories found.\n".to_string();
    }
    let width = repos.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for repo in repos {
        let _ = writeln!(out, "{:<width$}  {}  {}", repo.name, repo.project, repo.web_url, width = width);
    }
    out
}

fn colorize_source(source: CommitSource) -> colored::ColoredString {
    match source {
        CommitSource::GitHub => "GITHUB".blue(),
        CommitSource::Azure => "AZURE".cyan(),
        CommitSource::Manual => "MANUAL".yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, project: &str) -> Repository {
        Repository {
            id: name.to_string(),
            name: name.to_string(),
            web_url: format!("https://dev.azure.com/contoso/{}/_git/{}", project, name),
            project: project.to_string(),
        }
    }

    #[test]
    fn test_format_commit_summary() {
        colored::control::set_override(false);
        let commits = vec![
            Commit::from_github(
                "abcdef123456",
                "Add login page\n\nLonger body".to_string(),
                Some("alice".to_string()),
                None,
                String::new(),
            ),
            Commit::manual(String::new(), None),
        ];
        let summary = format_commit_summary(&commits);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "  1. [GITHUB] abcdef1  Add login page (alice)");
        assert_eq!(lines[1], "  2. [MANUAL] manual  Manual Entry");
    }

    #[test]
    fn test_format_repositories() {
        let out = format_repositories(&[repo("api", "Payments"), repo("frontend", "Web")]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "api       Payments  https://dev.azure.com/contoso/Payments/_git/api");
        assert_eq!(lines[1], "frontend  Web  https://dev.azure.com/contoso/Web/_git/frontend");
    }

    #[test]
    fn test_format_no_repositories() {
        assert_eq!(format_repositories(&[]), "No repositories found.\n");
    }

    #[test]
    fn test_output_to_file() {
        let path = std::env::temp_dir().join("commitdoc_test_output.md");
        output("# Title\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Title\n");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_output_to_stdout() {
        // Should not panic
        output("# Title", None).unwrap();
    }

    #[test]
    fn test_fetch_messages_do_not_panic() {
        let commit = Commit::manual("+x".to_string(), Some("Tweak".to_string()));
        print_fetch_success(&commit);
        print_fetch_failure(CommitSource::Azure, "https://dev.azure.com/x", &"boom");
        print_commit_summary(&[commit]);
    }
}
