use crate::commit::Commit;

use super::GenerationConfig;

/// Characters of each commit's diff that make it into the prompt.
pub const MAX_DIFF_CHARS: usize = 15_000;

const TRUNCATION_NOTICE: &str = "(Diff truncated to the first 15000 characters)";

const NEW_DOCUMENT_INSTRUCTIONS: &str = "\
Write a new technical document in Markdown that explains the changes introduced by the commits below.
Use exactly this structure:

1. **Title**: a short, descriptive title for the change set.
2. **Overview**: what was changed and why, in a few sentences.
3. **Key Changes**: a bullet list of the important changes, grouped by area.
4. **Usage**: how to use the new or changed functionality, with examples where the diffs make them clear.
5. **Configuration/Setup**: any configuration, migration, or setup steps required.

Base every statement on the commits and context provided. Do not invent features that are not in the diffs.";

const UPDATE_DOCUMENT_INSTRUCTIONS: &str = "\
Update the existing documentation below so that it reflects the changes introduced by the commits below.
Merge the new information into the existing document: keep its structure, headings, and tone, revise sections
that the commits change, and add new sections only where the existing structure has no place for the change.
Return the complete updated document in Markdown, not just the changed parts.

Base every statement on the commits and context provided. Do not invent features that are not in the diffs.";

fn or_na(text: &str) -> &str {
    if text.trim().is_empty() {
        "N/A"
    } else {
        text
    }
}

/// Render one commit as a fixed-format block. `index` is 1-based.
fn render_commit(index: usize, commit: &Commit) -> String {
    let diff = commit.diff();
    let shown: String = diff.chars().take(MAX_DIFF_CHARS).collect();
    let mut block = format!(
        "### Commit {}\nHash: {}\nMessage: {}\nAuthor: {}\nDate: {}\nChanges:\n{}\n",
        index,
        commit.hash(),
        commit.message(),
        commit.author().unwrap_or("Unknown"),
        commit.date().unwrap_or("Unknown"),
        shown
    );
    if shown.len() < diff.len() {
        block.push_str(TRUNCATION_NOTICE);
        block.push('\n');
    }
    block
}

/// Assemble the single prompt sent to the text-generation endpoint.
pub fn build_prompt(commits: &[Commit], config: &GenerationConfig) -> String {
    let previous = config
        .previous_doc_content
        .as_deref()
        .filter(|doc| !doc.trim().is_empty());

    let instructions = if previous.is_some() {
        UPDATE_DOCUMENT_INSTRUCTIONS
    } else {
        NEW_DOCUMENT_INSTRUCTIONS
    };

    let previous_section = match previous {
        Some(doc) => format!("```markdown\n{}\n```", doc),
        None => "None".to_string(),
    };

    let commit_blocks = commits
        .iter()
        .enumerate()
        .map(|(i, commit)| render_commit(i + 1, commit))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{instructions}\n\n\
         ## Additional Context\n{extra}\n\n\
         ## Setup Instructions\n{setup}\n\n\
         ## Existing Documentation\n{previous_section}\n\n\
         ## Commits\n{commit_blocks}",
        extra = or_na(&config.extra_info),
        setup = or_na(&config.setup_instructions),
    )
}
