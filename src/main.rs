mod commit;
mod config;
mod docgen;
mod provider;
mod report;

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use commit::{Commit, CommitSource, CommitStore};
use docgen::{GenerationConfig, GeminiGenerator};
use provider::{AzureClient, GitHubClient};

/// commitdoc: collect commits from GitHub, Azure DevOps, or pasted diffs
/// and turn them into Markdown documentation with an LLM.
#[derive(Parser, Debug)]
#[command(name = "commitdoc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the repositories of an Azure DevOps organization
    Repos {
        /// Organization name, or a dev.azure.com / visualstudio.com URL
        org: String,

        /// Personal access token (falls back to config, then AZURE_DEVOPS_PAT)
        #[arg(long)]
        token: Option<String>,
    },

    /// Fetch commits and generate documentation
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// GitHub commit: repository URL followed by commit hash (repeatable)
    #[arg(long, num_args = 2, value_names = ["URL", "HASH"])]
    github: Vec<String>,

    /// Azure DevOps commit: repository URL followed by commit id (repeatable)
    #[arg(long, num_args = 2, value_names = ["URL", "HASH"])]
    azure: Vec<String>,

    /// File holding a pasted diff, `-` for stdin (repeatable)
    #[arg(long, value_name = "PATH")]
    manual: Vec<PathBuf>,

    /// Message for the manual entry at the same position
    #[arg(long, value_name = "TEXT")]
    manual_message: Vec<String>,

    /// Drop collected commits with this short hash before generating (repeatable)
    #[arg(long, value_name = "HASH")]
    exclude: Vec<String>,

    /// Extra context about the change set
    #[arg(long, default_value = "")]
    extra: String,

    /// Setup instructions to include in the documentation
    #[arg(long, default_value = "")]
    setup: String,

    /// Existing Markdown document to update instead of writing a new one
    #[arg(long, value_name = "PATH")]
    previous: Option<PathBuf>,

    /// GitHub token (falls back to config, then GITHUB_TOKEN)
    #[arg(long)]
    github_token: Option<String>,

    /// Azure DevOps personal access token (falls back to config, then AZURE_DEVOPS_PAT)
    #[arg(long)]
    azure_token: Option<String>,

    /// Write the Markdown here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    info!("loading configuration");
    let config = config::Config::load()?;
    let http = provider::http_client(config.http.timeout())?;

    match cli.command {
        Command::Repos { org, token } => {
            let _span = info_span!("repos", org = %org).entered();
            let token = token.or_else(|| config.azure_token());
            let azure = azure_client(http, &config);
            let repos = azure.list_repositories(&org, token.as_deref()).await?;
            info!(count = repos.len(), "listed repositories");
            print!("{}", report::format_repositories(&repos));
        }
        Command::Generate(args) => {
            let sources = matches
                .subcommand_matches("generate")
                .map(|sub| ordered_sources(&args, sub))
                .unwrap_or_default();
            generate(args, sources, &config, http)
                .instrument(info_span!("generate"))
                .await?
        }
    }

    Ok(())
}

/// One commit source given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    GitHub { url: String, hash: String },
    Azure { url: String, hash: String },
    Manual { path: PathBuf, message: Option<String> },
}

/// Merge `--github`, `--azure` and `--manual` back into the order they were
/// typed. That order is the order commits appear in the prompt.
fn ordered_sources(args: &GenerateArgs, matches: &ArgMatches) -> Vec<Source> {
    let positions = |id: &str, values_per_occurrence: usize| -> Vec<usize> {
        matches
            .indices_of(id)
            .map(|indices| indices.step_by(values_per_occurrence).collect())
            .unwrap_or_default()
    };

    let mut sources: Vec<(usize, Source)> = Vec::new();
    for (index, pair) in positions("github", 2).into_iter().zip(args.github.chunks_exact(2)) {
        sources.push((index, Source::GitHub { url: pair[0].clone(), hash: pair[1].clone() }));
    }
    for (index, pair) in positions("azure", 2).into_iter().zip(args.azure.chunks_exact(2)) {
        sources.push((index, Source::Azure { url: pair[0].clone(), hash: pair[1].clone() }));
    }
    for (i, (index, path)) in positions("manual", 1).into_iter().zip(&args.manual).enumerate() {
        let message = args.manual_message.get(i).cloned();
        sources.push((index, Source::Manual { path: path.clone(), message }));
    }

    sources.sort_by_key(|(index, _)| *index);
    sources.into_iter().map(|(_, source)| source).collect()
}

fn azure_client(http: reqwest::Client, config: &config::Config) -> AzureClient {
    match config.azure.base_url.as_deref() {
        Some(base) => AzureClient::with_base_url(http, base),
        None => AzureClient::new(http),
    }
}

async fn generate(
    args: GenerateArgs,
    sources: Vec<Source>,
    config: &config::Config,
    http: reqwest::Client,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = CommitStore::new();

    let github = GitHubClient::with_api_url(http.clone(), config.github.api_url.as_str());
    let github_token = args.github_token.clone().or_else(|| config.github_token());
    let azure = azure_client(http.clone(), config);
    let azure_token = args.azure_token.clone().or_else(|| config.azure_token());

    for source in sources {
        match source {
            Source::GitHub { url, hash } => {
                info!(%url, %hash, "fetching GitHub commit");
                match github.fetch_commit(&url, &hash, github_token.as_deref()).await {
                    Ok(commit) => add_fetched(&mut store, commit),
                    Err(err) => report::print_fetch_failure(CommitSource::GitHub, &url, &err),
                }
            }
            Source::Azure { url, hash } => {
                info!(%url, %hash, "fetching Azure DevOps commit");
                match azure.fetch_commit(&url, &hash, azure_token.as_deref()).await {
                    Ok(commit) => add_fetched(&mut store, commit),
                    Err(err) => report::print_fetch_failure(CommitSource::Azure, &url, &err),
                }
            }
            Source::Manual { path, message } => {
                let diff = read_input(&path)?;
                if diff.trim().is_empty() {
                    warn!(path = %path.display(), "skipping empty manual diff");
                    continue;
                }
                store.add(Commit::manual(diff, message));
            }
        }
    }

    for hash in &args.exclude {
        let ids: Vec<_> = store
            .commits()
            .iter()
            .filter(|c| c.hash() == hash.as_str())
            .map(|c| c.id())
            .collect();
        for id in ids {
            store.remove(id);
        }
        debug!(%hash, remaining = store.len(), "excluded commits");
    }

    if store.is_empty() {
        return Err("No commits to document. Add at least one with --github, --azure, or --manual.".into());
    }
    report::print_commit_summary(store.commits());

    let generation = GenerationConfig {
        extra_info: args.extra,
        setup_instructions: args.setup,
        previous_doc_content: args.previous.as_deref().map(read_input).transpose()?,
    };

    let generator = GeminiGenerator::new(
        http,
        config.llm.endpoint.as_str(),
        config.llm.model.as_str(),
        config.llm_api_key(),
    );

    info!(commits = store.len(), "generating documentation");
    let markdown = docgen::generate_documentation(store.commits(), &generation, &generator).await;
    report::output(&markdown, args.output.as_deref())?;
    info!("done");

    Ok(())
}

fn add_fetched(store: &mut CommitStore, commit: Commit) {
    report::print_fetch_success(&commit);
    store.add(commit);
}

/// Read a file, or stdin when the path is `-`.
fn read_input(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}
