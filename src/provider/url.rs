//! Recognition of GitHub and Azure DevOps repository URLs.
//!
//! Nothing here does I/O. Malformed input is an expected outcome and is
//! reported as [`ProviderError::InvalidUrl`], never a panic.

use reqwest::Url;

use super::ProviderError;

const AZURE_HOST: &str = "dev.azure.com";
const VISUALSTUDIO_SUFFIX: &str = ".visualstudio.com";
const GIT_SEGMENT: &str = "_git";

/// Owner and repository name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
}

/// Which of the two Azure DevOps host shapes a URL used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AzureHost {
    /// `dev.azure.com/{org}/...`
    DevAzure,
    /// `{org}.visualstudio.com/...`
    VisualStudio,
}

/// Organization, project and repository of an Azure DevOps Git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureRepo {
    pub host: AzureHost,
    pub org: String,
    pub project: String,
    pub repo: String,
}

impl AzureRepo {
    /// Base endpoint of the organization, in the same host shape the URL used.
    pub fn org_base(&self) -> String {
        org_base_url(self.host, &self.org)
    }
}

fn org_base_url(host: AzureHost, org: &str) -> String {
    match host {
        AzureHost::DevAzure => format!("https://{}/{}", AZURE_HOST, org),
        AzureHost::VisualStudio => format!("https://{}{}", org, VISUALSTUDIO_SUFFIX),
    }
}

/// Parse a URL, tolerating a missing scheme.
fn parse_loose(input: &str) -> Option<Url> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.contains("://") {
        Url::parse(input).ok()
    } else {
        Url::parse(&format!("https://{}", input)).ok()
    }
}

fn segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Organization name from a `{org}.visualstudio.com` host.
fn visualstudio_org(host: &str) -> Option<&str> {
    host.strip_suffix(VISUALSTUDIO_SUFFIX)
        .filter(|org| !org.is_empty() && !org.contains('.'))
}

/// Extract `{owner, repo}` from `github.com/{owner}/{repo}[/...]`.
pub fn parse_github_url(input: &str) -> Result<GitHubRepo, ProviderError> {
    let invalid = || ProviderError::InvalidUrl(input.to_string());
    let url = parse_loose(input).ok_or_else(invalid)?;

    match url.host_str() {
        Some("github.com") | Some("www.github.com") => {}
        _ => return Err(invalid()),
    }

    let segs = segments(&url);
    if segs.len() < 2 {
        return Err(invalid());
    }
    let owner = segs[0].clone();
    let repo = segs[1].strip_suffix(".git").unwrap_or(segs[1].as_str()).to_string();
    if repo.is_empty() {
        return Err(invalid());
    }

    Ok(GitHubRepo { owner, repo })
}

/// Extract `{org, project, repo}` from either Azure DevOps URL shape:
///
/// - `https://dev.azure.com/{org}/{project}/_git/{repo}[/...]`
/// - `https://{org}.visualstudio.com/{project}/_git/{repo}[/...]`
pub fn parse_azure_url(input: &str) -> Result<AzureRepo, ProviderError> {
    let invalid = || ProviderError::InvalidUrl(input.to_string());
    let url = parse_loose(input).ok_or_else(invalid)?;
    let host_name = url.host_str().ok_or_else(invalid)?;
    let segs = segments(&url);

    let (host, org, rest) = if host_name == AZURE_HOST {
        let (org, rest) = segs.split_first().ok_or_else(invalid)?;
        (AzureHost::DevAzure, org.clone(), rest)
    } else if let Some(org) = visualstudio_org(host_name) {
        (AzureHost::VisualStudio, org.to_string(), segs.as_slice())
    } else {
        return Err(invalid());
    };

    // rest must read [project, "_git", repo, ...]
    let git_index = rest.iter().position(|s| s == GIT_SEGMENT).ok_or_else(invalid)?;
    if git_index != 1 {
        return Err(invalid());
    }
    let project = rest[0].clone();
    let repo = rest.get(git_index + 1).cloned().ok_or_else(invalid)?;

    if org.is_empty() || project.is_empty() || repo.is_empty() {
        return Err(invalid());
    }

    Ok(AzureRepo {
        host,
        org,
        project,
        repo,
    })
}

/// Canonical organization base endpoint from a bare organization name,
/// a `dev.azure.com/{org}` URL, or a `{org}.visualstudio.com` URL.
/// Bare names resolve to the `dev.azure.com` form.
pub fn normalize_azure_org(input: &str) -> Result<String, ProviderError> {
    let invalid = || ProviderError::InvalidUrl(input.to_string());
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let looks_like_url = trimmed.contains("://")
        || trimmed.contains(AZURE_HOST)
        || trimmed.contains(VISUALSTUDIO_SUFFIX);

    if !looks_like_url {
        if trimmed.contains('/') || trimmed.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        return Ok(org_base_url(AzureHost::DevAzure, trimmed));
    }

    let url = parse_loose(trimmed).ok_or_else(invalid)?;
    let host_name = url.host_str().ok_or_else(invalid)?;

    if host_name == AZURE_HOST {
        let segs = segments(&url);
        let org = segs.first().ok_or_else(invalid)?;
        Ok(org_base_url(AzureHost::DevAzure, org))
    } else if let Some(org) = visualstudio_org(host_name) {
        Ok(org_base_url(AzureHost::VisualStudio, org))
    } else {
        Err(invalid())
    }
}
