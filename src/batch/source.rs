//! Repository locations and batch input expansion

use crate::error::{BatchError, ConversionError, ConversionResult};
use git2::{Cred, CredentialType, FetchOptions, ProxyOptions, RemoteCallbacks, build::RepoBuilder};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Where a repository to convert lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    /// Working tree on the local file system
    Local(PathBuf),
    /// Git URL (`https://`, `ssh://`, `git://`, `file://` or `git@host:path`)
    Remote(String),
}

impl RepositoryLocation {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.contains("://") || (input.starts_with("git@") && input.contains(':')) {
            Self::Remote(input.to_string())
        } else {
            Self::Local(PathBuf::from(input))
        }
    }

    /// Short name used to derive the output file name
    ///
    /// Local repositories use their last path component. Remote ones use
    /// the URL without scheme and `.git` suffix, with `/` and `:` replaced
    /// by `&` so the name stays a single path component.
    pub fn name(&self) -> String {
        match self {
            Self::Local(path) => {
                let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
                absolute
                    .components()
                    .next_back()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .filter(|name| !name.is_empty() && name != "/")
                    .unwrap_or_else(|| "root".to_string())
            }
            Self::Remote(url) => {
                let without_scheme = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);
                let trimmed = without_scheme.trim_end_matches('/');
                let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
                trimmed.replace(['/', ':'], "&")
            }
        }
    }

    /// Identity recorded in the output metadata
    pub fn identifier(&self) -> String {
        match self {
            Self::Local(path) => std::fs::canonicalize(path)
                .unwrap_or_else(|_| path.clone())
                .display()
                .to_string(),
            Self::Remote(url) => url.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Make the repository available on disk
    ///
    /// Remote repositories are shallow-cloned into a temporary directory
    /// that is removed when the returned [`Checkout`] is dropped. This
    /// blocks; call it from the blocking pool inside async code.
    pub fn checkout(&self) -> ConversionResult<Checkout> {
        match self {
            Self::Local(path) => Ok(Checkout {
                path: path.clone(),
                _temp: None,
            }),
            Self::Remote(url) => {
                let temp = TempDir::new().map_err(|e| ConversionError::Clone {
                    url: url.clone(),
                    reason: format!("cannot create temporary directory: {e}"),
                })?;
                let target = temp.path().join("repo");
                clone_repository(url, &target)?;
                Ok(Checkout {
                    path: target,
                    _temp: Some(temp),
                })
            }
        }
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// A repository on disk, kept alive for the duration of a conversion
#[derive(Debug)]
pub struct Checkout {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl Checkout {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Shallow-clone `url` into `target_dir`
fn clone_repository(url: &str, target_dir: &Path) -> ConversionResult<()> {
    let is_local = url.starts_with("file://");

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(credential_callback);

    let mut fetch_opts = FetchOptions::new();
    if !is_local {
        // libgit2 does not support shallow fetches over the local transport
        fetch_opts.depth(1);
    }
    fetch_opts.remote_callbacks(callbacks);

    let mut proxy_opts = ProxyOptions::new();
    proxy_opts.auto();
    fetch_opts.proxy_options(proxy_opts);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_opts);

    tracing::debug!(url, target = %target_dir.display(), "cloning repository");
    builder
        .clone(url, target_dir)
        .map_err(|e| ConversionError::Clone {
            url: url.to_string(),
            reason: e.message().to_string(),
        })?;

    Ok(())
}

fn credential_callback(
    _url: &str,
    username_from_url: Option<&str>,
    allowed_types: CredentialType,
) -> Result<Cred, git2::Error> {
    if allowed_types.is_ssh_key() {
        if let Ok(cred) = Cred::ssh_key_from_agent(username_from_url.unwrap_or("git")) {
            return Ok(cred);
        }
    }

    if let Ok(cred) = Cred::default() {
        return Ok(cred);
    }

    if allowed_types.is_user_pass_plaintext() {
        if let (Ok(username), Ok(password)) =
            (std::env::var("GIT_USERNAME"), std::env::var("GIT_PASSWORD"))
        {
            return Cred::userpass_plaintext(&username, &password);
        }
    }

    Err(git2::Error::from_str("no credentials available"))
}

/// Expand batch inputs into repository locations
///
/// - a directory is one repository, or with `nested` each of its immediate
///   subdirectories is one
/// - a regular file is a list of locations, one per line; blank lines and
///   `#` comments are skipped
/// - anything else (URLs, missing paths) is taken as a single location
pub fn expand_inputs<S: AsRef<str>>(
    inputs: &[S],
    nested: bool,
) -> Result<Vec<RepositoryLocation>, BatchError> {
    let mut locations = Vec::new();

    for input in inputs {
        let input = input.as_ref();
        let location = RepositoryLocation::parse(input);
        let RepositoryLocation::Local(path) = &location else {
            locations.push(location);
            continue;
        };

        if path.is_dir() {
            if nested {
                locations.extend(subdirectories(path)?);
            } else {
                locations.push(location);
            }
        } else if path.is_file() {
            let content =
                std::fs::read_to_string(path).map_err(|source| BatchError::InputList {
                    path: path.clone(),
                    source,
                })?;
            locations.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(RepositoryLocation::parse),
            );
        } else {
            tracing::warn!(input, "repository path does not exist");
            locations.push(location);
        }
    }

    Ok(locations)
}

fn subdirectories(root: &Path) -> Result<Vec<RepositoryLocation>, BatchError> {
    let mut dirs = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BatchError::InputList {
            path: root.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_dir() {
            dirs.push(RepositoryLocation::Local(entry.into_path()));
        }
    }
    Ok(dirs)
}
