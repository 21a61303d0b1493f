use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{self, Component, Path, PathBuf};

/// Subdirectory whose presence makes a directory eligible for the gateway
pub const SHADOW_STORE_MARKER: &str = ".shadowgit.git";

const HOME_MARKER: char = '~';

/// A configured repository, as it appears in the config file
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub name: String,
    pub path: String,
}

impl RepositoryEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Immutable view of the configured repositories
///
/// Built once at startup. Order is preserved and duplicates are kept, so
/// lookups return the first entry with a matching name.
#[derive(Debug, Clone, Default)]
pub struct RepositorySnapshot {
    entries: Vec<RepositoryEntry>,
}

impl RepositorySnapshot {
    pub fn new(entries: Vec<RepositoryEntry>) -> Self {
        Self { entries }
    }

    pub fn find(&self, name: &str) -> Option<&RepositoryEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[RepositoryEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }
}

/// A repository directory confirmed to exist and to carry the shadow store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    path: PathBuf,
    store_dir: PathBuf,
}

impl ResolvedRepository {
    /// The working tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The shadow store, used as the git directory
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }
}

/// Maps caller-supplied names or paths onto shadow-store repositories
///
/// Resolution never fails loudly: anything that cannot be confirmed is
/// reported as `None`.
#[derive(Debug, Clone)]
pub struct RepositoryResolver {
    snapshot: RepositorySnapshot,
    home: Option<PathBuf>,
}

impl RepositoryResolver {
    /// Create a resolver using the current user's home directory
    pub fn new(snapshot: RepositorySnapshot) -> Self {
        Self::with_home(snapshot, dirs::home_dir())
    }

    /// Create a resolver with an explicit home directory
    pub fn with_home(snapshot: RepositorySnapshot, home: Option<PathBuf>) -> Self {
        Self { snapshot, home }
    }

    pub fn snapshot(&self) -> &RepositorySnapshot {
        &self.snapshot
    }

    /// Resolve a repository name or a path-like string
    pub fn resolve(&self, input: &str) -> Option<ResolvedRepository> {
        if input.is_empty() {
            return None;
        }

        if let Some(entry) = self.snapshot.find(input) {
            debug!("Resolving repository '{}' via configured path {}", input, entry.path);
            let expanded = self.expand_home(&entry.path)?;
            let absolute = path::absolute(normalize(&expanded)).ok()?;
            return Self::confirm(absolute);
        }

        if !looks_like_path(input) {
            debug!("'{}' is neither a known repository nor a path", input);
            return None;
        }

        let normalized = normalize(&self.expand_home(input)?);
        if !normalized.is_absolute() {
            debug!("Rejecting non-absolute path {}", normalized.display());
            return None;
        }
        if !normalized.exists() {
            debug!("Path {} does not exist", normalized.display());
            return None;
        }

        Self::confirm(normalized)
    }

    /// Check for the shadow store marker
    fn confirm(path: PathBuf) -> Option<ResolvedRepository> {
        let store_dir = path.join(SHADOW_STORE_MARKER);
        if !store_dir.is_dir() {
            debug!("No {} under {}", SHADOW_STORE_MARKER, path.display());
            return None;
        }
        Some(ResolvedRepository { path, store_dir })
    }

    /// Expand `~` only when it is the whole string or followed by a separator
    ///
    /// Returns `None` when expansion is needed but no home directory is known.
    fn expand_home(&self, raw: &str) -> Option<PathBuf> {
        let Some(rest) = raw.strip_prefix(HOME_MARKER) else {
            return Some(PathBuf::from(raw));
        };

        if rest.is_empty() {
            return self.home.clone();
        }

        match rest.chars().next() {
            Some(c) if path::is_separator(c) => {
                let relative = rest.trim_start_matches(path::is_separator);
                self.home.as_ref().map(|home| home.join(relative))
            }
            _ => Some(PathBuf::from(raw)),
        }
    }
}

/// Bare tokens are names, never paths
fn looks_like_path(input: &str) -> bool {
    input.starts_with('/')
        || input.starts_with('\\')
        || input.starts_with(HOME_MARKER)
        || input.contains(':')
}

/// Lexically resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_repo(root: &Path, relative: &str, with_marker: bool) -> PathBuf {
        let dir = root.join(relative);
        fs::create_dir_all(&dir).unwrap();
        if with_marker {
            fs::create_dir_all(dir.join(SHADOW_STORE_MARKER)).unwrap();
        }
        dir
    }

    fn resolver(home: &Path, entries: Vec<RepositoryEntry>) -> RepositoryResolver {
        RepositoryResolver::with_home(RepositorySnapshot::new(entries), Some(home.to_path_buf()))
    }

    #[test]
    fn test_resolve_name_with_home_expansion() {
        let home = TempDir::new().unwrap();
        let repo_dir = make_repo(home.path(), "proj", true);
        let resolver = resolver(home.path(), vec![RepositoryEntry::new("app", "~/proj")]);

        let resolved = resolver.resolve("app").unwrap();
        assert_eq!(resolved.path(), repo_dir.as_path());
        assert_eq!(resolved.store_dir(), repo_dir.join(SHADOW_STORE_MARKER).as_path());
    }

    #[test]
    fn test_resolve_name_without_marker() {
        let home = TempDir::new().unwrap();
        make_repo(home.path(), "proj", false);
        let resolver = resolver(home.path(), vec![RepositoryEntry::new("app", "~/proj")]);

        assert!(resolver.resolve("app").is_none());
    }

    #[test]
    fn test_name_match_is_case_sensitive() {
        let home = TempDir::new().unwrap();
        make_repo(home.path(), "proj", true);
        let resolver = resolver(home.path(), vec![RepositoryEntry::new("app", "~/proj")]);

        assert!(resolver.resolve("App").is_none());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let home = TempDir::new().unwrap();
        let first = make_repo(home.path(), "first", true);
        make_repo(home.path(), "second", true);
        let resolver = resolver(
            home.path(),
            vec![
                RepositoryEntry::new("app", "~/first"),
                RepositoryEntry::new("app", "~/second"),
            ],
        );

        assert_eq!(resolver.resolve("app").unwrap().path(), first.as_path());
    }

    #[test]
    fn test_home_alone_expands() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(SHADOW_STORE_MARKER)).unwrap();
        let resolver = resolver(home.path(), vec![RepositoryEntry::new("home", "~")]);

        assert_eq!(resolver.resolve("home").unwrap().path(), home.path());
        assert_eq!(resolver.resolve("~").unwrap().path(), home.path());
    }

    #[test]
    fn test_mid_path_home_marker_not_expanded() {
        let home = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        make_repo(home.path(), "proj", true);
        // A literal directory named "~" inside root
        let literal = make_repo(root.path(), "~/proj", true);
        let resolver = resolver(home.path(), Vec::new());

        let input = format!("{}/~/proj", root.path().display());
        assert_eq!(resolver.resolve(&input).unwrap().path(), literal.as_path());
    }

    #[test]
    fn test_home_marker_followed_by_name_not_expanded() {
        let home = TempDir::new().unwrap();
        make_repo(home.path(), "proj", true);
        let resolver = resolver(home.path(), Vec::new());

        // "~proj" would be another user's home in a shell; here it stays relative
        assert!(resolver.resolve("~proj").is_none());
    }

    #[test]
    fn test_bare_token_never_treated_as_path() {
        let home = TempDir::new().unwrap();
        make_repo(home.path(), "proj", true);
        let resolver = resolver(home.path(), Vec::new());

        // A directory named "proj" exists under home, but a bare token is
        // only ever a name
        assert!(resolver.resolve("proj").is_none());
        assert!(resolver.resolve("proj/.").is_none());
    }

    #[test]
    fn test_relative_path_with_dots_rejected() {
        let resolver = RepositoryResolver::with_home(RepositorySnapshot::default(), None);
        assert!(resolver.resolve("./proj").is_none());
        assert!(resolver.resolve("../proj").is_none());
    }

    #[test]
    fn test_absolute_path_resolves() {
        let root = TempDir::new().unwrap();
        let repo_dir = make_repo(root.path(), "work/repo", true);
        let resolver = resolver(root.path(), Vec::new());

        let input = repo_dir.to_string_lossy().to_string();
        assert_eq!(resolver.resolve(&input).unwrap().path(), repo_dir.as_path());
    }

    #[test]
    fn test_absolute_path_is_normalized() {
        let root = TempDir::new().unwrap();
        let repo_dir = make_repo(root.path(), "work/repo", true);
        make_repo(root.path(), "work/other", false);
        let resolver = resolver(root.path(), Vec::new());

        let input = format!("{}/work/other/../repo/.", root.path().display());
        assert_eq!(resolver.resolve(&input).unwrap().path(), repo_dir.as_path());
    }

    #[test]
    fn test_path_missing_or_without_marker() {
        let root = TempDir::new().unwrap();
        let plain = make_repo(root.path(), "plain", false);
        let resolver = resolver(root.path(), Vec::new());

        assert!(resolver.resolve(&plain.to_string_lossy()).is_none());
        let missing = root.path().join("missing");
        assert!(resolver.resolve(&missing.to_string_lossy()).is_none());
    }

    #[test]
    fn test_home_path_input() {
        let home = TempDir::new().unwrap();
        let repo_dir = make_repo(home.path(), "code/proj", true);
        let resolver = resolver(home.path(), Vec::new());

        assert_eq!(resolver.resolve("~/code/proj").unwrap().path(), repo_dir.as_path());
    }

    #[test]
    fn test_home_unknown() {
        let resolver = RepositoryResolver::with_home(
            RepositorySnapshot::new(vec![RepositoryEntry::new("app", "~/proj")]),
            None,
        );
        assert!(resolver.resolve("app").is_none());
        assert!(resolver.resolve("~/proj").is_none());
    }

    #[test]
    fn test_empty_input() {
        let resolver = RepositoryResolver::with_home(RepositorySnapshot::default(), None);
        assert!(resolver.resolve("").is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_looks_like_path() {
        assert!(looks_like_path("/srv/repo"));
        assert!(looks_like_path("~/repo"));
        assert!(looks_like_path("C:\\repo"));
        assert!(looks_like_path("\\\\server\\share"));
        assert!(!looks_like_path("repo"));
        assert!(!looks_like_path("./repo"));
    }
}
