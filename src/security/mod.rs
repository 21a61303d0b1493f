pub mod tokenizer;
pub mod validator;

pub use tokenizer::tokenize;
pub use validator::{is_allowed_env, CommandValidator, InvocationTrust, ValidationError};

/// Allowlist of git subcommands external callers may run
///
/// Every entry must be read-only with respect to the shadow store. Internal
/// callers (the checkpoint workflow) are not bound by this list.
///
/// Adding a new subcommand requires careful security review.
pub const ALLOWED_GIT_SUBCOMMANDS: &[&str] = &[
    // History
    "log",
    "show",
    "shortlog",
    "rev-list",
    "describe",
    "name-rev",
    "cherry",
    "merge-base",
    // Content and diffs
    "diff",
    "diff-tree",
    "blame",
    "cat-file",
    "ls-files",
    "ls-tree",
    // Refs and state
    "status",
    "rev-parse",
    "for-each-ref",
    "show-ref",
    "count-objects",
];

/// Arguments that are rejected for every caller
///
/// Matching is case-insensitive, on the whole token or on `pattern=` prefix.
/// `-c` therefore also covers `-C`.
pub const BLOCKED_ARGUMENTS: &[&str] = &[
    // Repository and work tree location
    "--git-dir",
    "--work-tree",
    "--namespace",
    "--super-prefix",
    // Configuration injection
    "-c",
    "--config",
    "--config-env",
    // External programs and protocol helpers
    "--exec",
    "--exec-path",
    "--upload-pack",
    "--receive-pack",
    "--ext-diff",
    // Reading or writing outside the repository
    "--output",
    "--no-index",
    "--contents",
    "--orderfile",
    // Working directory (also -C via -c above)
    "--chdir",
];

/// Short options rejected for every caller, matched case-sensitively
///
/// These take their value attached (`-O<orderfile>`), so any token starting
/// with the option is rejected. Case matters: `-o` is a harmless flag for
/// `ls-files`.
pub const BLOCKED_SHORT_OPTIONS: &[&str] = &["-O"];

/// The only variables extra environment may carry
///
/// Author identity for the checkpoint commit. Anything else could point git
/// at another program or inject configuration.
pub const ALLOWED_EXTRA_ENV: &[&str] = &[
    "GIT_AUTHOR_NAME",
    "GIT_AUTHOR_EMAIL",
    "GIT_AUTHOR_DATE",
    "GIT_COMMITTER_NAME",
    "GIT_COMMITTER_EMAIL",
    "GIT_COMMITTER_DATE",
];
