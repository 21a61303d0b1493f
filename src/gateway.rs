use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::audit::AuditLogger;
use crate::config::{Config, GatewaySettings};
use crate::error::{GatewayError, GatewayResult};
use crate::error_translation::{FailureClassifier, OutcomeRenderer};
use crate::git::{
    GitExecutor, GitRunner, Invocation, RepositoryResolver, ResolvedRepository,
};
use crate::security::{tokenize, CommandValidator, InvocationTrust};

/// A single call into the gateway
///
/// External callers can only send a raw command string. Pre-built argument
/// vectors and extra environment are reserved for the internal workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayRequest {
    External {
        repository: String,
        command: String,
    },
    Internal {
        repository: String,
        argv: Vec<String>,
        env: BTreeMap<String, String>,
    },
}

impl GatewayRequest {
    pub fn external(repository: impl Into<String>, command: impl Into<String>) -> Self {
        GatewayRequest::External {
            repository: repository.into(),
            command: command.into(),
        }
    }

    pub fn internal<I, S>(repository: impl Into<String>, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GatewayRequest::Internal {
            repository: repository.into(),
            argv: argv.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }

    /// Attach extra environment; ignored for external requests
    pub fn with_env(mut self, extra: BTreeMap<String, String>) -> Self {
        if let GatewayRequest::Internal { env, .. } = &mut self {
            env.extend(extra);
        }
        self
    }

    pub fn trust(&self) -> InvocationTrust {
        match self {
            GatewayRequest::External { .. } => InvocationTrust::External,
            GatewayRequest::Internal { .. } => InvocationTrust::Internal,
        }
    }

    pub fn repository(&self) -> &str {
        match self {
            GatewayRequest::External { repository, .. }
            | GatewayRequest::Internal { repository, .. } => repository,
        }
    }

    /// The command as the caller expressed it, for logs
    pub fn command_text(&self) -> String {
        match self {
            GatewayRequest::External { command, .. } => command.clone(),
            GatewayRequest::Internal { argv, .. } => argv.join(" "),
        }
    }
}

/// A configured repository and whether it currently resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryListing {
    pub name: String,
    pub path: String,
    pub available: bool,
}

/// Everything a request needs once it has passed validation and resolution
struct Prepared {
    trust: InvocationTrust,
    repo: ResolvedRepository,
    argv: Vec<String>,
    env: BTreeMap<String, String>,
}

/// The secure command-execution gateway
///
/// Holds no mutable state between calls. Concurrent calls against the same
/// repository are not serialised.
pub struct Gateway {
    settings: GatewaySettings,
    resolver: RepositoryResolver,
    validator: CommandValidator,
    classifier: FailureClassifier,
    runner: Box<dyn GitRunner>,
    audit: Option<AuditLogger>,
}

impl Gateway {
    pub fn new(
        settings: GatewaySettings,
        resolver: RepositoryResolver,
        runner: Box<dyn GitRunner>,
    ) -> Self {
        let classifier = FailureClassifier::from_settings(&settings);
        Self {
            settings,
            resolver,
            validator: CommandValidator::new(),
            classifier,
            runner,
            audit: None,
        }
    }

    /// Build a gateway that runs the configured git binary
    pub fn from_config(config: &Config) -> Self {
        let runner = GitExecutor::from_settings(&config.gateway);
        Self::new(
            config.gateway.clone(),
            RepositoryResolver::new(config.snapshot()),
            Box::new(runner),
        )
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run a request and return its structured outcome
    pub async fn execute(&self, request: GatewayRequest) -> GatewayResult<String> {
        let trust = request.trust();
        let repository = request.repository().to_string();
        let command_text = request.command_text();

        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(error) => {
                warn!(
                    "Rejected {} request for '{}': {}",
                    trust.as_str(),
                    repository,
                    error
                );
                self.audit_rejection(trust, &repository, &command_text, &error);
                return Err(error);
            }
        };

        self.run(prepared).await
    }

    /// Run a request and render the outcome as text
    ///
    /// Never fails: every category ends up as a message for the caller.
    pub async fn respond(&self, request: GatewayRequest) -> String {
        OutcomeRenderer::render(&self.execute(request).await)
    }

    /// List configured repositories with their current availability
    pub fn list_repositories(&self) -> Vec<RepositoryListing> {
        self.resolver
            .snapshot()
            .entries()
            .iter()
            .map(|entry| RepositoryListing {
                name: entry.name.clone(),
                path: entry.path.clone(),
                available: self.resolver.resolve(&entry.name).is_some(),
            })
            .collect()
    }

    fn prepare(&self, request: GatewayRequest) -> GatewayResult<Prepared> {
        let trust = request.trust();

        let (repository, argv, env) = match request {
            GatewayRequest::External {
                repository,
                command,
            } => {
                self.validator
                    .check_length(&command, self.settings.max_command_length)?;
                (repository, tokenize(&command), BTreeMap::new())
            }
            GatewayRequest::Internal {
                repository,
                argv,
                env,
            } => (repository, argv, env),
        };

        if repository.trim().is_empty() {
            return Err(GatewayError::InvalidInput(
                "A repository name or path is required".to_string(),
            ));
        }

        self.validator.validate(&argv, trust)?;
        self.validator.check_environment(&env)?;

        let repo = self
            .resolver
            .resolve(&repository)
            .ok_or_else(|| GatewayError::RepositoryNotFound {
                requested: repository.clone(),
                available: self
                    .resolver
                    .snapshot()
                    .names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })?;

        debug!(
            "Resolved '{}' to {} for {} invocation",
            repository,
            repo.path().display(),
            trust.as_str()
        );

        Ok(Prepared {
            trust,
            repo,
            argv,
            env,
        })
    }

    async fn run(&self, prepared: Prepared) -> GatewayResult<String> {
        let invocation = Invocation {
            repo: &prepared.repo,
            argv: &prepared.argv,
            env: &prepared.env,
        };

        let result = self
            .runner
            .run(invocation)
            .await
            .map_err(|failure| self.classifier.classify(failure));

        let outcome = match &result {
            Ok(_) => "ok",
            Err(error) => error.category().as_str(),
        };
        info!(
            "{} git {} in {}: {}",
            prepared.trust.as_str(),
            prepared.argv.first().map(String::as_str).unwrap_or(""),
            prepared.repo.path().display(),
            outcome
        );
        self.audit_invocation(&prepared, outcome);

        result
    }

    fn audit_invocation(&self, prepared: &Prepared, outcome: &str) {
        let Some(audit) = &self.audit else { return };
        if let Err(e) =
            audit.log_invocation(prepared.trust, prepared.repo.path(), &prepared.argv, outcome)
        {
            warn!("Failed to write audit log {}: {}", audit.log_path().display(), e);
        }
    }

    fn audit_rejection(
        &self,
        trust: InvocationTrust,
        repository: &str,
        command: &str,
        error: &GatewayError,
    ) {
        let Some(audit) = &self.audit else { return };
        if let Err(e) = audit.log_rejection(trust, repository, command, &rejection_reason(error)) {
            warn!("Failed to write audit log {}: {}", audit.log_path().display(), e);
        }
    }
}

/// Category plus the rule that fired; never the matched pattern or key
fn rejection_reason(error: &GatewayError) -> String {
    match error {
        GatewayError::SecurityRejection(rejection) => {
            format!("{}:{}", error.category(), rejection.kind())
        }
        other => other.category().to_string(),
    }
}
