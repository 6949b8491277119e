//! ipmitool subprocess executor.
//! Composes the lanplus invocation from fixed connection parameters, runs it
//! through an `AgentRunner` and retries under a `RetryPolicy`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use super::retry::RetryPolicy;

pub const DEFAULT_AGENT: &str = "ipmitool";
const REDACTED: &str = "******";

/// BMC password. Never printed; only `expose` yields the raw value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub username: String,
    pub password: Credential,
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: Credential) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
        }
    }
}

/// One agent invocation: connection prefix plus whitespace-split command tokens.
pub struct Invocation<'a> {
    params: &'a ConnectionParams,
    tokens: Vec<String>,
}

impl<'a> Invocation<'a> {
    pub fn new(params: &'a ConnectionParams, command: &str) -> Self {
        Self {
            params,
            tokens: command.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Arguments handed to the agent process. Contains the raw password.
    pub fn args(&self) -> Vec<String> {
        self.compose(self.params.password.expose())
    }

    /// Full command line safe for logs.
    pub fn redacted(&self, program: &str) -> String {
        let mut line = vec![program.to_string()];
        line.extend(self.compose(REDACTED));
        line.join(" ")
    }

    fn compose(&self, password: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "-I",
            "lanplus",
            "-H",
            self.params.host.as_str(),
            "-U",
            self.params.username.as_str(),
            "-P",
            password,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend(self.tokens.iter().cloned());
        args
    }
}

/// Raw result of one agent process run.
#[derive(Debug, Clone, Default)]
pub struct AgentOutput {
    pub success: bool,
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Why a single attempt failed. Both kinds are retried the same way.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("agent exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("failed to run agent: {0}")]
    Spawn(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Seam between the executor and the external management agent.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Program name shown in diagnostics.
    fn program(&self) -> &str;

    async fn run(&self, args: &[String]) -> std::io::Result<AgentOutput>;
}

/// Spawns the real agent binary.
pub struct IpmitoolRunner {
    program: String,
}

impl IpmitoolRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for IpmitoolRunner {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT)
    }
}

#[async_trait]
impl AgentRunner for IpmitoolRunner {
    fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, args: &[String]) -> std::io::Result<AgentOutput> {
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(AgentOutput {
            success: output.status.success(),
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

pub struct CommandExecutor {
    params: ConnectionParams,
    runner: Arc<dyn AgentRunner>,
    policy: RetryPolicy,
}

impl CommandExecutor {
    pub fn new(params: ConnectionParams, runner: Arc<dyn AgentRunner>, policy: RetryPolicy) -> Self {
        Self { params, runner, policy }
    }

    /// Executor backed by the real `ipmitool` binary with the default policy.
    pub fn ipmitool(params: ConnectionParams) -> Self {
        Self::new(params, Arc::new(IpmitoolRunner::default()), RetryPolicy::default())
    }

    pub fn host(&self) -> &str {
        &self.params.host
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `command` under the executor's own policy.
    pub async fn execute(&self, command: &str) -> Option<String> {
        self.execute_with(command, self.policy).await
    }

    /// Run `command`, retrying failed attempts. Returns trimmed stdout of the
    /// first successful attempt, or `None` once every attempt has failed.
    pub async fn execute_with(&self, command: &str, policy: RetryPolicy) -> Option<String> {
        let invocation = Invocation::new(&self.params, command);
        let args = invocation.args();
        let max = policy.max_attempts();

        for attempt in policy.attempts() {
            debug!(
                "Running command (attempt {}/{}): {}",
                attempt,
                max,
                invocation.redacted(self.runner.program())
            );

            match self.attempt(&args).await {
                Ok(stdout) => return Some(stdout),
                Err(AttemptError::NonZeroExit { code, stderr }) => {
                    error!(
                        "Command '{}' on {} exited with {} (attempt {}/{}): {}",
                        command, self.params.host, exit_label(&code), attempt, max, stderr
                    );
                }
                Err(AttemptError::Spawn(e)) => {
                    error!(
                        "Could not run {} for '{}' (attempt {}/{}): {}",
                        self.runner.program(), command, attempt, max, e
                    );
                }
            }

            if let Some(delay) = policy.delay_after(attempt) {
                tokio::time::sleep(delay).await;
            }
        }

        error!("Command '{}' on {} failed after {} attempts", command, self.params.host, max);
        None
    }

    async fn attempt(&self, args: &[String]) -> Result<String, AttemptError> {
        let output = self.runner.run(args).await?;

        if !output.success {
            return Err(AttemptError::NonZeroExit {
                code: output.status_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output.stdout.trim().to_string())
    }
}
