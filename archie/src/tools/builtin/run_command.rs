//! run_command tool - run an allow-listed command inside the sandbox
//!
//! The command line is split into words and the program is spawned directly,
//! never through a shell, so there is no globbing or variable expansion.
//! Every argument that could name a path must resolve inside the sandbox.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use super::truncate_chars;
use crate::tools::{ParamKind, ParamSpec, ParamValue, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Shell syntax that would chain or redirect past the allow-list
const SHELL_OPERATORS: &[&str] = &[";", "&", "|", "`", "$(", ">", "<", "\n"];

/// find actions that delete, execute or write files
const FIND_BLOCKED: &[&str] = &[
    "-delete", "-exec", "-execdir", "-ok", "-okdir", "-fprint", "-fprint0", "-fprintf", "-fls",
];

/// Execute an allow-listed command with the sandbox as working directory
pub struct RunCommandTool;

impl RunCommandTool {
    /// Split the command, check its program against the allow-list, and reject chaining
    ///
    /// Returns the lowercased program and its arguments.
    fn parse_command(command: &str, allowed: &[String]) -> Result<(String, Vec<String>), ToolError> {
        let mut words = split_words(command)?;
        let base = if words.is_empty() {
            String::new()
        } else {
            words.remove(0).to_lowercase()
        };
        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&base)) {
            return Err(ToolError::CommandNotAllowed {
                command: base,
                allowed: allowed.join(", "),
            });
        }
        if let Some(op) = SHELL_OPERATORS.iter().find(|op| command.contains(*op)) {
            return Err(ToolError::InvalidArgument(format!(
                "Shell operator {:?} is not allowed",
                op
            )));
        }
        Ok((base, words))
    }

    /// Check every argument that could name a file against the sandbox
    fn check_arguments(program: &str, args: &[String], cwd: &Path, ctx: &ToolContext) -> Result<(), ToolError> {
        for arg in args {
            if program == "find" && FIND_BLOCKED.contains(&arg.as_str()) {
                return Err(ToolError::InvalidArgument(format!("find action {:?} is not allowed", arg)));
            }
            let Some(path) = path_part(arg) else {
                continue;
            };
            if path.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:")) {
                return Err(ToolError::InvalidArgument(format!("Local file URL {:?} is not allowed", path)));
            }
            if path.is_empty() || path.contains("://") {
                continue;
            }
            ctx.resolve(&cwd.join(path).to_string_lossy())?;
        }
        Ok(())
    }
}

/// Split a command line into words, honouring single and double quotes
fn split_words(command: &str) -> Result<Vec<String>, ToolError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in command.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(ToolError::InvalidArgument("Unterminated quote in command".into()));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// The part of an argument that may name a file
///
/// `--opt=value` yields the value, `-xVALUE` yields `VALUE`, a bare
/// `--opt` yields nothing, anything else is taken whole.
fn path_part(arg: &str) -> Option<&str> {
    if let Some(long) = arg.strip_prefix("--") {
        return long.split_once('=').map(|(_, value)| value);
    }
    if arg.starts_with('-') {
        return arg.get(2..);
    }
    Some(arg)
}

/// Read a child pipe to the end, failing once more than `limit` bytes arrive
async fn read_capped<R: AsyncRead + Unpin>(pipe: Option<R>, limit: usize) -> Result<Vec<u8>, ToolError> {
    let Some(pipe) = pipe else {
        return Ok(Vec::new());
    };
    let mut buf = Vec::new();
    pipe.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(ToolError::OutputTooLarge { limit });
    }
    Ok(buf)
}

#[async_trait]
impl Tool for RunCommandTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "run_command",
            "Run a safe command (no shell features). Only allow-listed commands are accepted and file arguments must stay inside the sandbox.",
        )
        .param(ParamSpec::required("command", ParamKind::Text, "Command to run"))
        .param(ParamSpec::with_default(
            "directory",
            ParamKind::Text,
            "Directory to run in",
            ParamValue::Text(".".into()),
        ))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "RunCommandTool::execute: called");
        let command = params.require_text("command")?;
        let directory = params.text("directory").unwrap_or_else(|| ".".into());
        let limits = &ctx.limits;

        let (program, args) = Self::parse_command(&command, &limits.allowed_commands)?;
        let cwd = ctx.resolve(&directory)?;
        if !cwd.is_dir() {
            return Err(ToolError::NotFound { path: directory });
        }
        Self::check_arguments(&program, &args, &cwd, ctx)?;

        debug!(%program, ?args, ?cwd, "RunCommandTool::execute: spawning command");
        let mut child = tokio::process::Command::new(&program)
            .args(&args)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let run = async move {
            tokio::try_join!(
                read_capped(stdout, limits.max_command_buffer),
                read_capped(stderr, limits.max_command_buffer),
                async { child.wait().await.map_err(ToolError::from) },
            )
        };
        let (stdout, stderr, status) = match tokio::time::timeout(Duration::from_millis(limits.command_timeout_ms), run).await
        {
            Ok(result) => result?,
            Err(_) => {
                debug!("RunCommandTool::execute: command timed out");
                return Err(ToolError::CommandTimeout {
                    timeout_ms: limits.command_timeout_ms,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&stdout);
        let stderr = String::from_utf8_lossy(&stderr);
        let output = if stdout.is_empty() { stderr } else { stdout };
        let output = truncate_chars(&output, limits.max_command_output, "\n... [output truncated]");
        debug!(status = ?status, len = output.len(), "RunCommandTool::execute: command completed");

        if !status.success() {
            return Err(ToolError::CommandFailed {
                code: status.code().unwrap_or(-1),
                output,
            });
        }

        if output.is_empty() {
            Ok("Command ran with no output".to_string())
        } else {
            Ok(output)
        }
    }
}
