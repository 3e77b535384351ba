// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PowerShell transport.
//!
//! Each session spawns its own local `pwsh` child with piped stdio and
//! keeps one remote PSSession (`$avian`) alive inside it. Commands are
//! written to stdin wrapped in try/catch and the result is read back up
//! to a per-command marker line, so a wedged remote command cannot
//! desynchronize the stream: the marker never arrives and the timeout
//! fires instead.

use crate::session::{Session, SessionError, Shell};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::debug;

/// Default timeout for remote commands. `run` is exempt: it blocks for
/// the whole script lifetime.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for opening the PSSession (WinRM auth handshake included).
const OPEN_TIMEOUT: Duration = Duration::from_secs(60);

/// Factory for PowerShell-backed sessions.
#[derive(Debug, Clone)]
pub struct PowerShell {
    program: String,
}

impl PowerShell {
    /// Use the default interpreter (`pwsh`).
    pub fn new() -> Self {
        Self::with_program("pwsh")
    }

    /// Use a specific interpreter, e.g. `powershell.exe`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn open_session(
        &self,
        host: &str,
        username: &str,
        password: &str,
        delegated: bool,
    ) -> Result<PsSession, SessionError> {
        let mut child = Command::new(&self.program)
            .args(["-NoLogo", "-NoProfile", "-NonInteractive", "-Command", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::OpenFailed(host.to_string(), e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::Io("no stdin pipe".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::Io("no stdout pipe".to_string()))?;

        let session = PsSession {
            hostname: host.to_string(),
            inner: Mutex::new(PsProcess {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            }),
        };

        let auth = if delegated {
            " -Authentication Credssp"
        } else {
            ""
        };
        let open_cmd = format!(
            "$ErrorActionPreference = 'Stop'; \
             $avianPass = ConvertTo-SecureString {} -AsPlainText -Force; \
             $avianCred = New-Object System.Management.Automation.PSCredential({}, $avianPass); \
             $avian = New-PSSession -ComputerName {} -Credential $avianCred{}",
            quote(password),
            quote(username),
            quote(host),
            auth,
        );
        session
            .execute(&open_cmd, Some(OPEN_TIMEOUT))
            .await
            .map_err(|e| SessionError::OpenFailed(host.to_string(), e.to_string()))?;

        debug!(host, delegated, "opened powershell session");
        Ok(session)
    }
}

impl Default for PowerShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Shell for PowerShell {
    type Session = PsSession;

    async fn open(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<PsSession, SessionError> {
        self.open_session(host, username, password, false).await
    }

    async fn open_delegated(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<PsSession, SessionError> {
        self.open_session(host, username, password, true).await
    }
}

struct PsProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// One live PowerShell session against a worker host.
pub struct PsSession {
    hostname: String,
    inner: Mutex<PsProcess>,
}

impl PsSession {
    /// Run one command in the local interpreter and collect output up to
    /// the marker line. Returns the output, or the message of whatever
    /// the command threw.
    async fn execute(
        &self,
        cmd: &str,
        timeout: Option<Duration>,
    ) -> Result<String, SessionError> {
        let marker = format!("__avian_{}", uuid::Uuid::new_v4().simple());
        // One physical line: the interpreter evaluates on newline.
        let wrapped = format!(
            "try {{ {} ; Write-Output '{marker} OK' }} catch {{ Write-Output (\"{marker} ERR \" + $_.Exception.Message) }}\n",
            cmd.replace('\n', " "),
        );

        let mut proc = self.inner.lock().await;
        proc.stdin.write_all(wrapped.as_bytes()).await?;
        proc.stdin.flush().await?;

        let mut output = String::new();
        loop {
            let mut line = String::new();
            let read = proc.stdout.read_line(&mut line);
            let n = match timeout {
                Some(t) => tokio::time::timeout(t, read).await.map_err(|_| {
                    SessionError::Timeout(first_words(cmd), t.as_secs())
                })??,
                None => read.await?,
            };
            if n == 0 {
                return Err(SessionError::Io("powershell process closed".to_string()));
            }
            let line = line.trim_end();
            if let Some(rest) = line.strip_prefix(&marker) {
                let rest = rest.trim_start();
                return match rest.strip_prefix("ERR") {
                    Some(msg) => Err(SessionError::CommandFailed(msg.trim().to_string())),
                    None => Ok(output),
                };
            }
            output.push_str(line);
            output.push('\n');
        }
    }

    /// Execute inside the remote PSSession.
    async fn invoke(&self, script: &str, timeout: Option<Duration>) -> Result<String, SessionError> {
        let cmd = format!("Invoke-Command -Session $avian -ScriptBlock {{ {script} }}");
        self.execute(&cmd, timeout).await
    }
}

#[async_trait]
impl Session for PsSession {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn check_path(&self, path: &str) -> Result<(), SessionError> {
        let out = self
            .invoke(
                &format!("Test-Path -Path {}", quote(path)),
                Some(COMMAND_TIMEOUT),
            )
            .await?;
        if out.trim().starts_with("False") {
            return Err(SessionError::CommandFailed(format!("no such path: {path}")));
        }
        Ok(())
    }

    async fn remove_item(&self, path: &str) -> Result<(), SessionError> {
        self.invoke(
            &format!("Remove-Item -Path {} -Force -Recurse", quote(path)),
            Some(COMMAND_TIMEOUT),
        )
        .await
        .map(drop)
    }

    async fn create_file(&self, dir: &str, name: &str, data: &[u8]) -> Result<(), SessionError> {
        // Stage locally, then copy into the session.
        let staging = std::env::temp_dir().join(format!("avian-{}", name));
        tokio::fs::write(&staging, data).await?;

        let result = self
            .execute(
                &format!(
                    "Copy-Item {} -Destination {} -Force -ToSession $avian",
                    quote(&staging.to_string_lossy()),
                    quote(&format!("{dir}\\{name}")),
                ),
                Some(COMMAND_TIMEOUT),
            )
            .await;

        let _ = tokio::fs::remove_file(&staging).await;
        result.map(drop)
    }

    async fn copy_tree(&self, src: &str, dst: &str) -> Result<(), SessionError> {
        self.execute(
            &format!(
                "Copy-Item {} -Destination {} -Force -Recurse -ToSession $avian",
                quote(src),
                quote(dst),
            ),
            // Script trees can be large; give the copy run-level patience.
            Some(Duration::from_secs(600)),
        )
        .await
        .map(drop)
    }

    async fn set_env(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.invoke(
            &format!("$Env:{} = {}", key, quote(value)),
            Some(COMMAND_TIMEOUT),
        )
        .await
        .map(drop)
    }

    async fn set_working_dir(&self, path: &str) -> Result<(), SessionError> {
        self.check_path(path).await?;
        self.invoke(
            &format!("Set-Location {}", quote(path)),
            Some(COMMAND_TIMEOUT),
        )
        .await
        .map(drop)
    }

    async fn run(&self, program: &str, args: &[String]) -> Result<(), SessionError> {
        let arg_list = args
            .iter()
            .map(|a| quote(a))
            .collect::<Vec<_>>()
            .join(", ");
        let script = format!(
            "$p = Start-Process -FilePath {} -ArgumentList {} -NoNewWindow -Wait -PassThru; \
             if ($p.ExitCode -ne 0) {{ throw ('exit code: ' + $p.ExitCode) }}",
            quote(&format!(".\\{program}")),
            arg_list,
        );
        // No timeout: this blocks for the whole script lifetime.
        self.invoke(&script, None).await.map(drop)
    }

    async fn enable_delegation(&self) -> Result<(), SessionError> {
        // Server role inside the session: the host accepts delegation.
        self.invoke(
            "Enable-WSManCredSSP -Role 'Server' -Force",
            Some(COMMAND_TIMEOUT),
        )
        .await?;
        // Client role on the orchestrator, naming the host as delegate.
        self.execute(
            &format!(
                "Enable-WSManCredSSP -Role 'Client' -DelegateComputer {} -Force",
                quote(&self.hostname),
            ),
            Some(COMMAND_TIMEOUT),
        )
        .await
        .map(drop)
    }

    async fn close(&self) -> Result<(), SessionError> {
        let close_result = self
            .execute("Remove-PSSession -Session $avian", Some(COMMAND_TIMEOUT))
            .await;
        let mut proc = self.inner.lock().await;
        let _ = proc.stdin.write_all(b"exit\n").await;
        let _ = proc.stdin.flush().await;
        match tokio::time::timeout(Duration::from_secs(5), proc.child.wait()).await {
            Ok(Ok(_)) => {}
            _ => {
                let _ = proc.child.start_kill();
            }
        }
        close_result.map(drop)
    }
}

/// Single-quote a string for PowerShell, doubling embedded quotes.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn first_words(cmd: &str) -> String {
    cmd.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "powershell_tests.rs"]
mod tests;
