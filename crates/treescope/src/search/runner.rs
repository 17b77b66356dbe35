//! Child-process execution with capture, timeout, and stderr sanitizing.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Exit code reserved for timed-out commands.
pub const EXIT_TIMEOUT: i32 = 124;

/// Exit code reserved for missing executables.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Captured result of one child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    fn error(exit_code: i32, message: String) -> Self {
        CommandOutput {
            exit_code,
            stdout: Vec::new(),
            stderr: message.into_bytes(),
        }
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

// Probing PATH repeatedly is wasteful; results hold for the process lifetime.
static COMMAND_EXISTS: Lazy<Mutex<HashMap<String, bool>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// True if `command` resolves to an executable on PATH (cached).
pub fn command_on_path(command: &str) -> bool {
    if let Some(&cached) = COMMAND_EXISTS.lock().get(command) {
        return cached;
    }
    let exists = resolve_on_path(command);
    COMMAND_EXISTS.lock().insert(command.to_string(), exists);
    exists
}

fn resolve_on_path(command: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    for dir in std::env::split_paths(&paths) {
        let candidate = dir.join(command);
        if is_executable(&candidate) {
            return true;
        }
        #[cfg(windows)]
        {
            if is_executable(&dir.join(format!("{command}.exe"))) {
                return true;
            }
        }
    }
    false
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Missing required search binaries, by name.
pub fn missing_commands() -> Vec<&'static str> {
    ["fd", "rg"]
        .into_iter()
        .filter(|cmd| !command_on_path(cmd))
        .collect()
}

/// Spawn a command, feed optional stdin, and wait with an optional timeout.
///
/// Never errors at this layer: timeouts come back as exit 124 and missing
/// binaries as exit 127, so merge logic can treat everything uniformly.
pub async fn run_command_capture(
    argv: &[String],
    stdin: Option<&[u8]>,
    timeout_ms: Option<u64>,
) -> CommandOutput {
    let Some(program) = argv.first() else {
        return CommandOutput::error(EXIT_NOT_FOUND, "empty command line".to_string());
    };
    if !command_on_path(program) {
        return CommandOutput::error(
            EXIT_NOT_FOUND,
            format!("command '{program}' not found on PATH"),
        );
    }

    let mut command = Command::new(program);
    command
        .args(&argv[1..])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Dropping the wait future (timeout) must not leak the child.
        .kill_on_drop(true);
    if stdin.is_some() {
        command.stdin(Stdio::piped());
    } else {
        command.stdin(Stdio::null());
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            return CommandOutput::error(
                EXIT_NOT_FOUND,
                format!("failed to spawn '{program}': {err}"),
            )
        }
    };

    if let (Some(bytes), Some(mut pipe)) = (stdin, child.stdin.take()) {
        if let Err(err) = pipe.write_all(bytes).await {
            tracing::debug!(error = %err, "failed writing stdin to child");
        }
        drop(pipe);
    }

    let wait = child.wait_with_output();
    let output = match timeout_ms {
        Some(ms) if ms > 0 => {
            match tokio::time::timeout(std::time::Duration::from_millis(ms), wait).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    // The dropped future kills and reaps the child.
                    return CommandOutput::error(EXIT_TIMEOUT, format!("timeout after {ms} ms"));
                }
            }
        }
        _ => wait.await,
    };

    match output {
        Ok(output) => CommandOutput {
            exit_code: output.status.code().unwrap_or(1),
            stdout: output.stdout,
            stderr: output.stderr,
        },
        Err(err) => CommandOutput::error(1, format!("failed waiting for '{program}': {err}")),
    }
}

static PERMISSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)permission denied|access (?:is )?denied|operation not permitted|\(os error 13\)|\(os error 5\)")
        .unwrap()
});

static SENSITIVE_PATHS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"/private/etc/[^\s:]+").unwrap(), "/private/etc/[redacted]"),
        (Regex::new(r"/etc/[^\s:]+").unwrap(), "/etc/[redacted]"),
        (Regex::new(r"/var/[^\s:]+").unwrap(), "/var/[redacted]"),
        (Regex::new(r"/sys/[^\s:]+").unwrap(), "/sys/[redacted]"),
        (Regex::new(r"/proc/[^\s:]+").unwrap(), "/proc/[redacted]"),
        (Regex::new(r"/root/[^\s:]+").unwrap(), "/root/[redacted]"),
        (Regex::new(r"/boot/[^\s:]+").unwrap(), "/boot/[redacted]"),
        (
            Regex::new(r"[A-Za-z]:\\Windows\\[^\s:]+").unwrap(),
            r"C:\Windows\[redacted]",
        ),
        (
            Regex::new(r"[A-Za-z]:\\Program Files\\[^\s:]+").unwrap(),
            r"C:\Program Files\[redacted]",
        ),
    ]
});

/// Scrub stderr before it reaches a caller: collapse repeated permission
/// errors into one summary line and redact well-known system paths.
pub fn sanitize_error_message(message: &str) -> String {
    if message.is_empty() {
        return String::new();
    }

    let permission_lines = message
        .lines()
        .filter(|line| PERMISSION_LINE.is_match(line))
        .count();
    if permission_lines > 1 {
        return format!("Permission denied accessing {permission_lines} restricted paths");
    }
    if permission_lines == 1 && message.lines().count() == 1 {
        return "Permission denied accessing restricted paths".to_string();
    }

    let mut sanitized = message.to_string();
    for (pattern, replacement) in SENSITIVE_PATHS.iter() {
        sanitized = pattern.replace_all(&sanitized, *replacement).into_owned();
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_returns_127() {
        let argv = vec!["definitely-not-a-real-binary-42".to_string()];
        let output = run_command_capture(&argv, None, None).await;
        assert_eq!(output.exit_code, EXIT_NOT_FOUND);
        assert!(output.stderr_text().contains("not found"));
    }

    #[tokio::test]
    async fn captures_stdout_of_real_command() {
        if !command_on_path("echo") {
            return;
        }
        let argv = vec!["echo".to_string(), "hello".to_string()];
        let output = run_command_capture(&argv, None, None).await;
        assert_eq!(output.exit_code, 0);
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn timeout_returns_124_and_reaps_child() {
        if !command_on_path("sleep") {
            return;
        }
        let argv = vec!["sleep".to_string(), "5".to_string()];
        let started = std::time::Instant::now();
        let output = run_command_capture(&argv, None, Some(50)).await;
        assert_eq!(output.exit_code, EXIT_TIMEOUT);
        assert!(started.elapsed() < std::time::Duration::from_secs(4));
    }

    #[tokio::test]
    async fn stdin_is_piped_through() {
        if !command_on_path("cat") {
            return;
        }
        let argv = vec!["cat".to_string()];
        let output = run_command_capture(&argv, Some(b"piped"), None).await;
        assert_eq!(output.exit_code, 0);
        assert_eq!(String::from_utf8_lossy(&output.stdout), "piped");
    }

    #[test]
    fn command_cache_is_stable() {
        assert_eq!(command_on_path("nope-nope-nope"), false);
        assert_eq!(command_on_path("nope-nope-nope"), false);
    }

    #[test]
    fn collapses_repeated_permission_errors() {
        let stderr = "rg: /etc/shadow: Permission denied\nrg: /etc/sudoers: Permission denied";
        let sanitized = sanitize_error_message(stderr);
        assert_eq!(sanitized, "Permission denied accessing 2 restricted paths");
    }

    #[test]
    fn redacts_system_paths() {
        let stderr = "rg: /etc/passwd: No such file";
        let sanitized = sanitize_error_message(stderr);
        assert!(!sanitized.contains("passwd"));
        assert!(sanitized.contains("/etc/[redacted]"));
    }

    #[test]
    fn single_permission_line_is_summarized() {
        let sanitized = sanitize_error_message("rg: /opt/x: Permission denied");
        assert_eq!(sanitized, "Permission denied accessing restricted paths");
    }
}
