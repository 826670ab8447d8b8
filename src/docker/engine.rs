use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};

use super::client::DockerClient;
use super::error::{DockerError, Result};
use super::parse;
use super::run::{self, Captured};
use super::types::{
    CancelToken, ContainerStats, ContainerSummary, DiskUsageEntry, ImageSummary, NetworkSpec,
    NetworkSummary, PruneReport, ResourceType, StreamCommand, SystemInfo, VolumeSpec,
    VolumeSummary,
};

const JSON_FORMAT: &str = "{{json .}}";
const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Verify that the Docker daemon is reachable and return its version.
pub fn ensure_available(client: &dyn DockerClient) -> anyhow::Result<String> {
    client
        .ping()
        .context("docker daemon is not running or `docker` is not on PATH")
}

/// [`DockerClient`] backed by the `docker` command line.
///
/// The command may carry a prefix (`sudo -n docker`, `podman`), split with
/// shell quoting rules.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    prefix: Vec<String>,
    pull_timeout: Duration,
    command_timeout: Duration,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            prefix: Vec::new(),
            pull_timeout: DEFAULT_PULL_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client from a command line such as `"sudo -n docker"`.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let words =
            shell_words::split(line).map_err(|_| DockerError::InvalidCommand(line.to_string()))?;
        let mut words = words.into_iter();
        let program = words
            .next()
            .ok_or_else(|| DockerError::InvalidCommand(line.to_string()))?;
        Ok(Self {
            program,
            prefix: words.collect(),
            pull_timeout: DEFAULT_PULL_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        })
    }

    pub fn with_pull_timeout(mut self, timeout: Duration) -> Self {
        self.pull_timeout = timeout;
        self
    }

    /// Deadline for every command other than `pull`.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn full_args(&self, args: &[&str]) -> Vec<String> {
        self.prefix
            .iter()
            .cloned()
            .chain(args.iter().map(|a| a.to_string()))
            .collect()
    }

    fn capture(&self, args: &[&str]) -> Result<Captured> {
        debug!(program = %self.program, ?args, "running docker command");
        let cmd = StreamCommand {
            program: self.program.clone(),
            args: self.full_args(args),
            timeout: self.command_timeout,
        };
        run::capture(cmd, &CancelToken::new())
    }

    fn output(&self, args: &[&str]) -> Result<Captured> {
        let output = self.capture(args)?;
        if !output.success() {
            return Err(DockerError::CommandFailed {
                command: args.join(" "),
                code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// Run a command and return its stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        Ok(self.output(args)?.stdout)
    }

    fn stream_command(&self, args: &[&str]) -> StreamCommand {
        StreamCommand {
            program: self.program.clone(),
            args: self.full_args(args),
            timeout: self.pull_timeout,
        }
    }
}

fn daemon_unavailable(err: DockerError) -> DockerError {
    match err {
        DockerError::CommandFailed { .. } => DockerError::DaemonUnavailable(err.summary()),
        other => other,
    }
}

impl DockerClient for DockerCli {
    fn ping(&self) -> Result<String> {
        let version = self
            .run(&["version", "--format", "{{.Server.Version}}"])
            .map_err(daemon_unavailable)?;
        let version = version.trim();
        if version.is_empty() {
            return Err(DockerError::DaemonUnavailable(
                "server version is empty".into(),
            ));
        }
        Ok(version.to_string())
    }

    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let mut args = vec!["ps", "--format", JSON_FORMAT];
        if all {
            args.push("--all");
        }
        parse::parse_containers(&self.run(&args)?)
    }

    fn list_images(&self) -> Result<Vec<ImageSummary>> {
        parse::parse_images(&self.run(&["image", "ls", "--format", JSON_FORMAT])?)
    }

    fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let list = self.run(&["network", "ls", "--format", JSON_FORMAT])?;
        let ids: Vec<String> = parse::parse_networks(&list, None)?
            .into_iter()
            .map(|n| n.id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["network", "inspect"];
        args.extend(ids.iter().map(String::as_str));
        // IPAM details are decoration; a failed inspect (e.g. a network removed
        // between the two calls) still yields the plain list.
        let inspect = match self.run(&args) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "network inspect failed; listing without IPAM details");
                None
            }
        };
        parse::parse_networks(&list, inspect.as_deref())
    }

    fn list_volumes(&self) -> Result<Vec<VolumeSummary>> {
        let names = self.run(&["volume", "ls", "--quiet"])?;
        let names: Vec<&str> = names
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        // Volumes can vanish between the calls. `volume inspect` then exits
        // non-zero but still prints the ones it found.
        let dangling = match self.run(&["volume", "ls", "--quiet", "--filter", "dangling=true"]) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "dangling volume query failed; usage unknown");
                None
            }
        };
        let mut args = vec!["volume", "inspect"];
        args.extend(names.iter().copied());
        let inspect = self.capture(&args)?;
        if inspect.success() {
            return parse::parse_volumes(&inspect.stdout, dangling.as_deref());
        }

        warn!(stderr = %inspect.stderr.trim(), "volume inspect failed; using partial output");
        match parse::parse_volumes(&inspect.stdout, dangling.as_deref()) {
            Ok(rows) if !rows.is_empty() => Ok(rows),
            _ => Ok(parse::volumes_from_names(&names, dangling.as_deref())),
        }
    }

    fn start_container(&self, id: &str) -> Result<()> {
        self.run(&["container", "start", id]).map(drop)
    }

    fn stop_container(&self, id: &str) -> Result<()> {
        self.run(&["container", "stop", id]).map(drop)
    }

    fn restart_container(&self, id: &str) -> Result<()> {
        self.run(&["container", "restart", id]).map(drop)
    }

    fn container_logs(&self, id: &str, tail: usize) -> Result<String> {
        let tail = tail.to_string();
        let output = self.output(&["container", "logs", "--tail", &tail, id])?;
        // The CLI replays the container's stderr on its own stderr, so the
        // two streams arrive separately and are concatenated.
        let mut text = output.stdout;
        text.push_str(&output.stderr);
        Ok(text)
    }

    fn container_stats(&self, id: &str) -> Result<ContainerStats> {
        parse::parse_stats(&self.run(&[
            "container",
            "stats",
            "--no-stream",
            "--format",
            JSON_FORMAT,
            id,
        ])?)
    }

    fn pull_image(
        &self,
        name: &str,
        cancel: &CancelToken,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<()> {
        let cmd = self.stream_command(&["image", "pull", name]);
        run::run_to_completion(cmd, cancel, on_line).map(drop)
    }

    fn tag_image(&self, id: &str, repository: &str, tag: &str) -> Result<()> {
        let target = format!("{repository}:{tag}");
        self.run(&["image", "tag", id, &target]).map(drop)
    }

    fn create_network(&self, spec: &NetworkSpec) -> Result<String> {
        let mut args = vec!["network", "create", "--driver", spec.driver.as_str()];
        if let Some(subnet) = &spec.subnet {
            args.extend(["--subnet", subnet.as_str()]);
        }
        args.push(spec.name.as_str());
        Ok(self.run(&args)?.trim().to_string())
    }

    fn connect_network(&self, network: &str, container: &str) -> Result<()> {
        self.run(&["network", "connect", network, container])
            .map(drop)
    }

    fn disconnect_network(&self, network: &str, container: &str) -> Result<()> {
        self.run(&["network", "disconnect", network, container])
            .map(drop)
    }

    fn create_volume(&self, spec: &VolumeSpec) -> Result<String> {
        let opts: Vec<String> = spec
            .options
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let mut args = vec!["volume", "create", "--driver", spec.driver.as_str()];
        for opt in &opts {
            args.extend(["--opt", opt.as_str()]);
        }
        args.push(spec.name.as_str());
        Ok(self.run(&args)?.trim().to_string())
    }

    fn remove(&self, kind: ResourceType, id: &str, force: bool) -> Result<()> {
        let mut args = vec![kind.noun(), "rm"];
        if force && kind != ResourceType::Network {
            args.push("--force");
        }
        args.push(id);
        self.run(&args).map(drop)
    }

    fn prune(&self, kind: ResourceType) -> Result<PruneReport> {
        let text = self.run(&[kind.noun(), "prune", "--force"])?;
        Ok(parse::parse_prune_output(&text))
    }

    fn system_info(&self) -> Result<SystemInfo> {
        let text = self
            .run(&["system", "info", "--format", JSON_FORMAT])
            .map_err(daemon_unavailable)?;
        parse::parse_system_info(&text)
    }

    fn disk_usage(&self) -> Result<Vec<DiskUsageEntry>> {
        parse::parse_disk_usage(&self.run(&["system", "df", "--format", JSON_FORMAT])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_with_prefix() {
        let cli = DockerCli::from_command_line("sudo -n docker").unwrap();
        assert_eq!(cli.program(), "sudo");
        assert_eq!(
            cli.full_args(&["ps"]),
            vec!["-n".to_string(), "docker".into(), "ps".into()]
        );
    }

    #[test]
    fn command_line_honours_quotes() {
        let cli = DockerCli::from_command_line("'/opt/my docker/bin/docker'").unwrap();
        assert_eq!(cli.program(), "/opt/my docker/bin/docker");
        assert!(cli.full_args(&[]).is_empty());
    }

    #[test]
    fn blank_or_unbalanced_command_lines_are_rejected() {
        assert!(matches!(
            DockerCli::from_command_line("   "),
            Err(DockerError::InvalidCommand(_))
        ));
        assert!(matches!(
            DockerCli::from_command_line("docker 'oops"),
            Err(DockerError::InvalidCommand(_))
        ));
    }

    #[test]
    fn missing_binary_maps_to_not_installed() {
        let cli = DockerCli::from_command_line("no-such-docker-binary-1234").unwrap();
        assert!(matches!(cli.ping(), Err(DockerError::NotInstalled { .. })));
        assert!(ensure_available(&cli).is_err());
    }

    #[test]
    fn ensure_available_does_not_panic() {
        // We only assert it doesn't panic; CI may or may not have Docker.
        let _ = ensure_available(&DockerCli::new());
    }

    #[test]
    fn stream_command_carries_prefix_and_timeout() {
        let cli = DockerCli::from_command_line("podman --remote")
            .unwrap()
            .with_pull_timeout(Duration::from_secs(5));
        let cmd = cli.stream_command(&["image", "pull", "alpine"]);
        assert_eq!(cmd.program, "podman");
        assert_eq!(cmd.args, vec!["--remote", "image", "pull", "alpine"]);
        assert_eq!(cmd.timeout, Duration::from_secs(5));
    }

    #[cfg(unix)]
    fn scripted(dir: &tempfile::TempDir, body: &str) -> DockerCli {
        let path = dir.path().join("docker.sh");
        std::fs::write(&path, body).unwrap();
        DockerCli::from_command_line(&format!("sh '{}'", path.display())).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn volume_removed_between_calls_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let cli = scripted(
            &dir,
            r#"case "$1 $2 $4" in
  "volume ls --filter") echo gone ;;
  "volume ls "*) printf 'keep\ngone\n' ;;
  "volume inspect "*)
    echo '[{"Name":"keep","Driver":"local","Scope":"local"}]'
    echo 'Error response from daemon: get gone: no such volume' 1>&2
    exit 1 ;;
esac
"#,
        );
        let vols = cli.list_volumes().unwrap();
        assert_eq!(vols.len(), 1);
        assert_eq!(vols[0].name, "keep");
        assert!(vols[0].in_use);
        assert!(vols[0].is_local());
    }

    #[cfg(unix)]
    #[test]
    fn volume_names_survive_failed_inspect_and_usage_query() {
        let dir = tempfile::tempdir().unwrap();
        let cli = scripted(
            &dir,
            r#"case "$1 $2 $4" in
  "volume ls --filter") exit 1 ;;
  "volume ls "*) printf 'a\nb\n' ;;
  *) echo 'Error response from daemon: boom' 1>&2; exit 1 ;;
esac
"#,
        );
        let vols = cli.list_volumes().unwrap();
        let names: Vec<&str> = vols.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(vols.iter().all(|v| v.in_use));
    }

    #[cfg(unix)]
    #[test]
    fn hung_daemon_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let cli = scripted(&dir, "exec sleep 30\n")
            .with_command_timeout(Duration::from_millis(300));
        let started = std::time::Instant::now();
        assert!(matches!(cli.list_containers(true), Err(DockerError::TimedOut(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn failed_commands_carry_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let cli = scripted(
            &dir,
            "echo 'Error response from daemon: No such container: x' 1>&2\nexit 1\n",
        );
        let err = cli.stop_container("x").unwrap_err();
        assert_eq!(err.summary(), "No such container: x");
    }
}
