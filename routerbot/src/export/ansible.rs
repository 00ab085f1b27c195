//! `ansible-playbook` backed export job.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info};
use secrecy::ExposeSecret;
use tokio::process::Command;

use super::{BatchRunner, JobOutcome};
use crate::device::RouterCredentials;
use crate::error::ExportError;

const PROGRAM: &str = "ansible-playbook";

/// Writes an ad-hoc playbook per run and executes it against one router.
pub struct AnsibleRunner {
    ansible_dir: PathBuf,
    artifact_name: String,
    credentials: RouterCredentials,
    timeout: Duration,
    program: String,
}

impl AnsibleRunner {
    /// The artifact is `show_run_{operator_id}_{router_name}.txt` inside
    /// `ansible_dir`.
    pub fn new(
        ansible_dir: impl Into<PathBuf>,
        operator_id: &str,
        router_name: &str,
        credentials: RouterCredentials,
        timeout: Duration,
    ) -> Self {
        Self {
            ansible_dir: ansible_dir.into(),
            artifact_name: artifact_name(operator_id, router_name),
            credentials,
            timeout,
            program: PROGRAM.to_string(),
        }
    }

    /// Run another executable instead of `ansible-playbook`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn playbook(&self, dest: &Path) -> String {
        let enable = self
            .credentials
            .enable_secret
            .as_ref()
            .map(|s| s.expose_secret().to_string())
            .unwrap_or_default();
        let become_ = if enable.is_empty() { "no" } else { "yes" };

        format!(
            r#"---
- name: Get running-config
  hosts: all
  gather_facts: no
  connection: network_cli
  collections: [cisco.ios]
  vars:
    ansible_network_os: cisco.ios.ios
    ansible_user: {user}
    ansible_password: {password}
    ansible_become: {become_}
    ansible_become_method: enable
    ansible_become_password: {enable}
    ansible_command_timeout: 120
    ansible_connect_timeout: 60
    ansible_ssh_common_args: "-o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null"
  tasks:
    - name: Run show running-config
      ios_command:
        commands:
          - show running-config
      register: runout

    - name: Save to file on controller
      delegate_to: localhost
      copy:
        content: "{{{{ runout.stdout[0] }}}}"
        dest: {dest}
        mode: "0644"
"#,
            user = yaml_quote(&self.credentials.username),
            password = yaml_quote(self.credentials.password.expose_secret()),
            enable = yaml_quote(&enable),
            dest = yaml_quote(&dest.to_string_lossy()),
        )
    }
}

impl BatchRunner for AnsibleRunner {
    fn artifact_name(&self) -> &str {
        &self.artifact_name
    }

    async fn run(&self, ip: &str) -> Result<JobOutcome, ExportError> {
        tokio::fs::create_dir_all(&self.ansible_dir).await?;
        let dest = std::path::absolute(self.ansible_dir.join(&self.artifact_name))?;

        // A stale artifact must not pass for this run's output.
        match tokio::fs::remove_file(&dest).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let mut playbook = tempfile::Builder::new()
            .prefix("routerbot-")
            .suffix(".yml")
            .tempfile()?;
        playbook.write_all(self.playbook(&dest).as_bytes())?;
        playbook.flush()?;

        info!("Running {} against {}", self.program, ip);
        let child = Command::new(&self.program)
            .arg("-i")
            .arg(format!("{ip},"))
            .arg(playbook.path())
            .current_dir(&self.ansible_dir)
            .env("ANSIBLE_HOST_KEY_CHECKING", "False")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExportError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExportError::Timeout(self.timeout))??;

        debug!("{} stdout:\n{}", self.program, String::from_utf8_lossy(&output.stdout));
        debug!("{} stderr:\n{}", self.program, String::from_utf8_lossy(&output.stderr));

        let artifact = tokio::fs::try_exists(&dest)
            .await
            .unwrap_or(false)
            .then_some(dest);

        Ok(JobOutcome {
            exit_code: output.status.code(),
            artifact,
        })
    }
}

/// `show_run_{operator_id}_{router_name}.txt`
pub fn artifact_name(operator_id: &str, router_name: &str) -> String {
    format!("show_run_{operator_id}_{router_name}.txt")
}

/// Double-quoted YAML scalar.
fn yaml_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn runner(dir: &Path) -> AnsibleRunner {
        AnsibleRunner::new(
            dir,
            "66070315",
            "CSR-1000V",
            RouterCredentials::new("admin", SecretString::from("cis\"co".to_string())),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(
            artifact_name("66070315", "CSR-1000V"),
            "show_run_66070315_CSR-1000V.txt"
        );
    }

    #[test]
    fn test_playbook_contents() {
        let runner = runner(Path::new("ansible"));
        let playbook = runner.playbook(Path::new("/srv/ansible/show_run.txt"));

        assert!(playbook.contains(r#"ansible_password: "cis\"co""#));
        assert!(playbook.contains("ansible_become: no"));
        assert!(playbook.contains(r#"dest: "/srv/ansible/show_run.txt""#));
        assert!(playbook.contains(r#"content: "{{ runout.stdout[0] }}""#));
    }

    #[test]
    fn test_become_with_enable_secret() {
        let mut runner = runner(Path::new("ansible"));
        runner.credentials = runner
            .credentials
            .clone()
            .with_enable_secret(SecretString::from("en".to_string()));
        assert!(runner.playbook(Path::new("/tmp/x")).contains("ansible_become: yes"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path()).with_program("routerbot-no-such-program");

        let err = runner.run("10.0.15.61").await.unwrap_err();
        assert!(matches!(err, ExportError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_artifact_is_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("show_run_66070315_CSR-1000V.txt");
        std::fs::write(&stale, "hostname OLD\n").unwrap();

        // Exits 0 without writing anything.
        let runner = runner(dir.path()).with_program("true");
        let outcome = runner.run("10.0.15.61").await.unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.artifact, None);
        assert!(!stale.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_job_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path()).with_program("false");

        let outcome = runner.run("10.0.15.61").await.unwrap();
        assert!(!outcome.succeeded());
        assert_eq!(outcome.artifact, None);
    }
}
