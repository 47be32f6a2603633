use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use pressroom_core::workspace::Workspace;
use tokio::process::Command;
use tracing::info;

use crate::config::{PublishConfig, PublishError};
use crate::publisher::{PublishResult, Publisher};

/// Publishes a site's HTML directory by committing it in place and
/// force-pushing to the configured branch.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    workspace: Workspace,
}

impl GitPublisher {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    async fn publish_dir(&self, config: &PublishConfig, slug: &str, dir: &Path) -> Result<PublishResult> {
        if !dir.join(".git").exists() {
            git(dir, ["init", "--quiet"]).await?;
        }
        git(dir, ["checkout", "--quiet", "-B", &config.branch]).await?;
        git(dir, ["add", "-A"]).await?;

        let status = git_output(dir, ["status", "--porcelain"]).await?;
        if status.trim().is_empty() {
            info!(site = %slug, branch = %config.branch, "nothing to publish");
            return Ok(PublishResult {
                commit_url: None,
                no_changes: true,
            });
        }

        let message = format!("Publish {} at {}", slug, Utc::now().to_rfc3339());
        git(
            dir,
            [
                "-c",
                &format!("user.name={}", config.commit_name),
                "-c",
                &format!("user.email={}", config.commit_email),
                "commit",
                "--quiet",
                "-m",
                &message,
            ],
        )
        .await?;

        let refspec = format!("HEAD:refs/heads/{}", config.branch);
        git(dir, ["push", "--force", "--quiet", &config.remote_url(), &refspec])
            .await
            // The remote may carry a token, keep it out of the error
            .map_err(|_| anyhow!("push to {} failed", config.repo_url))?;

        let sha = git_output(dir, ["rev-parse", "HEAD"]).await?;
        let sha = sha.trim();
        info!(
            site = %slug,
            repo = %config.repo_url,
            branch = %config.branch,
            commit = %sha,
            "published"
        );

        Ok(PublishResult {
            commit_url: config.commit_url(sha),
            no_changes: false,
        })
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, config: &PublishConfig, slug: &str) -> Result<PublishResult, PublishError> {
        let dir: PathBuf = self.workspace.site(slug).html;
        if !dir.is_dir() {
            return Err(PublishError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no generated site at {}", dir.display()),
            )));
        }
        self.publish_dir(config, slug, &dir)
            .await
            .map_err(PublishError::Git)
    }
}

async fn git<I, S>(cwd: &Path, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let output = git_in_dir(args, cwd).await?;
    if !output.status.success() {
        return Err(anyhow!(
            "git exited with {}: {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(())
}

async fn git_output<I, S>(cwd: &Path, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let output = git_in_dir(args, cwd).await?;
    if !output.status.success() {
        return Err(anyhow!("git exited with {}", output.status.code().unwrap_or(-1)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn git_in_dir<I, S>(args: I, cwd: &Path) -> Result<std::process::Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cmd = Command::new("git");
    cmd.current_dir(cwd);
    for arg in args {
        cmd.arg(arg.as_ref());
    }
    let output = cmd
        .output()
        .await
        .with_context(|| format!("failed to run git in {}", cwd.display()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn local_config(remote: &Path) -> PublishConfig {
        PublishConfig {
            repo_url: remote.display().to_string(),
            branch: "gh-pages".into(),
            token: None,
            commit_name: "Test".into(),
            commit_email: "test@example.invalid".into(),
            use_ssh: true,
        }
    }

    #[tokio::test]
    async fn test_missing_site_dir() {
        let tmp = TempDir::new().unwrap();
        let publisher = GitPublisher::new(Workspace::new(tmp.path()));
        let err = publisher
            .publish(&local_config(tmp.path()), "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Io(_)));
    }

    #[tokio::test]
    async fn test_publish_then_no_changes() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let remote = tmp.path().join("remote.git");
        std::fs::create_dir_all(&remote).unwrap();
        git(&remote, ["init", "--quiet", "--bare"]).await.unwrap();

        let workspace = Workspace::new(tmp.path().join("ws"));
        let html = workspace.site("demo").html;
        std::fs::create_dir_all(&html).unwrap();
        std::fs::write(html.join("index.html"), "<h1>hi</h1>").unwrap();

        let publisher = GitPublisher::new(workspace);
        let config = local_config(&remote);

        let first = publisher.publish(&config, "demo").await.unwrap();
        assert!(!first.no_changes);
        assert_eq!(first.commit_url, None, "local remotes have no browser url");
        let branches = git_output(&remote, ["branch", "--list", "gh-pages"]).await.unwrap();
        assert!(branches.contains("gh-pages"));

        let second = publisher.publish(&config, "demo").await.unwrap();
        assert!(second.no_changes);
    }
}
