//! 可视化前端开发服务器
//!
//! 在独立进程组中启动 `npm run dev`，退出时向整个进程组发送 SIGTERM。

use anyhow::{Result, bail};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command as TokioCommand};

use crate::config::FrontendConfig;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// 运行中的前端进程
#[derive(Debug)]
pub struct FrontendProcess {
    child: Child,
}

impl FrontendProcess {
    /// 启动前端。未启用时返回 None；前端目录不存在时返回错误；命令无法执行时记录警告并返回 None。
    /// 不等待前端就绪，启动等待由调用方负责。
    pub fn start(config: &FrontendConfig) -> Result<Option<Self>> {
        if !config.enabled {
            tracing::debug!("前端已禁用");
            return Ok(None);
        }

        if !config.dir.is_dir() {
            bail!("Frontend directory not found: {}", config.dir.display());
        }

        let Some((program, args)) = config.command.split_first() else {
            bail!("Frontend command is empty");
        };

        tracing::info!(dir = %config.dir.display(), "🖥️ 正在启动前端服务...");

        let mut cmd = TokioCommand::new(program);
        cmd.args(args)
            .current_dir(&config.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(error = %e, program = %program, "⚠️ 前端启动失败，继续执行流程");
                return Ok(None);
            }
        };

        Ok(Some(Self { child }))
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// 终止前端进程组并等待退出，超时后强制结束
    pub async fn shutdown(mut self) {
        tracing::info!("正在关闭前端服务...");
        self.terminate();

        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "前端进程已退出"),
            Ok(Err(e)) => tracing::warn!(error = %e, "等待前端进程退出失败"),
            Err(_) => {
                tracing::warn!("前端进程未在限定时间内退出，强制结束");
                let _ = self.child.kill().await;
            }
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        // 进程以 process_group(0) 启动，进程组号等于其 pid
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGTERM) };
        if rc != 0 {
            tracing::warn!(error = %std::io::Error::last_os_error(), "向前端进程组发送SIGTERM失败");
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::warn!(error = %e, "结束前端进程失败");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_frontend_is_not_started() {
        let config = FrontendConfig {
            enabled: false,
            dir: PathBuf::from("/definitely/missing"),
            ..Default::default()
        };
        assert!(FrontendProcess::start(&config).unwrap().is_none());
    }

    #[test]
    fn test_missing_frontend_dir_is_fatal() {
        let config = FrontendConfig {
            dir: PathBuf::from("/definitely/missing"),
            ..Default::default()
        };
        assert!(FrontendProcess::start(&config).is_err());
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = FrontendConfig {
            dir: temp_dir.path().to_path_buf(),
            command: vec!["eduflow-no-such-binary".to_string()],
            startup_wait_secs: 0,
            ..Default::default()
        };
        assert!(FrontendProcess::start(&config).unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_terminates_process_group() {
        let temp_dir = TempDir::new().unwrap();
        let config = FrontendConfig {
            dir: temp_dir.path().to_path_buf(),
            command: vec!["sleep".to_string(), "30".to_string()],
            startup_wait_secs: 0,
            ..Default::default()
        };

        let frontend = FrontendProcess::start(&config).unwrap().unwrap();
        assert!(frontend.id().is_some());

        tokio::time::timeout(Duration::from_secs(10), frontend.shutdown())
            .await
            .unwrap();
    }

    /// 进程存在且不是僵尸进程
    #[cfg(target_os = "linux")]
    fn process_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => {
                stat.rsplit(')')
                    .next()
                    .and_then(|rest| rest.split_whitespace().next())
                    != Some("Z")
            }
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_shutdown_terminates_grandchildren() {
        let temp_dir = TempDir::new().unwrap();
        let config = FrontendConfig {
            dir: temp_dir.path().to_path_buf(),
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                "sleep 300 & echo $! > grandchild.pid; wait".to_string(),
            ],
            startup_wait_secs: 0,
            ..Default::default()
        };

        let frontend = FrontendProcess::start(&config).unwrap().unwrap();

        let pid_file = temp_dir.path().join("grandchild.pid");
        let mut pid = String::new();
        for _ in 0..500 {
            if let Ok(content) = std::fs::read_to_string(&pid_file)
                && content.ends_with('\n')
            {
                pid = content.trim().to_string();
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!pid.is_empty());
        assert!(process_running(&pid));

        tokio::time::timeout(Duration::from_secs(10), frontend.shutdown())
            .await
            .unwrap();

        let mut running = true;
        for _ in 0..500 {
            if !process_running(&pid) {
                running = false;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!running, "grandchild {} survived shutdown", pid);
    }
}
