//! # Session 模块
//!
//! 一次播出会话：持有 [`Overlay`]，逐条执行宿主指令。
//!
//! 单条指令失败只记录错误，会话继续；只有读取输入失败才会中止会话。

use std::fs;
use std::io::BufRead;
use std::path::Path;

use overlay_runtime::effect::ACTIVE_EFFECT_ATTRIBUTE;
use overlay_runtime::{
    Document, Fragment, ModuleRegistry, Overlay, OverlayConfig, OverlayError, StyleTarget,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::command::{CommandError, HostCommand};

/// 会话错误
#[derive(Error, Debug)]
pub enum SessionError {
    /// 读取文件失败
    #[error("读取 {path} 失败: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 模板文档格式错误
    #[error("模板文档格式错误: {0}")]
    Document(#[from] serde_json::Error),

    /// 调度引擎错误
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// 指令错误
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// 指令执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteResult {
    /// 继续
    Ok,
    /// 状态报告
    Report(String),
    /// 结束会话
    Quit,
}

/// 会话统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// 执行成功的指令数
    pub executed: usize,
    /// 失败的指令数
    pub failed: usize,
}

/// 播出会话
#[derive(Debug)]
pub struct Session {
    overlay: Overlay,
}

impl Session {
    /// 用已构建的 overlay 创建会话
    pub fn new(overlay: Overlay) -> Self {
        Self { overlay }
    }

    /// 从模板文档文件创建会话
    pub fn open(
        document_path: impl AsRef<Path>,
        config: OverlayConfig,
        modules: &ModuleRegistry,
    ) -> Result<Self, SessionError> {
        let path = document_path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let root: Fragment = serde_json::from_str(&content)?;
        let overlay = Overlay::from_document(Document::from_fragment(root), config, modules)?;

        info!(path = %path.display(), "模板文档已加载");
        Ok(Self::new(overlay))
    }

    /// 调度上下文
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// 执行单条指令
    pub fn execute(&mut self, command: &HostCommand) -> Result<ExecuteResult, SessionError> {
        debug!(?command, "执行指令");
        match command {
            HostCommand::Play => self.overlay.play()?,
            HostCommand::Next => self.overlay.next()?,
            HostCommand::Stop => self.overlay.stop(),
            HostCommand::Update(payload) => self.overlay.update_payload(payload)?,
            HostCommand::Finished { element } => {
                self.overlay.transition_finished(element)?;
            }
            HostCommand::State => return Ok(ExecuteResult::Report(self.report())),
            HostCommand::Quit => return Ok(ExecuteResult::Quit),
        }
        Ok(ExecuteResult::Ok)
    }

    /// 解析并执行一行指令
    pub fn execute_line(&mut self, line: &str) -> Result<ExecuteResult, SessionError> {
        match HostCommand::parse(line)? {
            Some(command) => self.execute(&command),
            None => Ok(ExecuteResult::Ok),
        }
    }

    /// 逐行执行输入中的指令，状态报告写入 `report`
    pub fn run<R: BufRead>(
        &mut self,
        input: R,
        mut report: impl FnMut(&str),
    ) -> std::io::Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if HostCommand::parse(&line).is_ok_and(|command| command.is_none()) {
                continue;
            }

            match self.execute_line(&line) {
                Ok(ExecuteResult::Ok) => summary.executed += 1,
                Ok(ExecuteResult::Report(text)) => {
                    summary.executed += 1;
                    report(&text);
                }
                Ok(ExecuteResult::Quit) => {
                    summary.executed += 1;
                    break;
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(line = index + 1, "{e}");
                }
            }
        }
        Ok(summary)
    }

    /// 当前状态的单行描述：阶段、播放状态、各元素的活动效果
    pub fn report(&self) -> String {
        let mut text = format!(
            "stage={} state={:?}",
            self.overlay.stage_id(),
            self.overlay.state()
        );
        for controller in self.overlay.controllers() {
            let element = controller.element();
            let active = self
                .overlay
                .live_element(element)
                .and_then(|data| data.attribute(ACTIVE_EFFECT_ATTRIBUTE))
                .unwrap_or("-");
            text.push_str(&format!(" {element}={active}"));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_runtime::{ANIMATED_CLASS_SELECTOR, ANIMATIONS_ATTRIBUTE};

    fn session() -> Session {
        let root = Fragment::new("body").with_child(
            Fragment::new("div")
                .with_id("title")
                .with_class(ANIMATED_CLASS_SELECTOR)
                .with_attribute(
                    ANIMATIONS_ATTRIBUTE,
                    r#"[{"id": 1, "effects": [{"id": "in", "tags": ["fade-in"]}]}]"#,
                ),
        );
        let overlay = Overlay::from_document(
            Document::from_fragment(root),
            OverlayConfig::default(),
            &ModuleRegistry::default(),
        )
        .unwrap();
        Session::new(overlay)
    }

    #[test]
    fn test_execute_and_report() {
        let mut session = session();
        assert_eq!(session.report(), "stage=1 state=Idle title=-");

        assert_eq!(session.execute(&HostCommand::Play).unwrap(), ExecuteResult::Ok);
        assert_eq!(
            session.execute(&HostCommand::State).unwrap(),
            ExecuteResult::Report("stage=1 state=Playing title=in".to_string())
        );

        session
            .execute(&HostCommand::Finished {
                element: "title".to_string(),
            })
            .unwrap();
        assert_eq!(session.report(), "stage=1 state=Playing title=-");
    }

    #[test]
    fn test_failed_command_does_not_end_session() {
        let mut session = session();
        let input = "play\nfinished nobody\nrewind\n\n# comment\nstop\nquit\nplay\n";

        let mut reports = Vec::new();
        let summary = session
            .run(input.as_bytes(), |text| reports.push(text.to_string()))
            .unwrap();

        assert_eq!(
            summary,
            SessionSummary {
                executed: 3,
                failed: 2
            }
        );
        assert!(reports.is_empty());
        assert_eq!(session.overlay().state(), overlay_runtime::PlaybackState::Stopped);
    }
}
