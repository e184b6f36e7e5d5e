//! # Command 模块
//!
//! 宿主控制指令：播出控制端向 overlay 发送的一行文本命令。
//!
//! ## 格式
//!
//! ```text
//! # 注释与空行被忽略
//! play
//! update {"score": "2 : 1"}
//! finished title
//! next
//! stop
//! state
//! quit
//! ```

use serde_json::Value;
use thiserror::Error;

/// 注释前缀
const COMMENT_PREFIX: char = '#';

/// 宿主控制指令
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// 播放当前阶段
    Play,
    /// 推进到下一阶段并播放
    Next,
    /// 停止
    Stop,
    /// 更新变量（未解析的载荷）
    Update(Value),
    /// 元素的过渡完成信号
    Finished { element: String },
    /// 输出当前状态
    State,
    /// 结束会话
    Quit,
}

/// 指令解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// 未知指令
    #[error("未知指令 '{0}'")]
    Unknown(String),

    /// 缺少参数
    #[error("指令 '{0}' 缺少参数")]
    MissingArgument(&'static str),

    /// 多余参数
    #[error("指令 '{command}' 不接受参数: {argument}")]
    UnexpectedArgument {
        command: &'static str,
        argument: String,
    },

    /// 更新载荷不是合法 JSON
    #[error("更新载荷不是合法 JSON: {0}")]
    InvalidPayload(String),
}

impl HostCommand {
    /// 解析一行指令
    ///
    /// 空行和注释行返回 `Ok(None)`。
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            return Ok(None);
        }

        let (name, argument) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "play" => Self::no_argument("play", argument, Self::Play)?,
            "next" => Self::no_argument("next", argument, Self::Next)?,
            "stop" => Self::no_argument("stop", argument, Self::Stop)?,
            "state" => Self::no_argument("state", argument, Self::State)?,
            "quit" => Self::no_argument("quit", argument, Self::Quit)?,
            "update" => {
                if argument.is_empty() {
                    return Err(CommandError::MissingArgument("update"));
                }
                let payload = serde_json::from_str(argument)
                    .map_err(|e| CommandError::InvalidPayload(e.to_string()))?;
                Self::Update(payload)
            }
            "finished" => {
                if argument.is_empty() {
                    return Err(CommandError::MissingArgument("finished"));
                }
                Self::Finished {
                    element: argument.to_string(),
                }
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    fn no_argument(
        command: &'static str,
        argument: &str,
        value: Self,
    ) -> Result<Self, CommandError> {
        if argument.is_empty() {
            Ok(value)
        } else {
            Err(CommandError::UnexpectedArgument {
                command,
                argument: argument.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_control_commands() {
        assert_eq!(HostCommand::parse("play"), Ok(Some(HostCommand::Play)));
        assert_eq!(HostCommand::parse("  next  "), Ok(Some(HostCommand::Next)));
        assert_eq!(HostCommand::parse("stop"), Ok(Some(HostCommand::Stop)));
        assert_eq!(HostCommand::parse("quit"), Ok(Some(HostCommand::Quit)));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            HostCommand::parse(r#"update {"score": "2 : 1"}"#),
            Ok(Some(HostCommand::Update(json!({"score": "2 : 1"}))))
        );
        assert_eq!(
            HostCommand::parse("finished title"),
            Ok(Some(HostCommand::Finished {
                element: "title".to_string()
            }))
        );
    }

    #[test]
    fn test_skip_blank_and_comment_lines() {
        assert_eq!(HostCommand::parse(""), Ok(None));
        assert_eq!(HostCommand::parse("   "), Ok(None));
        assert_eq!(HostCommand::parse("# 第二节"), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            HostCommand::parse("rewind"),
            Err(CommandError::Unknown("rewind".to_string()))
        );
        assert_eq!(
            HostCommand::parse("finished"),
            Err(CommandError::MissingArgument("finished"))
        );
        assert_eq!(
            HostCommand::parse("play now"),
            Err(CommandError::UnexpectedArgument {
                command: "play",
                argument: "now".to_string()
            })
        );
        assert!(matches!(
            HostCommand::parse("update {score"),
            Err(CommandError::InvalidPayload(_))
        ));
    }
}
