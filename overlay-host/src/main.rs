//! Overlay Host - 命令行宿主
//!
//! 从文件或标准输入逐行读取控制指令，驱动 overlay-runtime。

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use overlay_host::{HostConfig, Session};
use overlay_runtime::ModuleRegistry;
use tracing::Level;

#[derive(Parser)]
#[command(name = "overlay-host")]
#[command(about = "overlay 效果调度宿主 - 逐行执行播出控制指令")]
#[command(version)]
struct Cli {
    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 模板文档（覆盖配置文件中的 document_path）
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// 指令文件（默认：标准输入）
    #[arg(long)]
    commands: Option<PathBuf>,

    /// 日志级别（覆盖配置文件中的 log_level）
    #[arg(short, long)]
    log_level: Option<Level>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 日志要在配置加载之前初始化，加载失败的警告才能输出
    let loaded = HostConfig::try_load(&cli.config);
    let level = cli
        .log_level
        .or_else(|| loaded.as_ref().ok().and_then(|c| c.level().ok()))
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("{e}，使用默认配置");
        HostConfig::default()
    });
    if let Some(document) = cli.document {
        config.document_path = document;
    }
    config.validate().context("配置无效")?;

    let mut session = Session::open(
        &config.document_path,
        config.overlay.clone(),
        &ModuleRegistry::default(),
    )
    .context("无法创建会话")?;

    let report = |text: &str| println!("{text}");
    let summary = match &cli.commands {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("无法打开指令文件: {}", path.display()))?;
            session.run(BufReader::new(file), report)?
        }
        None => session.run(io::stdin().lock(), report)?,
    };

    tracing::info!(
        executed = summary.executed,
        failed = summary.failed,
        "会话结束"
    );
    Ok(())
}
