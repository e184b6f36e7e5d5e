//! # 控制指令集成测试
//!
//! 测试 配置文件 → Session → Overlay 的执行链路。
//! 完成信号由指令流中的 `finished` 行模拟。

use std::fs;
use std::path::PathBuf;

use overlay_host::{HostConfig, Session, SessionSummary};
use overlay_runtime::{ModuleRegistry, PlaybackState, StyleTarget};

/// 随仓库提供的示例模板
fn sample_document() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/lower_third.json")
}

/// 在临时目录中准备配置文件与模板文档
fn prepare(dir: &tempfile::TempDir) -> PathBuf {
    let document = dir.path().join("overlay.json");
    fs::copy(sample_document(), &document).unwrap();

    let mut config = HostConfig::default();
    config.document_path = document;
    config.log_level = "debug".to_string();

    let path = dir.path().join("config.json");
    config.save(&path).unwrap();
    path
}

fn open(config_path: &PathBuf) -> Session {
    let config = HostConfig::try_load(config_path).unwrap();
    config.validate().unwrap();
    Session::open(
        &config.document_path,
        config.overlay.clone(),
        &ModuleRegistry::default(),
    )
    .unwrap()
}

#[test]
fn test_config_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = prepare(&dir);

    let loaded = HostConfig::try_load(&path).unwrap();
    assert_eq!(loaded.log_level, "debug");
    assert_eq!(loaded.document_path, dir.path().join("overlay.json"));
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_broken_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(HostConfig::try_load(&path).is_err());
    assert_eq!(HostConfig::load(&path), HostConfig::default());
}

/// 入场、更新、退场的完整流程
#[test]
fn test_lower_third_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = open(&prepare(&dir));

    let commands = r#"
        # 入场
        play
        state
        finished lower-third
        state

        # 更新
        update {"name": "Petr Svoboda", "flag": {"src": "sk", "alt": "sk"}}
        state
        finished name

        # 退场
        next
        finished name
        state
        finished lower-third
        stop
        state
    "#;

    let mut reports = Vec::new();
    let summary = session
        .run(commands.as_bytes(), |text| reports.push(text.to_string()))
        .unwrap();
    assert_eq!(
        summary,
        SessionSummary {
            executed: 13,
            failed: 0
        }
    );

    assert_eq!(
        reports,
        vec![
            "stage=1 state=Playing lower-third=bar-in name=-",
            "stage=1 state=Playing lower-third=- name=name-in",
            "stage=1 state=Playing lower-third=- name=_name.0.0",
            // 条形重启后，嵌套的名字回到基线：无活动效果
            "stage=2 state=Playing lower-third=bar-out name=-",
            "stage=2 state=Stopped lower-third=- name=-",
        ]
    );

    let overlay = session.overlay();
    assert_eq!(overlay.state(), PlaybackState::Stopped);
    let name = overlay.live_element("name").unwrap();
    assert_eq!(name.text, "Petr Svoboda");
    assert!(name.has_class("initially-invisible"));
    assert!(!name.has_class("fade-in"));
    assert!(!name.has_class("fade-out"));

    let flag = overlay.live_element("flag").unwrap();
    assert_eq!(flag.attribute("src"), Some("flags/sk.png"));
    assert_eq!(flag.attribute("alt"), Some("sk"));
    assert!(overlay.diagnostics().is_empty());
}

#[test]
fn test_unknown_update_key_is_only_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = open(&prepare(&dir));

    let summary = session
        .run(
            "update {\"score\": 3}\nupdate [1, 2]\nupdate {broken\n".as_bytes(),
            |_| {},
        )
        .unwrap();
    assert_eq!(
        summary,
        SessionSummary {
            executed: 2,
            failed: 1
        }
    );
    assert_eq!(session.overlay().diagnostics().warn_count(), 2);
}
