//! 图案库命令

use super::connection::ConnectArgs;
use crate::modes::oneshot::OneShotMode;
use anyhow::{Context, Result};
use clap::Subcommand;
use haptiband_client::{Pattern, export_library, generate};
use haptiband_protocol::MotorChannel;
use haptiband_tools::{PatternRecord, PatternStore};
use std::fs;
use std::path::PathBuf;

/// 图案命令
#[derive(Subcommand, Debug)]
pub enum PatternCommand {
    /// 列出已保存的图案
    List,

    /// 显示图案及其命令序列
    Show {
        /// 图案名称
        name: String,
    },

    /// 保存图案（同名覆盖）
    Save {
        /// 图案名称
        name: String,

        /// 电机列表（逗号分隔，如 left,front）
        #[arg(short, long, value_delimiter = ',', required = true)]
        motors: Vec<MotorChannel>,

        /// 单次振动时长（毫秒）
        #[arg(short, long, default_value_t = 100)]
        buzz_ms: u64,

        /// 振动两次
        #[arg(long)]
        two_buzz: bool,
    },

    /// 删除图案
    Delete {
        /// 图案名称
        name: String,
    },

    /// 在头带上播放图案
    Test {
        /// 图案名称
        name: String,

        #[command(flatten)]
        connection: ConnectArgs,
    },

    /// 导出图案库（文本 + JSON）
    Export {
        /// 输出文件（默认打印到标准输出）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl PatternCommand {
    pub async fn execute(self, mode: &OneShotMode) -> Result<()> {
        let store = mode.config().pattern_store()?;

        match self {
            PatternCommand::List => {
                for line in list_patterns(&store)? {
                    println!("{}", line);
                }
            },

            PatternCommand::Show { name } => {
                let pattern = find_pattern(&store, &name)?;
                let sequence = generate(&pattern)?;
                println!("{}", pattern.to_record().summary());
                for step in &sequence {
                    println!(
                        "  {:<12} wait {:?}",
                        step.command.to_wire(),
                        step.settle_delay
                    );
                }
                println!("总时长: {:?}", sequence.total_delay());
            },

            PatternCommand::Save {
                name,
                motors,
                buzz_ms,
                two_buzz,
            } => {
                let record = PatternRecord::new(name, &motors, buzz_ms, two_buzz);
                let summary = record.summary();
                match save_pattern(&store, record)? {
                    Some(_) => println!("✅ 已更新: {}", summary),
                    None => println!("✅ 已保存: {}", summary),
                }
            },

            PatternCommand::Delete { name } => {
                delete_pattern(&store, &name)?;
                println!("✅ 已删除: {}", name);
            },

            PatternCommand::Test { name, connection } => {
                let pattern = find_pattern(&store, &name)?;
                mode.play(&connection, &name, generate(&pattern)?).await?;
            },

            PatternCommand::Export { output } => {
                let library = store.load()?;
                let text = export_library(&library)?;
                match output {
                    Some(path) => {
                        fs::write(&path, text)
                            .with_context(|| format!("写入导出文件失败: {}", path.display()))?;
                        println!("✅ 已导出 {} 个图案到 {}", library.len(), path.display());
                    },
                    None => print!("{}", text),
                }
            },
        }

        Ok(())
    }
}

/// 每个图案一行摘要
pub fn list_patterns(store: &dyn PatternStore) -> Result<Vec<String>> {
    let library = store.load()?;
    if library.is_empty() {
        return Ok(vec!["(没有已保存的图案)".to_string()]);
    }
    Ok(library.iter().map(PatternRecord::summary).collect())
}

/// 按名称查找图案
pub fn find_pattern(store: &dyn PatternStore, name: &str) -> Result<Pattern> {
    let library = store.load()?;
    let record = library
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("图案不存在: {:?}", name))?;
    Ok(Pattern::try_from(record)?)
}

/// 保存图案，返回被覆盖的旧记录
pub fn save_pattern(store: &dyn PatternStore, record: PatternRecord) -> Result<Option<PatternRecord>> {
    let mut library = store.load()?;
    let previous = library.insert(record)?;
    store.save(&library)?;
    Ok(previous)
}

pub fn delete_pattern(store: &dyn PatternStore, name: &str) -> Result<PatternRecord> {
    let mut library = store.load()?;
    let removed = library.remove(name)?;
    store.save(&library)?;
    Ok(removed)
}
