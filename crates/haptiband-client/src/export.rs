//! 图案库导出
//!
//! 生成可读的文本清单：每个图案的参数和展开后的序列（线格式 + 等待秒数），
//! 末尾附上图案库的 JSON。

use crate::error::ClientError;
use crate::pattern::Pattern;
use crate::sequence::generate;
use haptiband_tools::PatternLibrary;
use std::fmt::Write;

/// 空图案库的导出内容
pub const EMPTY_EXPORT: &str = "# No patterns saved yet\n";

/// 导出图案库
pub fn export_library(library: &PatternLibrary) -> Result<String, ClientError> {
    if library.is_empty() {
        return Ok(EMPTY_EXPORT.to_string());
    }

    let mut out = String::from("# Haptic patterns\n\n");
    for record in library {
        let pattern = Pattern::try_from(record)?;
        let sequence = generate(&pattern)?;

        // 写入 String 不会失败
        let _ = writeln!(out, "## {}", record.summary());
        for step in &sequence {
            let _ = writeln!(
                out,
                "{:<28} {:.2}",
                step.command.to_wire(),
                step.settle_delay.as_secs_f64()
            );
        }
        out.push('\n');
    }

    out.push_str("# JSON\n");
    out.push_str(&library.to_json_pretty()?);
    out.push('\n');
    Ok(out)
}
