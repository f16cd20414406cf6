//! 遥测帧解析与转换
//!
//! Hub 上报格式：`GPS:<data>|IMU:<data>`。
//! 转换后以固定的板 ID / 列号转发给头带，载荷为 `<gps>|<imu>`。

use crate::command::Command;
use crate::ProtocolError;

/// GPS 段起始标记
pub const GPS_MARKER: &str = "GPS:";

/// IMU 段起始标记
pub const IMU_MARKER: &str = "|IMU:";

/// 转发命令使用的板 ID（行）
pub const TELEMETRY_BOARD_ID: u32 = 1;

/// 转发命令使用的列号
pub const TELEMETRY_COLUMN: u32 = 2;

/// 遥测帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryFrame {
    /// `GPS:` 与 `|IMU:` 之间的内容
    pub gps: String,
    /// `|IMU:` 之后到行尾的内容
    pub imu: String,
}

impl TelemetryFrame {
    /// 解析一行遥测数据
    ///
    /// 两个标记都以首次出现的位置为准。
    ///
    /// # 错误
    /// - `ProtocolError::MissingMarker`: 缺少任一标记，或 `|IMU:` 位于 `GPS:` 之前
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);

        let gps_start = line
            .find(GPS_MARKER)
            .ok_or(ProtocolError::MissingMarker(GPS_MARKER))?
            + GPS_MARKER.len();
        let imu_pos = line.find(IMU_MARKER).ok_or(ProtocolError::MissingMarker(IMU_MARKER))?;

        if imu_pos < gps_start {
            return Err(ProtocolError::MissingMarker(IMU_MARKER));
        }

        Ok(Self {
            gps: line[gps_start..imu_pos].to_string(),
            imu: line[imu_pos + IMU_MARKER.len()..].to_string(),
        })
    }

    /// 转发载荷 `<gps>|<imu>`
    pub fn payload(&self) -> String {
        format!("{}|{}", self.gps, self.imu)
    }

    /// 构建转发命令
    pub fn to_command(&self) -> Result<Command, ProtocolError> {
        Command::with_payload(TELEMETRY_BOARD_ID, TELEMETRY_COLUMN, self.payload())
    }
}

/// 遥测行 → 转发命令
///
/// 非遥测行返回 `None`（调用方自行记录日志）。
pub fn translate(line: &str) -> Option<Command> {
    TelemetryFrame::parse(line).ok()?.to_command().ok()
}

/// 是否看起来像遥测行（两个标记都存在）
pub fn is_telemetry(line: &str) -> bool {
    line.contains(GPS_MARKER) && line.contains(IMU_MARKER)
}
