//! 标准输入解析
//!
//! 每行是一条宿主 JSON 消息，或以下命令之一：
//! - `:resize <w> <h>` 修改容器尺寸
//! - `:fontloaded` 模拟样式表加载完成
//! - `:reset` 恢复默认配置
//! - `:quit` 销毁小部件

use serde_json::Value;
use time_display_common::*;

#[derive(Debug, PartialEq)]
pub enum Input {
    Event(WidgetEvent),
    Resize(Bounds),
}

pub fn parse_line(line: &str) -> WidgetResult<Option<Input>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(command) = line.strip_prefix(':') else {
        return Ok(HostMessage::from_json(line)?.map(|m| Input::Event(WidgetEvent::Host(m))));
    };

    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") => Ok(Some(Input::Event(WidgetEvent::Teardown))),
        Some("fontloaded") => Ok(Some(Input::Event(WidgetEvent::FontLoaded))),
        Some("reset") => Ok(Some(Input::Event(WidgetEvent::ResetSettings))),
        Some("resize") => {
            let width = parts.next().and_then(|s| s.parse::<f32>().ok());
            let height = parts.next().and_then(|s| s.parse::<f32>().ok());
            match (width, height) {
                (Some(w), Some(h)) => Ok(Some(Input::Resize(Bounds::new(w, h)))),
                _ => Err(WidgetError::InvalidMessage(format!(
                    "usage: :resize <width> <height>, got {:?}",
                    line
                ))),
            }
        }
        _ => Err(WidgetError::InvalidMessage(format!(
            "unknown command {:?}",
            line
        ))),
    }
}

/// 解析 `800x200` 形式的尺寸
pub fn parse_size(raw: &str) -> Option<Bounds> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    Some(Bounds::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// 解析启动时的配置 JSON 对象
pub fn parse_settings(raw: &str) -> WidgetResult<ConfigPatch> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(ConfigPatch::from_json(&map)),
        Ok(_) => Err(WidgetError::InvalidMessage(
            "settings must be a JSON object".to_string(),
        )),
        Err(e) => Err(WidgetError::InvalidMessage(e.to_string())),
    }
}
