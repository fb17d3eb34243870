use alloc::string::{String, ToString};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::{ConfigPatch, WidgetError, WidgetResult};

pub const SETTINGS_UPDATE: &str = "SETTINGS_UPDATE";
pub const CONFIG_UPDATE: &str = "CONFIG_UPDATE";

/// 宿主应用发送的消息
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    SettingsUpdate(ConfigPatch),
    ConfigUpdate(ConfigPatch),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    settings: Option<Map<String, Value>>,
    config: Option<Map<String, Value>>,
}

impl HostMessage {
    /// 解析一条 JSON 消息
    ///
    /// 未识别的 `type` 返回 `Ok(None)`，JSON 格式错误返回 [`WidgetError::InvalidMessage`]。
    pub fn from_json(raw: &str) -> WidgetResult<Option<Self>> {
        let envelope: Envelope = serde_json::from_str(raw)
            .map_err(|e| WidgetError::InvalidMessage(e.to_string()))?;
        Ok(Self::from_envelope(envelope))
    }

    pub fn from_value(value: Value) -> WidgetResult<Option<Self>> {
        let envelope: Envelope = serde_json::from_value(value)
            .map_err(|e| WidgetError::InvalidMessage(e.to_string()))?;
        Ok(Self::from_envelope(envelope))
    }

    fn from_envelope(envelope: Envelope) -> Option<Self> {
        let empty = Map::new();
        match envelope.kind.as_deref() {
            Some(SETTINGS_UPDATE) => Some(HostMessage::SettingsUpdate(ConfigPatch::from_json(
                envelope.settings.as_ref().unwrap_or(&empty),
            ))),
            Some(CONFIG_UPDATE) => Some(HostMessage::ConfigUpdate(ConfigPatch::from_json(
                envelope.config.as_ref().unwrap_or(&empty),
            ))),
            _ => None,
        }
    }

    pub fn patch(&self) -> &ConfigPatch {
        match self {
            HostMessage::SettingsUpdate(patch) | HostMessage::ConfigUpdate(patch) => patch,
        }
    }
}
