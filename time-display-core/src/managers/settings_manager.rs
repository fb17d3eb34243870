use enumset::EnumSet;
use time_display_common::*;

/// 小部件配置存储
pub struct SettingsManager {
    config: WidgetConfig,
}

impl SettingsManager {
    pub fn new() -> Self {
        Self::with_config(WidgetConfig::default())
    }

    pub fn with_config(config: WidgetConfig) -> Self {
        Self { config }
    }

    pub fn get(&self) -> &WidgetConfig {
        &self.config
    }

    /// 按键覆盖合并一份补丁，返回取值真正发生变化的已识别键
    ///
    /// 被拒绝的键保留原值并记录警告；未识别的键只保存，不出现在返回值中。
    pub fn merge(&mut self, patch: &ConfigPatch) -> EnumSet<ConfigKey> {
        for err in patch.rejected() {
            warn!("Ignoring setting: {}", err);
        }

        let before = self.config.clone();
        for value in patch.values() {
            self.config.set(value.clone());
        }
        for (name, value) in patch.extras() {
            trace!("Storing unrecognized setting {:?}", name);
            self.config.extras.insert(name.clone(), value.clone());
        }

        let changed = before.diff(&self.config);
        if !changed.is_empty() {
            debug!("Settings changed: {:?}", changed);
        }
        changed
    }

    /// 恢复默认配置，返回发生变化的键
    pub fn reset(&mut self) -> EnumSet<ConfigKey> {
        info!("Resetting settings to defaults");
        let defaults = WidgetConfig::default();
        let changed = self.config.diff(&defaults);
        self.config = defaults;
        changed
    }
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::new()
    }
}
