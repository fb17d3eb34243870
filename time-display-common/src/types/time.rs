/// 显示用时间字符串，最长形如 "오후 12:59:59"
pub type TimeText = heapless::String<32>;

/// 语言标签无效时使用的默认语言
pub const DEFAULT_LOCALE: &str = "en-US";

/// 时间显示格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    /// 24小时制，带秒 (13:05:09)
    #[default]
    Hour24,
    /// 24小时制，不带秒 (13:05)
    Hour24NoSeconds,
    /// 12小时制，带秒 (1:05:09 PM)
    Hour12,
    /// 12小时制，不带秒 (1:05 PM)
    Hour12NoSeconds,
}

impl TimeFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "24h" | "24h-with-seconds" => Some(TimeFormat::Hour24),
            "24h-no-seconds" => Some(TimeFormat::Hour24NoSeconds),
            "12h" | "12h-with-seconds" => Some(TimeFormat::Hour12),
            "12h-no-seconds" => Some(TimeFormat::Hour12NoSeconds),
            _ => None,
        }
    }

    pub fn is_12_hour(&self) -> bool {
        matches!(self, TimeFormat::Hour12 | TimeFormat::Hour12NoSeconds)
    }

    pub fn shows_seconds(&self) -> bool {
        matches!(self, TimeFormat::Hour24 | TimeFormat::Hour12)
    }

    /// 结合 `showSeconds` 得到实际显示的格式
    ///
    /// 该开关只能去掉 `24h` / `12h` 的秒，不带秒的格式不受影响。
    pub fn resolve(self, show_seconds: bool) -> Self {
        match (self, show_seconds) {
            (TimeFormat::Hour24, false) => TimeFormat::Hour24NoSeconds,
            (TimeFormat::Hour12, false) => TimeFormat::Hour12NoSeconds,
            (format, _) => format,
        }
    }
}
