use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use enumset::{EnumSet, EnumSetType};
use peniko::color::parse_color;
use serde_json::{Map, Value};

use crate::types::{ConfigError, DEFAULT_LOCALE, TimeFormat};

pub const DEFAULT_FONT_URL: &str = "https://fonts.cdnfonts.com/css/anurati";
pub const DEFAULT_FONT_FAMILY: &str =
    "Anurati, -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif";
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";
pub const DEFAULT_FONT_SIZE: u32 = 48;
pub const DEFAULT_RESPONSIVE_RATIO: u8 = 50;

pub const FONT_SIZE_MIN: u32 = 1;
pub const FONT_SIZE_MAX: u32 = 1000;
pub const LETTER_SPACING_MIN: f32 = -50.0;
pub const LETTER_SPACING_MAX: f32 = 100.0;

/// 字号计算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingMode {
    /// 根据测量结果搜索最大可容纳字号
    #[default]
    Search,
    /// 按容器短边的固定比例计算字号
    Responsive,
    /// 直接使用配置中的字号，由宿主样式负责布局
    Host,
}

impl SizingMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "search" => Some(SizingMode::Search),
            "responsive" => Some(SizingMode::Responsive),
            "host" => Some(SizingMode::Host),
            _ => None,
        }
    }
}

/// 字号搜索策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// 整数二分查找，结果为最大可容纳字号
    #[default]
    Binary,
    /// 连续中点逼近，最多20次迭代
    Midpoint,
}

impl SearchStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "binary" => Some(SearchStrategy::Binary),
            "midpoint" => Some(SearchStrategy::Midpoint),
            _ => None,
        }
    }
}

#[derive(Debug, EnumSetType)]
pub enum ConfigKey {
    FontUrl,
    FontFamily,
    TextColor,
    FontSize,
    TimeFormat,
    ShowSeconds,
    Locale,
    LetterSpacing,
    SizingMode,
    SearchStrategy,
    ResponsiveRatio,
    ScaledFallback,
}

impl ConfigKey {
    pub fn wire_name(&self) -> &'static str {
        match self {
            ConfigKey::FontUrl => "fontUrl",
            ConfigKey::FontFamily => "fontFamily",
            ConfigKey::TextColor => "textColor",
            ConfigKey::FontSize => "fontSize",
            ConfigKey::TimeFormat => "timeFormat",
            ConfigKey::ShowSeconds => "showSeconds",
            ConfigKey::Locale => "locale",
            ConfigKey::LetterSpacing => "letterSpacing",
            ConfigKey::SizingMode => "sizingMode",
            ConfigKey::SearchStrategy => "searchStrategy",
            ConfigKey::ResponsiveRatio => "responsiveRatio",
            ConfigKey::ScaledFallback => "scaledFallback",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// 单个已校验的配置项
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    FontUrl(Option<String>),
    FontFamily(String),
    TextColor(String),
    FontSize(u32),
    TimeFormat(TimeFormat),
    /// 对 `24h` / `12h` 生效的秒显示开关
    ShowSeconds(bool),
    Locale(String),
    LetterSpacing(f32),
    SizingMode(SizingMode),
    SearchStrategy(SearchStrategy),
    ResponsiveRatio(u8),
    ScaledFallback(bool),
}

impl ConfigValue {
    pub fn key(&self) -> ConfigKey {
        match self {
            ConfigValue::FontUrl(_) => ConfigKey::FontUrl,
            ConfigValue::FontFamily(_) => ConfigKey::FontFamily,
            ConfigValue::TextColor(_) => ConfigKey::TextColor,
            ConfigValue::FontSize(_) => ConfigKey::FontSize,
            ConfigValue::TimeFormat(_) => ConfigKey::TimeFormat,
            ConfigValue::ShowSeconds(_) => ConfigKey::ShowSeconds,
            ConfigValue::Locale(_) => ConfigKey::Locale,
            ConfigValue::LetterSpacing(_) => ConfigKey::LetterSpacing,
            ConfigValue::SizingMode(_) => ConfigKey::SizingMode,
            ConfigValue::SearchStrategy(_) => ConfigKey::SearchStrategy,
            ConfigValue::ResponsiveRatio(_) => ConfigKey::ResponsiveRatio,
            ConfigValue::ScaledFallback(_) => ConfigKey::ScaledFallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub font_url: Option<String>,
    pub font_family: String,
    pub text_color: String,
    pub font_size: u32,
    pub time_format: TimeFormat,
    pub show_seconds: bool,
    pub locale: String,
    /// 字间距，单位为字号的百分比
    pub letter_spacing: f32,
    pub sizing_mode: SizingMode,
    pub search_strategy: SearchStrategy,
    pub responsive_ratio: u8,
    pub scaled_fallback: bool,
    /// 未识别的键，原样保存但不产生任何效果
    pub extras: BTreeMap<String, Value>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            font_url: Some(DEFAULT_FONT_URL.to_string()),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            time_format: TimeFormat::default(),
            show_seconds: true,
            locale: DEFAULT_LOCALE.to_string(),
            letter_spacing: 0.0,
            sizing_mode: SizingMode::default(),
            search_strategy: SearchStrategy::default(),
            responsive_ratio: DEFAULT_RESPONSIVE_RATIO,
            scaled_fallback: true,
            extras: BTreeMap::new(),
        }
    }
}

impl WidgetConfig {
    /// 写入单个字段，值发生变化时返回 true
    pub fn set(&mut self, value: ConfigValue) -> bool {
        fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        }

        match value {
            ConfigValue::FontUrl(v) => replace(&mut self.font_url, v),
            ConfigValue::FontFamily(v) => replace(&mut self.font_family, v),
            ConfigValue::TextColor(v) => replace(&mut self.text_color, v),
            ConfigValue::FontSize(v) => replace(&mut self.font_size, v),
            ConfigValue::TimeFormat(v) => replace(&mut self.time_format, v),
            ConfigValue::ShowSeconds(v) => replace(&mut self.show_seconds, v),
            ConfigValue::Locale(v) => replace(&mut self.locale, v),
            ConfigValue::LetterSpacing(v) => replace(&mut self.letter_spacing, v),
            ConfigValue::SizingMode(v) => replace(&mut self.sizing_mode, v),
            ConfigValue::SearchStrategy(v) => replace(&mut self.search_strategy, v),
            ConfigValue::ResponsiveRatio(v) => replace(&mut self.responsive_ratio, v),
            ConfigValue::ScaledFallback(v) => replace(&mut self.scaled_fallback, v),
        }
    }

    /// 实际显示的时间格式
    pub fn effective_time_format(&self) -> TimeFormat {
        self.time_format.resolve(self.show_seconds)
    }

    /// 与另一份配置相比取值不同的已识别键，`extras` 不参与比较
    pub fn diff(&self, other: &WidgetConfig) -> EnumSet<ConfigKey> {
        let mut changed = EnumSet::new();
        let mut check = |key: ConfigKey, differs: bool| {
            if differs {
                changed.insert(key);
            }
        };

        check(ConfigKey::FontUrl, self.font_url != other.font_url);
        check(ConfigKey::FontFamily, self.font_family != other.font_family);
        check(ConfigKey::TextColor, self.text_color != other.text_color);
        check(ConfigKey::FontSize, self.font_size != other.font_size);
        check(ConfigKey::TimeFormat, self.time_format != other.time_format);
        check(ConfigKey::ShowSeconds, self.show_seconds != other.show_seconds);
        check(ConfigKey::Locale, self.locale != other.locale);
        check(ConfigKey::LetterSpacing, self.letter_spacing != other.letter_spacing);
        check(ConfigKey::SizingMode, self.sizing_mode != other.sizing_mode);
        check(ConfigKey::SearchStrategy, self.search_strategy != other.search_strategy);
        check(ConfigKey::ResponsiveRatio, self.responsive_ratio != other.responsive_ratio);
        check(ConfigKey::ScaledFallback, self.scaled_fallback != other.scaled_fallback);

        changed
    }
}

/// 经过边界校验的部分配置
///
/// 已识别的键被解析为 [`ConfigValue`]，格式错误的键记录在 `rejected` 中，
/// 未识别的键原样保留在 `extras` 中。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    values: Vec<ConfigValue>,
    extras: Vec<(String, Value)>,
    rejected: Vec<ConfigError>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, value: ConfigValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn from_json(map: &Map<String, Value>) -> Self {
        let mut patch = Self::new();

        for (name, value) in map {
            match parse_entry(name, value) {
                Some(Ok(parsed)) => patch.values.push(parsed),
                Some(Err(err)) => patch.rejected.push(err),
                None => patch.extras.push((name.clone(), value.clone())),
            }
        }

        patch
    }

    pub fn values(&self) -> &[ConfigValue] {
        &self.values
    }

    pub fn extras(&self) -> &[(String, Value)] {
        &self.extras
    }

    pub fn rejected(&self) -> &[ConfigError] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.extras.is_empty() && self.rejected.is_empty()
    }
}

fn parse_entry(name: &str, value: &Value) -> Option<Result<ConfigValue, ConfigError>> {
    let parsed = match name {
        "fontUrl" => parse_font_url(value),
        "fontFamily" => expect_str(ConfigKey::FontFamily, value).and_then(|s| {
            let s = s.trim();
            if s.is_empty() {
                Err(invalid(ConfigKey::FontFamily, value, "empty font family"))
            } else {
                Ok(ConfigValue::FontFamily(s.to_string()))
            }
        }),
        "textColor" => expect_str(ConfigKey::TextColor, value).and_then(|s| {
            let s = s.trim();
            match parse_color(s) {
                Ok(_) => Ok(ConfigValue::TextColor(s.to_string())),
                Err(_) => Err(invalid(ConfigKey::TextColor, value, "not a CSS color")),
            }
        }),
        "fontSize" => expect_number(ConfigKey::FontSize, value).map(|n| {
            let clamped = n.clamp(FONT_SIZE_MIN as f64, FONT_SIZE_MAX as f64);
            ConfigValue::FontSize(round_positive(clamped) as u32)
        }),
        "timeFormat" => expect_str(ConfigKey::TimeFormat, value).and_then(|s| {
            TimeFormat::parse(s)
                .map(ConfigValue::TimeFormat)
                .ok_or_else(|| invalid(ConfigKey::TimeFormat, value, "unknown time format"))
        }),
        "showSeconds" => expect_bool(ConfigKey::ShowSeconds, value).map(ConfigValue::ShowSeconds),
        "locale" => expect_str(ConfigKey::Locale, value).and_then(|s| {
            let tag = s.trim();
            if tag.parse::<icu_locale_core::LanguageIdentifier>().is_ok() {
                Ok(ConfigValue::Locale(tag.to_string()))
            } else {
                Err(invalid(ConfigKey::Locale, value, "not a BCP-47 language tag"))
            }
        }),
        "letterSpacing" => expect_number(ConfigKey::LetterSpacing, value).map(|n| {
            let clamped = (n as f32).clamp(LETTER_SPACING_MIN, LETTER_SPACING_MAX);
            ConfigValue::LetterSpacing(clamped)
        }),
        "sizingMode" => expect_str(ConfigKey::SizingMode, value).and_then(|s| {
            SizingMode::parse(s)
                .map(ConfigValue::SizingMode)
                .ok_or_else(|| invalid(ConfigKey::SizingMode, value, "unknown sizing mode"))
        }),
        "searchStrategy" => expect_str(ConfigKey::SearchStrategy, value).and_then(|s| {
            SearchStrategy::parse(s)
                .map(ConfigValue::SearchStrategy)
                .ok_or_else(|| invalid(ConfigKey::SearchStrategy, value, "unknown search strategy"))
        }),
        "responsiveRatio" => expect_number(ConfigKey::ResponsiveRatio, value).map(|n| {
            ConfigValue::ResponsiveRatio(round_positive(n.clamp(1.0, 100.0)) as u8)
        }),
        "scaledFallback" => {
            expect_bool(ConfigKey::ScaledFallback, value).map(ConfigValue::ScaledFallback)
        }
        _ => return None,
    };
    Some(parsed)
}

fn parse_font_url(value: &Value) -> Result<ConfigValue, ConfigError> {
    match value {
        Value::Null => Ok(ConfigValue::FontUrl(None)),
        Value::String(s) if s.trim().is_empty() => Ok(ConfigValue::FontUrl(None)),
        Value::String(s) if s.trim().contains(char::is_whitespace) => Err(invalid(
            ConfigKey::FontUrl,
            value,
            "stylesheet reference contains whitespace",
        )),
        Value::String(s) => Ok(ConfigValue::FontUrl(Some(s.trim().to_string()))),
        _ => Err(ConfigError::WrongType {
            key: ConfigKey::FontUrl,
            expected: "a string",
        }),
    }
}

fn expect_str(key: ConfigKey, value: &Value) -> Result<&str, ConfigError> {
    value.as_str().ok_or(ConfigError::WrongType {
        key,
        expected: "a string",
    })
}

fn expect_bool(key: ConfigKey, value: &Value) -> Result<bool, ConfigError> {
    value.as_bool().ok_or(ConfigError::WrongType {
        key,
        expected: "a boolean",
    })
}

/// 数字或 "48" / "48px" 形式的字符串
fn expect_number(key: ConfigKey, value: &Value) -> Result<f64, ConfigError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches("px").trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        Some(_) => Err(invalid(key, value, "not a finite number")),
        None => Err(ConfigError::WrongType {
            key,
            expected: "a number",
        }),
    }
}

fn invalid(key: ConfigKey, value: &Value, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}

fn round_positive(n: f64) -> u64 {
    (n + 0.5) as u64
}
