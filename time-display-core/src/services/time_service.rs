use alloc::string::{String, ToString};
use core::fmt::Write;

use icu_locale_core::LanguageIdentifier;
use jiff::civil::Time;
use time_display_common::*;

/// 与语言相关的时间书写习惯
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleStyle {
    pub separator: char,
    pub am: &'static str,
    pub pm: &'static str,
    /// 上午/下午标记写在时间之前
    pub period_first: bool,
    /// 前置标记与时间之间是否有空格
    pub period_space: bool,
}

impl LocaleStyle {
    pub const DEFAULT: LocaleStyle = LocaleStyle {
        separator: ':',
        am: "AM",
        pm: "PM",
        period_first: false,
        period_space: false,
    };

    /// 按语言子标签选择书写习惯，标签无效时返回 `None`
    pub fn for_locale(tag: &str) -> Option<Self> {
        let langid: LanguageIdentifier = tag.trim().parse().ok()?;
        let style = match langid.language.as_str() {
            "ja" => LocaleStyle {
                am: "午前",
                pm: "午後",
                period_first: true,
                ..Self::DEFAULT
            },
            "zh" => LocaleStyle {
                am: "上午",
                pm: "下午",
                period_first: true,
                ..Self::DEFAULT
            },
            "ko" => LocaleStyle {
                am: "오전",
                pm: "오후",
                period_first: true,
                period_space: true,
                ..Self::DEFAULT
            },
            "fi" | "da" => LocaleStyle {
                separator: '.',
                ..Self::DEFAULT
            },
            _ => Self::DEFAULT,
        };
        Some(style)
    }
}

/// 格式化时间，语言标签无效时回退到 [`DEFAULT_LOCALE`]
pub fn format_time(now: Time, format: TimeFormat, locale: &str) -> TimeText {
    let style = LocaleStyle::for_locale(locale).unwrap_or_else(|| {
        warn!(
            "Invalid locale {:?}, falling back to {}",
            locale, DEFAULT_LOCALE
        );
        LocaleStyle::DEFAULT
    });
    render_time(now, format, &style)
}

pub fn render_time(now: Time, format: TimeFormat, style: &LocaleStyle) -> TimeText {
    let hour = now.hour();
    let minute = now.minute();
    let second = now.second();
    let sep = style.separator;
    let mut text = TimeText::new();

    // 最长的输出远小于容量，写入不会失败
    if format.is_12_hour() {
        let period = if hour < 12 { style.am } else { style.pm };
        let hour12 = match hour % 12 {
            0 => 12,
            h => h,
        };

        if style.period_first {
            let _ = text.push_str(period);
            if style.period_space {
                let _ = text.push(' ');
            }
        }
        let _ = write!(text, "{}{}{:02}", hour12, sep, minute);
        if format.shows_seconds() {
            let _ = write!(text, "{}{:02}", sep, second);
        }
        if !style.period_first {
            let _ = write!(text, " {}", period);
        }
    } else {
        let _ = write!(text, "{:02}{}{:02}", hour, sep, minute);
        if format.shows_seconds() {
            let _ = write!(text, "{}{:02}", sep, second);
        }
    }

    text
}

/// 时钟源：持有宿主时钟并缓存解析后的语言习惯
pub struct TimeService<C: TimeSource> {
    clock: C,
    locale: String,
    style: LocaleStyle,
}

impl<C: TimeSource> TimeService<C> {
    pub fn new(clock: C, locale: &str) -> Self {
        let mut service = Self {
            clock,
            locale: String::new(),
            style: LocaleStyle::DEFAULT,
        };
        service.set_locale(locale);
        service
    }

    pub fn set_locale(&mut self, locale: &str) {
        if self.locale == locale {
            return;
        }
        self.locale = locale.to_string();
        self.style = match LocaleStyle::for_locale(locale) {
            Some(style) => style,
            None => {
                warn!(
                    "Invalid locale {:?}, falling back to {}",
                    locale, DEFAULT_LOCALE
                );
                LocaleStyle::DEFAULT
            }
        };
        debug!("Locale set to {:?}: {:?}", locale, self.style);
    }

    pub fn style(&self) -> &LocaleStyle {
        &self.style
    }

    pub fn current_text(&self, format: TimeFormat) -> TimeText {
        render_time(self.clock.now(), format, &self.style)
    }
}
