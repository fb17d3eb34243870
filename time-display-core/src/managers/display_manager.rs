//! 小部件实例
//!
//! 把字体加载、文本刷新、配置更新和尺寸自适应串在一起。所有定时行为都以截止时间表示，
//! 由外部循环在 [`TimeDisplay::next_deadline`] 到达后调用 [`TimeDisplay::poll`]。

use embassy_time::{Duration, Instant};
use enumset::EnumSet;
use time_display_common::*;

use crate::managers::SettingsManager;
use crate::services::{FitOutcome, FitService, TimeService};

/// 时间刷新周期
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// 尺寸变化去抖
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
/// 样式表加载完成后等待字体生效的时间
pub const FONT_SETTLE_DELAY: Duration = Duration::from_millis(100);
/// 兜底的周期性重新适配
pub const PERIODIC_REFIT_INTERVAL: Duration = Duration::from_secs(20);

/// 会影响排版尺寸的配置项
fn layout_keys() -> EnumSet<ConfigKey> {
    ConfigKey::FontFamily
        | ConfigKey::FontSize
        | ConfigKey::TimeFormat
        | ConfigKey::ShowSeconds
        | ConfigKey::Locale
        | ConfigKey::LetterSpacing
        | ConfigKey::SizingMode
        | ConfigKey::SearchStrategy
        | ConfigKey::ResponsiveRatio
        | ConfigKey::ScaledFallback
}

pub struct TimeDisplay<T: RenderTarget, F: FontLoader, C: TimeSource> {
    target: T,
    fonts: F,
    settings: SettingsManager,
    fitter: FitService,
    time_service: TimeService<C>,
    applied: Option<AppliedSize>,
    next_tick: Option<Instant>,
    resize_at: Option<Instant>,
    font_settle_at: Option<Instant>,
    next_refit: Option<Instant>,
    torn_down: bool,
}

impl<T: RenderTarget, F: FontLoader, C: TimeSource> TimeDisplay<T, F, C> {
    /// 创建并启动小部件
    ///
    /// 找不到渲染目标时返回 [`WidgetError::MissingRenderTarget`]，此时不会创建任何定时器。
    pub fn init(
        target: Option<T>,
        fonts: F,
        clock: C,
        config: WidgetConfig,
        now: Instant,
    ) -> WidgetResult<Self> {
        let Some(target) = target else {
            error!("Render target not found, time display stays inert");
            return Err(WidgetError::MissingRenderTarget);
        };

        info!("Initializing time display");

        let fitter = FitService::new(config.search_strategy)
            .with_scaled_fallback(config.scaled_fallback);
        let time_service = TimeService::new(clock, &config.locale);

        let mut display = Self {
            target,
            fonts,
            settings: SettingsManager::with_config(config),
            fitter,
            time_service,
            applied: None,
            next_tick: Some(now + TICK_INTERVAL),
            resize_at: None,
            font_settle_at: None,
            next_refit: None,
            torn_down: false,
        };

        display.apply_style(EnumSet::all());
        if !display.load_font() {
            debug!("Using fallback font family");
        }
        display.render_text();
        display.refit(now);

        info!("Time display started");
        Ok(display)
    }

    pub fn config(&self) -> &WidgetConfig {
        self.settings.get()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn fonts(&self) -> &F {
        &self.fonts
    }

    /// 最近一次写入的字号
    pub fn applied_size(&self) -> Option<AppliedSize> {
        self.applied
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn handle_event(&mut self, event: WidgetEvent, now: Instant) -> WidgetResult<()> {
        if self.torn_down {
            return Err(WidgetError::Inert);
        }

        match event {
            WidgetEvent::Host(message) => {
                debug!("Host message: {:?}", message);
                self.apply_settings(message.patch(), now);
            }
            WidgetEvent::Resized => {
                // 每次尺寸变化都重新计时，只在停止变化后适配一次
                self.resize_at = Some(now + RESIZE_DEBOUNCE);
            }
            WidgetEvent::FontLoaded => {
                debug!("Font stylesheet loaded");
                self.font_settle_at = Some(now + FONT_SETTLE_DELAY);
            }
            WidgetEvent::ResetSettings => {
                let changed = self.settings.reset();
                self.apply_changes(changed, now);
            }
            WidgetEvent::Teardown => self.teardown(),
        }
        Ok(())
    }

    /// 处理所有已到期的截止时间，同一轮内最多适配一次
    pub fn poll(&mut self, now: Instant) -> WidgetResult<()> {
        if self.torn_down {
            return Err(WidgetError::Inert);
        }

        let mut refit = false;

        if let Some(due) = self.next_tick.filter(|due| *due <= now) {
            let mut next = due + TICK_INTERVAL;
            if next <= now {
                next = now + TICK_INTERVAL;
            }
            self.next_tick = Some(next);
            refit |= self.render_text();
        }

        if self.resize_at.is_some_and(|due| due <= now) {
            self.resize_at = None;
            debug!("Resize settled");
            refit = true;
        }

        if self.font_settle_at.is_some_and(|due| due <= now) {
            self.font_settle_at = None;
            refit = true;
        }

        if self.next_refit.is_some_and(|due| due <= now) {
            if self.fitter.is_fitting() {
                debug!("Skipping periodic refit, fit in progress");
                self.next_refit = Some(now + PERIODIC_REFIT_INTERVAL);
            } else {
                trace!("Periodic refit");
                refit = true;
            }
        }

        if refit {
            self.refit(now);
        }
        Ok(())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.next_tick,
            self.resize_at,
            self.font_settle_at,
            self.next_refit,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// 合并配置并只应用发生变化的属性，返回变化的键
    pub fn apply_settings(&mut self, patch: &ConfigPatch, now: Instant) -> EnumSet<ConfigKey> {
        let changed = self.settings.merge(patch);
        self.apply_changes(changed, now);
        changed
    }

    fn apply_changes(&mut self, changed: EnumSet<ConfigKey>, now: Instant) {
        if changed.is_empty() {
            return;
        }

        info!("Applying settings: {:?}", changed);
        self.apply_style(changed);

        let mut refit = !changed.is_disjoint(layout_keys());
        if changed.contains(ConfigKey::FontUrl) && !self.load_font() {
            // 不会再有 FontLoaded，直接按回退字体重新适配
            refit = true;
        }
        if changed.contains(ConfigKey::Locale) {
            self.time_service.set_locale(&self.settings.get().locale);
        }
        if changed.contains(ConfigKey::SearchStrategy) {
            self.fitter.set_strategy(self.settings.get().search_strategy);
        }
        if changed.contains(ConfigKey::ScaledFallback) {
            self.fitter
                .set_scaled_fallback(self.settings.get().scaled_fallback);
        }
        let text_keys = ConfigKey::TimeFormat | ConfigKey::ShowSeconds | ConfigKey::Locale;
        if !changed.is_disjoint(text_keys) {
            self.render_text();
        }

        if refit {
            self.refit(now);
        }
    }

    /// 取消所有定时器，之后的事件一律返回 [`WidgetError::Inert`]
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        info!("Tearing down time display");
        self.next_tick = None;
        self.resize_at = None;
        self.font_settle_at = None;
        self.next_refit = None;
        self.torn_down = true;
    }

    fn apply_style(&mut self, keys: EnumSet<ConfigKey>) {
        let config = self.settings.get();
        if keys.contains(ConfigKey::TextColor) {
            self.target.set_color(&config.text_color);
        }
        if keys.contains(ConfigKey::FontFamily) {
            self.target.set_font_family(&config.font_family);
        }
        if keys.contains(ConfigKey::LetterSpacing) {
            self.target.set_letter_spacing(config.letter_spacing / 100.0);
        }
    }

    /// 更新样式表，之后会收到 [`WidgetEvent::FontLoaded`] 时返回 true
    fn load_font(&mut self) -> bool {
        let pending = self.settings.get().font_url.is_some();
        let result = match self.settings.get().font_url.as_deref() {
            Some(href) => {
                info!("Loading font stylesheet {}", href);
                self.fonts.replace_stylesheet(FONT_LINK_TAG, href)
            }
            None => {
                debug!("No font stylesheet configured");
                self.fonts.remove_stylesheet(FONT_LINK_TAG)
            }
        };
        match result {
            Ok(()) => pending,
            Err(e) => {
                warn!("Font stylesheet update failed: {:?}", e);
                false
            }
        }
    }

    /// 刷新显示的时间，字符数变化时返回 true
    fn render_text(&mut self) -> bool {
        let text = self
            .time_service
            .current_text(self.settings.get().effective_time_format());
        let current = self.target.text();
        if current == text.as_str() {
            return false;
        }

        let resized = current.chars().count() != text.chars().count();
        trace!("Time text {:?}", text);
        self.target.set_text(&text);
        resized
    }

    fn refit(&mut self, now: Instant) {
        if self.fitter.is_fitting() {
            debug!("Fit already running, refit coalesced");
            return;
        }
        self.next_refit = Some(now + PERIODIC_REFIT_INTERVAL);

        let config = self.settings.get();
        let applied = match config.sizing_mode {
            SizingMode::Search => match self.fitter.fit(&mut self.target) {
                FitOutcome::Fitted { applied, .. } => Some(applied),
                FitOutcome::Unchanged(reason) => {
                    debug!("Fit skipped: {:?}", reason);
                    None
                }
            },
            SizingMode::Responsive => {
                let bounds = self.target.bounds();
                if bounds.is_empty() {
                    debug!("Skipping responsive sizing for empty container");
                    None
                } else {
                    let px = (bounds.min_side() * config.responsive_ratio as f32 / 100.0) as u32;
                    Some(self.fitter.apply(&mut self.target, px))
                }
            }
            SizingMode::Host => Some(self.fitter.apply(&mut self.target, config.font_size)),
        };

        if let Some(applied) = applied {
            self.applied = Some(applied);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use jiff::civil::{Time, time};
    use serde_json::{Value, json};

    use super::*;
    use crate::services::binary_search_fit;
    use crate::services::fit_service::tests::MonoTarget;
    use crate::services::{DEFAULT_MIN_FONT_PX, MIN_RENDERABLE_PX};

    #[derive(Default)]
    struct RecordingFonts {
        ops: Vec<(&'static str, String)>,
    }

    impl FontLoader for RecordingFonts {
        type Error = ();

        fn replace_stylesheet(&mut self, tag: &str, href: &str) -> Result<(), ()> {
            assert_eq!(tag, FONT_LINK_TAG);
            self.ops.push(("replace", href.into()));
            Ok(())
        }

        fn remove_stylesheet(&mut self, tag: &str) -> Result<(), ()> {
            assert_eq!(tag, FONT_LINK_TAG);
            self.ops.push(("remove", String::new()));
            Ok(())
        }
    }

    #[derive(Clone)]
    struct SharedClock(Rc<Cell<Time>>);

    impl TimeSource for SharedClock {
        fn now(&self) -> Time {
            self.0.get()
        }
    }

    type Display = TimeDisplay<MonoTarget, RecordingFonts, SharedClock>;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn patch(value: Value) -> ConfigPatch {
        match value {
            Value::Object(map) => ConfigPatch::from_json(&map),
            _ => panic!("test patch must be an object"),
        }
    }

    fn settings(value: Value) -> WidgetEvent {
        WidgetEvent::Host(HostMessage::SettingsUpdate(patch(value)))
    }

    fn start(width: f32, height: f32, now: Time) -> (Display, Rc<Cell<Time>>) {
        start_with(width, height, now, WidgetConfig::default())
    }

    fn start_with(
        width: f32,
        height: f32,
        now: Time,
        config: WidgetConfig,
    ) -> (Display, Rc<Cell<Time>>) {
        let clock = Rc::new(Cell::new(now));
        let display = TimeDisplay::init(
            Some(MonoTarget::new(width, height, "")),
            RecordingFonts::default(),
            SharedClock(clock.clone()),
            config,
            at(0),
        )
        .unwrap();
        (display, clock)
    }

    fn probes_for_one_fit(target: &MonoTarget) -> u32 {
        binary_search_fit(target.bounds, DEFAULT_MIN_FONT_PX, |px| {
            Some(target.rendered(px))
        })
        .unwrap()
        .probes
    }

    #[test]
    fn missing_target_is_an_error() {
        let result = TimeDisplay::<MonoTarget, (), Time>::init(
            None,
            (),
            time(13, 5, 9, 0),
            WidgetConfig::default(),
            at(0),
        );
        assert!(matches!(result, Err(WidgetError::MissingRenderTarget)));
    }

    #[test]
    fn init_renders_styles_and_fits() {
        let (display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        let target = display.target();

        assert_eq!(target.text, "13:05:09");
        assert_eq!(target.font_px, 81);
        assert_eq!(target.color, DEFAULT_TEXT_COLOR);
        assert_eq!(target.family, DEFAULT_FONT_FAMILY);
        assert_eq!(
            display.fonts().ops,
            [("replace", String::from(DEFAULT_FONT_URL))]
        );
        assert_eq!(display.applied_size(), Some(AppliedSize::literal(81)));
        assert_eq!(display.next_deadline(), Some(at(1000)));
    }

    #[test]
    fn tick_refits_only_when_text_length_changes() {
        let config = WidgetConfig {
            time_format: TimeFormat::Hour12NoSeconds,
            ..WidgetConfig::default()
        };
        let (mut display, clock) = start_with(300.0, 100.0, time(9, 59, 59, 0), config);
        assert_eq!(display.target().text, "9:59 AM");
        assert_eq!(display.target().font_px, 69);

        clock.set(time(10, 0, 0, 0));
        display.poll(at(1000)).unwrap();
        assert_eq!(display.target().text, "10:00 AM");
        assert_eq!(display.target().font_px, 60);

        let probes = display.target().probes;
        clock.set(time(10, 1, 0, 0));
        display.poll(at(2000)).unwrap();
        assert_eq!(display.target().text, "10:01 AM");
        assert_eq!(display.target().probes, probes);
        assert_eq!(display.next_deadline(), Some(at(3000)));
    }

    #[test]
    fn late_poll_does_not_replay_missed_ticks() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.poll(at(4500)).unwrap();
        assert_eq!(display.next_deadline(), Some(at(5500)));
    }

    #[test]
    fn resize_burst_fits_once_after_debounce() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.target_mut().bounds = Bounds::new(300.0, 100.0);

        for ms in [10, 50, 100] {
            display.handle_event(WidgetEvent::Resized, at(ms)).unwrap();
        }
        let probes = display.target().probes;

        display.poll(at(200)).unwrap();
        assert_eq!(display.target().font_px, 81);
        assert_eq!(display.target().probes, probes);

        display.poll(at(250)).unwrap();
        // 300 / 4.8 = 62.5 -> 62 - 2
        assert_eq!(display.target().font_px, 60);
        assert_eq!(
            display.target().probes - probes,
            probes_for_one_fit(display.target())
        );
        assert_eq!(display.next_deadline(), Some(at(1000)));
    }

    #[test]
    fn font_load_refits_after_settle_delay() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.target_mut().bounds = Bounds::new(300.0, 100.0);

        display.handle_event(WidgetEvent::FontLoaded, at(300)).unwrap();
        display.poll(at(350)).unwrap();
        assert_eq!(display.target().font_px, 81);

        display.poll(at(400)).unwrap();
        assert_eq!(display.target().font_px, 60);
    }

    #[test]
    fn periodic_refit_catches_silent_layout_changes() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.target_mut().bounds = Bounds::new(300.0, 100.0);

        display.poll(at(19_999)).unwrap();
        assert_eq!(display.target().font_px, 81);

        display.poll(at(20_000)).unwrap();
        assert_eq!(display.target().font_px, 60);
        assert_eq!(display.next_refit, Some(at(40_000)));
        // 迟到的 poll 把下一次刷新推到了 19_999 + 1s
        assert_eq!(display.next_deadline(), Some(at(20_999)));
    }

    #[test]
    fn settings_update_touches_only_changed_properties() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.target_mut().color = "untouched".into();

        display
            .handle_event(settings(json!({ "fontFamily": "Orbitron" })), at(10))
            .unwrap();

        assert_eq!(display.target().family, "Orbitron");
        assert_eq!(display.target().color, "untouched");
        assert_eq!(display.fonts().ops.len(), 1);
    }

    #[test]
    fn font_url_changes_swap_the_stylesheet() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));

        display
            .handle_event(
                settings(json!({ "fontUrl": "https://example.com/orbitron.css" })),
                at(10),
            )
            .unwrap();
        display
            .handle_event(settings(json!({ "fontUrl": "" })), at(20))
            .unwrap();

        assert_eq!(
            display.fonts().ops,
            [
                ("replace", String::from(DEFAULT_FONT_URL)),
                ("replace", String::from("https://example.com/orbitron.css")),
                ("remove", String::new()),
            ]
        );
    }

    #[test]
    fn clearing_font_url_refits_with_fallback_font() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.target_mut().bounds = Bounds::new(300.0, 100.0);

        display
            .handle_event(
                settings(json!({ "fontUrl": "https://example.com/orbitron.css" })),
                at(10),
            )
            .unwrap();
        // 新样式表还没加载完成
        assert_eq!(display.target().font_px, 81);

        display
            .handle_event(settings(json!({ "fontUrl": "" })), at(20))
            .unwrap();
        assert_eq!(display.target().font_px, 60);
    }

    #[test]
    fn reset_restores_defaults_and_refits() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display
            .handle_event(
                settings(json!({
                    "textColor": "red",
                    "sizingMode": "host",
                    "fontSize": 20,
                    "timeFormat": "12h",
                })),
                at(10),
            )
            .unwrap();
        assert_eq!(display.target().font_px, 20);

        display
            .handle_event(WidgetEvent::ResetSettings, at(20))
            .unwrap();

        assert_eq!(display.config(), &WidgetConfig::default());
        assert_eq!(display.target().color, DEFAULT_TEXT_COLOR);
        assert_eq!(display.target().text, "13:05:09");
        assert_eq!(display.target().font_px, 81);
    }

    #[test]
    fn color_change_does_not_refit() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        let probes = display.target().probes;

        display
            .handle_event(settings(json!({ "textColor": "#00ff00" })), at(10))
            .unwrap();

        assert_eq!(display.target().color, "#00ff00");
        assert_eq!(display.target().probes, probes);
    }

    #[test]
    fn format_and_locale_changes_rerender_immediately() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));

        display
            .handle_event(settings(json!({ "timeFormat": "12h-no-seconds" })), at(10))
            .unwrap();
        assert_eq!(display.target().text, "1:05 PM");

        display
            .handle_event(settings(json!({ "locale": "ja-JP" })), at(20))
            .unwrap();
        assert_eq!(display.target().text, "午後1:05");

        display
            .handle_event(settings(json!({ "timeFormat": "12h" })), at(30))
            .unwrap();
        assert_eq!(display.target().text, "午後1:05:09");
    }

    #[test]
    fn show_seconds_persists_across_format_updates() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));

        display
            .handle_event(settings(json!({ "showSeconds": false })), at(10))
            .unwrap();
        assert_eq!(display.target().text, "13:05");

        display
            .handle_event(settings(json!({ "timeFormat": "24h" })), at(20))
            .unwrap();
        assert_eq!(display.target().text, "13:05");

        display
            .handle_event(
                settings(json!({ "timeFormat": "12h-no-seconds", "showSeconds": true })),
                at(30),
            )
            .unwrap();
        assert_eq!(display.target().text, "1:05 PM");
    }

    #[test]
    fn letter_spacing_is_applied_before_fitting() {
        let (mut display, _) = start(300.0, 100.0, time(13, 5, 9, 0));
        assert_eq!(display.target().font_px, 60);

        display
            .handle_event(settings(json!({ "letterSpacing": 10 })), at(10))
            .unwrap();

        assert!((display.target().letter_spacing_em - 0.1).abs() < 1e-6);
        // 300 / (8 * 0.7) = 53.6 -> 53 - 2
        assert_eq!(display.target().font_px, 51);
    }

    #[test]
    fn responsive_and_host_sizing_modes() {
        let (mut display, _) = start(300.0, 100.0, time(13, 5, 9, 0));

        display
            .handle_event(settings(json!({ "sizingMode": "responsive" })), at(10))
            .unwrap();
        assert_eq!(display.target().font_px, 50);

        display
            .handle_event(
                settings(json!({ "sizingMode": "host", "fontSize": 36 })),
                at(20),
            )
            .unwrap();
        assert_eq!(display.target().font_px, 36);
        assert_eq!(display.target().scale, 1.0);
    }

    #[test]
    fn scaled_fallback_applies_to_every_mode() {
        let (mut display, _) = start(300.0, 100.0, time(13, 5, 9, 0));

        display
            .handle_event(
                settings(json!({ "sizingMode": "host", "fontSize": 8 })),
                at(10),
            )
            .unwrap();
        assert_eq!(display.target().font_px, MIN_RENDERABLE_PX);
        assert!((display.target().scale - 8.0 / 12.0).abs() < 1e-6);

        display
            .handle_event(settings(json!({ "scaledFallback": false })), at(20))
            .unwrap();
        assert_eq!(display.target().font_px, 8);
        assert_eq!(display.target().scale, 1.0);
    }

    #[test]
    fn midpoint_strategy_can_be_selected() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));

        display
            .handle_event(settings(json!({ "searchStrategy": "midpoint" })), at(10))
            .unwrap();

        let target = display.target();
        assert!(target.font_px <= 81 && target.font_px >= 78);
        assert!(target.rendered(target.font_px as f32).fits_within(&target.bounds));
    }

    #[test]
    fn degenerate_container_keeps_previous_size() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.target_mut().bounds = Bounds::new(0.0, 0.0);
        let probes = display.target().probes;

        display.handle_event(WidgetEvent::Resized, at(10)).unwrap();
        display.poll(at(160)).unwrap();

        assert_eq!(display.target().font_px, 81);
        assert_eq!(display.target().probes, probes);
    }

    #[test]
    fn unknown_settings_are_stored_without_side_effects() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        let probes = display.target().probes;

        display
            .handle_event(settings(json!({ "showDate": true })), at(10))
            .unwrap();

        assert_eq!(display.config().extras.get("showDate"), Some(&Value::Bool(true)));
        assert_eq!(display.target().probes, probes);
    }

    #[test]
    fn teardown_cancels_everything() {
        let (mut display, _) = start(480.0, 100.0, time(13, 5, 9, 0));
        display.handle_event(WidgetEvent::Resized, at(10)).unwrap();

        display.handle_event(WidgetEvent::Teardown, at(20)).unwrap();

        assert!(display.is_torn_down());
        assert_eq!(display.next_deadline(), None);
        assert_eq!(
            display.handle_event(WidgetEvent::Resized, at(30)),
            Err(WidgetError::Inert)
        );
        assert_eq!(display.poll(at(1000)), Err(WidgetError::Inert));
    }
}
