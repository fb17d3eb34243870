use std::convert::Infallible;
use std::thread;
use std::time::Duration;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use time_display_common::*;

/// 模拟样式表下载耗时
const SIMULATED_LOAD_TIME: Duration = Duration::from_millis(300);

type EventSender = WidgetSender<'static, CriticalSectionRawMutex, WidgetEvent>;

/// 模拟的样式表加载器
///
/// 每次替换样式表都会在后台线程等待一段时间后投递 [`WidgetEvent::FontLoaded`]。
pub struct SimulatedFontLoader {
    sender: EventSender,
    current: Option<String>,
}

impl SimulatedFontLoader {
    pub fn new(sender: EventSender) -> Self {
        Self {
            sender,
            current: None,
        }
    }
}

impl FontLoader for SimulatedFontLoader {
    type Error = Infallible;

    fn replace_stylesheet(&mut self, tag: &str, href: &str) -> Result<(), Self::Error> {
        if let Some(old) = self.current.replace(href.to_string()) {
            debug!("Removing stylesheet [{}] {}", tag, old);
        }
        info!("Injecting stylesheet [{}] {}", tag, href);

        let sender = self.sender;
        thread::spawn(move || {
            thread::sleep(SIMULATED_LOAD_TIME);
            block_on(sender.send(WidgetEvent::FontLoaded));
        });
        Ok(())
    }

    fn remove_stylesheet(&mut self, tag: &str) -> Result<(), Self::Error> {
        if let Some(old) = self.current.take() {
            info!("Removing stylesheet [{}] {}", tag, old);
        }
        Ok(())
    }
}
