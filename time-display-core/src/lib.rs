#![cfg_attr(not(test), no_std)]

extern crate alloc;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Instant, Timer};
use time_display_common::*;

pub mod managers;
pub mod services;

pub use managers::*;
pub use services::*;

/// 小部件主循环
///
/// 等待下一条事件或下一个截止时间，收到 [`WidgetEvent::Teardown`] 后返回。
pub async fn run_widget<M, T, F, C>(
    widget: &mut TimeDisplay<T, F, C>,
    receiver: WidgetReceiver<'_, M, WidgetEvent>,
) -> WidgetResult<()>
where
    M: RawMutex,
    T: RenderTarget,
    F: FontLoader,
    C: TimeSource,
{
    info!("Time display loop started");

    loop {
        let event = match widget.next_deadline() {
            Some(deadline) => match select(receiver.receive(), Timer::at(deadline)).await {
                Either::First(event) => Some(event),
                Either::Second(()) => None,
            },
            None => Some(receiver.receive().await),
        };

        let now = Instant::now();
        if let Some(event) = event {
            let stop = matches!(event, WidgetEvent::Teardown);
            if let Err(e) = widget.handle_event(event, now) {
                error!("Failed to handle event: {:?}", e);
            }
            if stop {
                info!("Time display loop stopped");
                return Ok(());
            }
        }

        widget.poll(now)?;
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use jiff::civil::time;
    use serde_json::json;

    use super::*;
    use crate::services::fit_service::tests::MonoTarget;

    #[test]
    fn loop_applies_queued_events_and_stops_on_teardown() {
        let channel = WidgetChannel::<CriticalSectionRawMutex, WidgetEvent>::new();
        let mut widget = TimeDisplay::init(
            Some(MonoTarget::new(480.0, 100.0, "")),
            (),
            time(13, 5, 9, 0),
            WidgetConfig::default(),
            Instant::now(),
        )
        .unwrap();

        let message = HostMessage::from_value(json!({
            "type": "CONFIG_UPDATE",
            "config": { "timeFormat": "24h-no-seconds" },
        }))
        .unwrap()
        .unwrap();
        channel.try_send(WidgetEvent::Host(message)).unwrap();
        channel.try_send(WidgetEvent::Teardown).unwrap();

        block_on(run_widget(&mut widget, channel.receiver())).unwrap();

        assert_eq!(widget.target().text, "13:05");
        assert!(widget.is_torn_down());
        assert_eq!(widget.next_deadline(), None);
    }
}
