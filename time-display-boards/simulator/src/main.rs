mod drivers;
mod input;

use std::env;
use std::io::{self, BufRead};
use std::thread;

use embassy_executor::Spawner;
use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use static_cell::StaticCell;
use time_display_common::*;
use time_display_core::{SettingsManager, TimeDisplay, run_widget};

use drivers::{SimulatedFontLoader, SimulatedSurface, WallClock, set_container};
use input::{Input, parse_line, parse_settings, parse_size};

const DEFAULT_CONTAINER: Bounds = Bounds::new(800.0, 200.0);

type EventChannel = WidgetChannel<CriticalSectionRawMutex, WidgetEvent>;
type EventSender = WidgetSender<'static, CriticalSectionRawMutex, WidgetEvent>;

static EVENTS: StaticCell<EventChannel> = StaticCell::new();

fn initial_config() -> WidgetConfig {
    let mut settings = SettingsManager::new();
    if let Ok(raw) = env::var("TIME_DISPLAY_SETTINGS") {
        match parse_settings(&raw) {
            Ok(patch) => {
                settings.merge(&patch);
            }
            Err(e) => warn!("Ignoring TIME_DISPLAY_SETTINGS: {}", e),
        }
    }
    settings.get().clone()
}

fn initial_container() -> Bounds {
    match env::var("TIME_DISPLAY_SIZE") {
        Ok(raw) => parse_size(&raw).unwrap_or_else(|| {
            warn!("Invalid TIME_DISPLAY_SIZE {:?}, expected <w>x<h>", raw);
            DEFAULT_CONTAINER
        }),
        Err(_) => DEFAULT_CONTAINER,
    }
}

fn spawn_stdin_reader(sender: EventSender) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            };

            match parse_line(&line) {
                Ok(Some(Input::Event(event))) => {
                    let quit = matches!(event, WidgetEvent::Teardown);
                    block_on(sender.send(event));
                    if quit {
                        return;
                    }
                }
                Ok(Some(Input::Resize(bounds))) => {
                    info!("Container resized to {}x{}", bounds.width, bounds.height);
                    set_container(bounds);
                    block_on(sender.send(WidgetEvent::Resized));
                }
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            }
        }

        info!("stdin closed");
        block_on(sender.send(WidgetEvent::Teardown));
    });
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("time-display simulator starting...");

    let container = initial_container();
    set_container(container);
    info!("Container {}x{}", container.width, container.height);

    let channel: &'static EventChannel = EVENTS.init(EventChannel::new());
    spawn_stdin_reader(channel.sender());

    let mut widget = match TimeDisplay::init(
        Some(SimulatedSurface::new()),
        SimulatedFontLoader::new(channel.sender()),
        WallClock,
        initial_config(),
        Instant::now(),
    ) {
        Ok(widget) => widget,
        Err(e) => {
            error!("Failed to start time display: {}", e);
            return;
        }
    };

    if let Err(e) = run_widget(&mut widget, channel.receiver()).await {
        error!("Time display loop error: {}", e);
    }
}
