use jiff::Zoned;
use jiff::civil::Time;
use time_display_common::TimeSource;

/// 系统本地时区的墙上时钟
pub struct WallClock;

impl TimeSource for WallClock {
    fn now(&self) -> Time {
        Zoned::now().time()
    }
}
