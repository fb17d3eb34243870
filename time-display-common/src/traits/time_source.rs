use jiff::civil::Time;

/// 本地时钟
pub trait TimeSource {
    /// 当前本地时间（时区由宿主决定）
    fn now(&self) -> Time;
}

/// 固定时间，用于测试和静态预览
impl TimeSource for Time {
    fn now(&self) -> Time {
        *self
    }
}
