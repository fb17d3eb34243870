use embassy_sync::channel::{Channel, Receiver, Sender};

/// 事件队列深度
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// 通道类型
pub type WidgetChannel<M, T> = Channel<M, T, EVENT_QUEUE_DEPTH>;

/// 通道接收者类型
pub type WidgetReceiver<'a, M, T> = Receiver<'a, M, T, EVENT_QUEUE_DEPTH>;

/// 通道发送者类型
pub type WidgetSender<'a, M, T> = Sender<'a, M, T, EVENT_QUEUE_DEPTH>;
