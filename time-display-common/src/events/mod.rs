//! 小部件事件定义模块
//!
//! - 宿主消息 (HostMessage)：SETTINGS_UPDATE / CONFIG_UPDATE
//! - 小部件事件 (WidgetEvent)：宿主消息、尺寸变化、字体加载完成、恢复默认、销毁

pub mod host;
pub mod widget;

pub use host::HostMessage;
pub use widget::WidgetEvent;
