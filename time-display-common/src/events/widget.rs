use crate::events::HostMessage;

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// 宿主发送的配置消息
    Host(HostMessage),
    /// 容器尺寸变化，需要去抖
    Resized,
    /// 字体样式表加载完成
    FontLoaded,
    /// 恢复默认配置
    ResetSettings,
    /// 销毁小部件，取消所有定时器
    Teardown,
}
