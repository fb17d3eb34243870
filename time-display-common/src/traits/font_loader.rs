//! 字体样式表加载 trait

use core::convert::Infallible;

/// 本小部件注入的样式表标记
pub const FONT_LINK_TAG: &str = "time-display";

/// 字体样式表加载器
///
/// 同一标记下只保留一个样式表。加载是异步的，完成后由宿主投递
/// [`WidgetEvent::FontLoaded`](crate::events::WidgetEvent::FontLoaded)。
/// 样式表无法加载时该事件永远不会到达。
pub trait FontLoader {
    /// 错误类型
    type Error: core::fmt::Debug;

    /// 移除带相同标记的旧样式表并插入新的
    fn replace_stylesheet(&mut self, tag: &str, href: &str) -> Result<(), Self::Error>;

    /// 移除带该标记的样式表
    fn remove_stylesheet(&mut self, tag: &str) -> Result<(), Self::Error>;
}

/// 允许空实现的 FontLoader（用于只使用系统字体的宿主）
impl FontLoader for () {
    type Error = Infallible;

    fn replace_stylesheet(&mut self, _tag: &str, _href: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn remove_stylesheet(&mut self, _tag: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}
