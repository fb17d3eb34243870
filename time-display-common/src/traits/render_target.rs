//! 渲染目标 trait
//!
//! 由宿主提供的文本节点/容器对。核心逻辑只通过这里的接口读写样式和测量文本，
//! 不关心具体的排版实现。

use crate::types::{Bounds, Measurement};

pub trait RenderTarget {
    /// 容器的包围盒
    fn bounds(&self) -> Bounds;

    /// 当前显示的文本
    fn text(&self) -> &str;

    fn set_text(&mut self, text: &str);

    /// 以候选字号排版当前文本并返回渲染尺寸
    ///
    /// 测量可以改写字号和缩放，搜索失败时由调用方恢复。宿主无法测量时返回 `None`
    fn measure(&mut self, font_px: f32) -> Option<Measurement>;

    /// 元素上当前生效的 font-size
    fn font_size(&self) -> u32;

    fn set_font_size(&mut self, px: u32);

    /// 元素上当前的 transform 缩放系数
    fn scale(&self) -> f32;

    /// 设置 transform 缩放系数，1.0 表示不缩放
    fn set_scale(&mut self, scale: f32);

    fn set_font_family(&mut self, family: &str);

    fn set_color(&mut self, color: &str);

    /// 设置字间距，单位为 em，随字号缩放
    fn set_letter_spacing(&mut self, em: f32);
}
