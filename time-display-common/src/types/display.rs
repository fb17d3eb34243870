/// 容器的包围盒，单位为设备无关像素
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// 宽或高不为正时视为空盒子
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// 应用候选字号后测得的渲染尺寸
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    pub width: f32,
    pub height: f32,
}

impl Measurement {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn fits_within(&self, bounds: &Bounds) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }

    pub fn overflows(&self, bounds: &Bounds) -> bool {
        self.width > bounds.width || self.height > bounds.height
    }
}

/// 实际写入目标元素的字号与缩放
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedSize {
    /// 目标字号
    pub target_px: u32,
    /// 元素上的 font-size
    pub font_px: u32,
    /// 元素上的 transform 缩放系数
    pub scale: f32,
}

impl AppliedSize {
    pub const fn literal(px: u32) -> Self {
        Self {
            target_px: px,
            font_px: px,
            scale: 1.0,
        }
    }

    pub fn is_scaled(&self) -> bool {
        self.scale < 1.0
    }
}
