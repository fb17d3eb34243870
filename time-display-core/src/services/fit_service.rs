//! 字号自适应服务
//!
//! 只依赖渲染目标的黑盒测量（应用候选字号 → 读取渲染尺寸），不需要任何字形度量。
//! 提供两种搜索策略：
//! - 整数二分查找：假设渲染尺寸随字号单调不减，得到真正的最大可容纳字号
//! - 连续中点逼近：最多 20 次迭代，两个方向的误差都在 ±1px 内时提前结束
//!
//! 两种策略的结果都会再减去 2px 的安全边距，防止亚像素溢出。

use core::cell::Cell;

use time_display_common::*;

/// 默认最小字号
pub const DEFAULT_MIN_FONT_PX: u32 = 6;
/// 安全边距
pub const SAFETY_MARGIN_PX: u32 = 2;
pub const MIDPOINT_MAX_ITERATIONS: u32 = 20;
pub const MIDPOINT_TOLERANCE_PX: f32 = 1.0;
/// 低于该字号时改用基准字号加缩放渲染，绕开平台最小字号限制
pub const MIN_RENDERABLE_PX: u32 = 12;

/// 一次搜索的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitResult {
    pub size: u32,
    pub probes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 容器宽或高不为正
    EmptyBounds,
    EmptyText,
    /// 已有一次搜索正在进行
    Busy,
    MeasurementUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    Fitted {
        result: FitResult,
        applied: AppliedSize,
    },
    /// 没有修改目标元素的字号
    Unchanged(SkipReason),
}

impl FitOutcome {
    pub fn size(&self) -> Option<u32> {
        match self {
            FitOutcome::Fitted { result, .. } => Some(result.size),
            FitOutcome::Unchanged(_) => None,
        }
    }
}

/// 整数二分查找
pub fn binary_search_fit<M>(bounds: Bounds, floor: u32, mut measure: M) -> Result<FitResult, SkipReason>
where
    M: FnMut(f32) -> Option<Measurement>,
{
    if bounds.is_empty() {
        return Err(SkipReason::EmptyBounds);
    }

    let floor = floor.max(1);
    let mut lo = floor;
    let mut hi = bounds.min_side() as u32;
    let mut best = lo;
    let mut probes = 0;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        probes += 1;
        let rendered = measure(mid as f32).ok_or(SkipReason::MeasurementUnavailable)?;
        trace!(
            "binary probe {}px -> {}x{}",
            mid, rendered.width, rendered.height
        );

        if rendered.fits_within(&bounds) {
            best = mid;
            lo = mid + 1;
        } else {
            // mid >= floor >= 1
            hi = mid - 1;
        }
    }

    Ok(FitResult {
        size: best.saturating_sub(SAFETY_MARGIN_PX).max(floor),
        probes,
    })
}

/// 连续中点逼近
pub fn midpoint_fit<M>(bounds: Bounds, floor: u32, mut measure: M) -> Result<FitResult, SkipReason>
where
    M: FnMut(f32) -> Option<Measurement>,
{
    if bounds.is_empty() {
        return Err(SkipReason::EmptyBounds);
    }

    let floor = floor.max(1);
    let mut lo = floor as f32;
    let mut hi = bounds.min_side();
    let mut candidate = (lo + hi) / 2.0;
    let mut probes = 0;

    while probes < MIDPOINT_MAX_ITERATIONS {
        probes += 1;
        let rendered = measure(candidate).ok_or(SkipReason::MeasurementUnavailable)?;
        trace!(
            "midpoint probe {}px -> {}x{}",
            candidate, rendered.width, rendered.height
        );

        if within_tolerance(bounds.width - rendered.width)
            && within_tolerance(bounds.height - rendered.height)
        {
            break;
        }

        if rendered.overflows(&bounds) {
            hi = candidate;
        } else {
            lo = candidate;
        }
        candidate = (lo + hi) / 2.0;
    }

    Ok(FitResult {
        size: (candidate as u32).saturating_sub(SAFETY_MARGIN_PX).max(floor),
        probes,
    })
}

fn within_tolerance(delta: f32) -> bool {
    (-MIDPOINT_TOLERANCE_PX..=MIDPOINT_TOLERANCE_PX).contains(&delta)
}

/// 计算实际写入元素的字号和缩放
///
/// 开启缩放回退且目标字号小于 [`MIN_RENDERABLE_PX`] 时，以基准字号渲染并按比例缩小。
pub fn scaled_size(target_px: u32, scaled_fallback: bool) -> AppliedSize {
    if scaled_fallback && target_px < MIN_RENDERABLE_PX {
        AppliedSize {
            target_px,
            font_px: MIN_RENDERABLE_PX,
            scale: target_px as f32 / MIN_RENDERABLE_PX as f32,
        }
    } else {
        AppliedSize::literal(target_px)
    }
}

struct FitGuard<'a> {
    busy: &'a Cell<bool>,
}

impl<'a> FitGuard<'a> {
    fn acquire(busy: &'a Cell<bool>) -> Option<Self> {
        if busy.replace(true) {
            None
        } else {
            Some(Self { busy })
        }
    }
}

impl Drop for FitGuard<'_> {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

pub struct FitService {
    strategy: SearchStrategy,
    min_font_px: u32,
    scaled_fallback: bool,
    busy: Cell<bool>,
}

impl FitService {
    pub fn new(strategy: SearchStrategy) -> Self {
        Self {
            strategy,
            min_font_px: DEFAULT_MIN_FONT_PX,
            scaled_fallback: true,
            busy: Cell::new(false),
        }
    }

    pub fn with_min_font(mut self, px: u32) -> Self {
        self.min_font_px = px.max(1);
        self
    }

    pub fn with_scaled_fallback(mut self, enabled: bool) -> Self {
        self.scaled_fallback = enabled;
        self
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: SearchStrategy) {
        self.strategy = strategy;
    }

    pub fn set_scaled_fallback(&mut self, enabled: bool) {
        self.scaled_fallback = enabled;
    }

    pub fn min_font_px(&self) -> u32 {
        self.min_font_px
    }

    pub fn is_fitting(&self) -> bool {
        self.busy.get()
    }

    /// 对目标元素执行一次完整的字号搜索并写入结果
    ///
    /// 搜索进行中再次调用会直接返回 [`SkipReason::Busy`]，不会嵌套执行。
    pub fn fit<T: RenderTarget>(&self, target: &mut T) -> FitOutcome {
        let Some(_guard) = FitGuard::acquire(&self.busy) else {
            debug!("Fit already in progress, dropping trigger");
            return FitOutcome::Unchanged(SkipReason::Busy);
        };

        let bounds = target.bounds();
        if bounds.is_empty() {
            debug!(
                "Skipping fit for empty container {}x{}",
                bounds.width, bounds.height
            );
            return FitOutcome::Unchanged(SkipReason::EmptyBounds);
        }
        if target.text().is_empty() {
            return FitOutcome::Unchanged(SkipReason::EmptyText);
        }

        let previous = (target.font_size(), target.scale());
        let floor = self.min_font_px;
        let searched = match self.strategy {
            SearchStrategy::Binary => binary_search_fit(bounds, floor, |px| target.measure(px)),
            SearchStrategy::Midpoint => midpoint_fit(bounds, floor, |px| target.measure(px)),
        };

        match searched {
            Ok(result) => {
                let applied = self.apply(target, result.size);
                debug!(
                    "Fitted {}px in {} probes ({:?}, container {}x{})",
                    result.size, result.probes, self.strategy, bounds.width, bounds.height
                );
                FitOutcome::Fitted { result, applied }
            }
            Err(reason) => {
                let (font_px, scale) = previous;
                warn!(
                    "Fit aborted: {:?}, restoring {}px scaled by {}",
                    reason, font_px, scale
                );
                target.set_font_size(font_px);
                target.set_scale(scale);
                FitOutcome::Unchanged(reason)
            }
        }
    }

    /// 写入字号，必要时走缩放回退
    pub fn apply<T: RenderTarget>(&self, target: &mut T, size: u32) -> AppliedSize {
        let applied = scaled_size(size.max(1), self.scaled_fallback);
        target.set_font_size(applied.font_px);
        target.set_scale(applied.scale);
        if applied.is_scaled() {
            debug!(
                "Rendering {}px as {}px scaled by {}",
                applied.target_px, applied.font_px, applied.scale
            );
        }
        applied
    }
}
