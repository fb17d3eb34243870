use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use time_display_common::*;

/// 半角字符的字宽，单位 em
const HALF_WIDTH_ADVANCE: f32 = 0.6;
/// 全角字符的字宽，单位 em
const FULL_WIDTH_ADVANCE: f32 = 1.0;
const LINE_HEIGHT: f32 = 1.2;

/// 模拟容器尺寸，由输入线程修改
static CONTAINER: Mutex<CriticalSectionRawMutex, Cell<Bounds>> =
    Mutex::new(Cell::new(Bounds::new(0.0, 0.0)));

pub fn set_container(bounds: Bounds) {
    CONTAINER.lock(|cell| cell.set(bounds));
}

fn is_half_width_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control()
}

/// 终端上的模拟渲染面
pub struct SimulatedSurface {
    text: String,
    font_px: u32,
    scale: f32,
    letter_spacing_em: f32,
    family: String,
    color: String,
}

impl SimulatedSurface {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            font_px: DEFAULT_FONT_SIZE,
            scale: 1.0,
            letter_spacing_em: 0.0,
            family: String::new(),
            color: String::new(),
        }
    }

    fn text_width_em(&self) -> f32 {
        self.text
            .chars()
            .map(|c| {
                let advance = if is_half_width_char(c) {
                    HALF_WIDTH_ADVANCE
                } else {
                    FULL_WIDTH_ADVANCE
                };
                advance + self.letter_spacing_em
            })
            .sum()
    }

    fn present(&self) {
        println!(
            "{:>10}  [{}px x{:.2} {} {}]",
            self.text, self.font_px, self.scale, self.color, self.family
        );
    }
}

impl RenderTarget for SimulatedSurface {
    fn bounds(&self) -> Bounds {
        CONTAINER.lock(|cell| cell.get())
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.present();
    }

    fn measure(&mut self, font_px: f32) -> Option<Measurement> {
        if self.text.is_empty() {
            return None;
        }
        let width = (self.text_width_em() * font_px).max(0.0);
        Some(Measurement::new(width, LINE_HEIGHT * font_px))
    }

    fn font_size(&self) -> u32 {
        self.font_px
    }

    fn set_font_size(&mut self, px: u32) {
        if self.font_px != px {
            debug!("Surface font size {}px -> {}px", self.font_px, px);
            self.font_px = px;
        }
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn set_font_family(&mut self, family: &str) {
        self.family = family.to_string();
    }

    fn set_color(&mut self, color: &str) {
        self.color = color.to_string();
    }

    fn set_letter_spacing(&mut self, em: f32) {
        self.letter_spacing_em = em;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_width_glyphs_are_wider() {
        let mut surface = SimulatedSurface::new();
        surface.text = "12:00".into();
        let ascii = surface.measure(10.0).unwrap();
        surface.text = "午後1:05".into();
        let cjk = surface.measure(10.0).unwrap();

        assert!((ascii.width - 30.0).abs() < 1e-4);
        assert!((cjk.width - 44.0).abs() < 1e-4);
        assert!((cjk.height - 12.0).abs() < 1e-4);
    }

    #[test]
    fn letter_spacing_scales_with_font_size() {
        let mut surface = SimulatedSurface::new();
        surface.text = "0000".into();
        surface.set_letter_spacing(0.1);

        let small = surface.measure(10.0).unwrap();
        let large = surface.measure(20.0).unwrap();

        assert!((large.width - 2.0 * small.width).abs() < 1e-4);
    }

    #[test]
    fn empty_text_cannot_be_measured() {
        assert_eq!(SimulatedSurface::new().measure(10.0), None);
    }
}
