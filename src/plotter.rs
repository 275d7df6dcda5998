use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgb, RgbImage, Rgba, RgbaImage};
use log::{info, warn};

use crate::config::{ConfigError, RenderConfig};
use crate::error::Result;
use crate::types::{Spectrogram, SpectrumFrame};

/// 热力图每个单元格的像素尺寸
const CELL_WIDTH: u32 = 8;
const CELL_HEIGHT: u32 = 4;

/// 绘图区边距 (左, 右, 上, 下)
const MARGIN: (u32, u32, u32, u32) = (50, 20, 30, 40);

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AXIS_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LINE_COLOR: Rgba<u8> = Rgba([31, 119, 180, 255]);
const PEAK_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// viridis 色图的几个关键点
const VIRIDIS: [[f64; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

/// 输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Heatmap,
    Animation,
    None,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Heatmap => write!(f, "heatmap"),
            RenderMode::Animation => write!(f, "animation"),
            RenderMode::None => write!(f, "none"),
        }
    }
}

impl FromStr for RenderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "heatmap" => Ok(RenderMode::Heatmap),
            "animation" => Ok(RenderMode::Animation),
            "none" => Ok(RenderMode::None),
            other => Err(ConfigError::unsupported("mode", other)),
        }
    }
}

/// 按配置输出图像，返回写入的文件路径
pub fn render(spectrogram: &Spectrogram, config: &RenderConfig) -> Result<Option<PathBuf>> {
    let mode = config.mode()?;
    let Some(path) = config.output_path()? else {
        return Ok(None);
    };

    if spectrogram.is_empty() {
        warn!("No complete window to render, skipping {} output", mode);
        return Ok(None);
    }

    match mode {
        RenderMode::Heatmap => render_heatmap(spectrogram, config.heatmap_vmax, &path)?,
        RenderMode::Animation => render_animation(spectrogram, config, &path)?,
        RenderMode::None => return Ok(None),
    }

    info!("Saved {} to {:?}", mode, path);
    Ok(Some(path))
}

/// 横轴为频率、纵轴为窗口序号的强度图，强度在 `vmax` 处截断
pub fn heatmap_image(spectrogram: &Spectrogram, vmax: f64) -> RgbImage {
    let cols = spectrogram.frequencies.len() as u32;
    let rows = spectrogram.frames.len() as u32;

    RgbImage::from_fn(cols * CELL_WIDTH, rows * CELL_HEIGHT, |x, y| {
        let frame = &spectrogram.frames[(y / CELL_HEIGHT) as usize];
        let magnitude = frame.magnitudes[(x / CELL_WIDTH) as usize];
        colormap((magnitude / vmax).clamp(0.0, 1.0))
    })
}

pub fn render_heatmap(spectrogram: &Spectrogram, vmax: f64, path: &Path) -> Result<()> {
    heatmap_image(spectrogram, vmax).save(path)?;
    Ok(())
}

/// 单帧频谱曲线，红色竖线标出主峰
pub fn spectrum_frame_image(
    frame: &SpectrumFrame,
    frequencies: &[f64],
    config: &RenderConfig,
) -> RgbaImage {
    let (width, height) = (config.frame_width, config.frame_height);
    let mut img = RgbaImage::from_pixel(width, height, BACKGROUND);

    let (left, right, top, bottom) = MARGIN;
    let plot_w = width.saturating_sub(left + right).max(1) as f64;
    let plot_h = height.saturating_sub(top + bottom).max(1) as f64;
    let x_max = frequencies.last().copied().unwrap_or(1.0);

    let to_px = |freq: f64, value: f64| -> (i64, i64) {
        let x = left as f64 + freq / x_max * plot_w;
        let y = top as f64 + plot_h * (1.0 - (value / config.animation_ylim).clamp(0.0, 1.0));
        (x.round() as i64, y.round() as i64)
    };

    // 坐标轴边框
    let (x0, y0) = to_px(0.0, config.animation_ylim);
    let (x1, y1) = to_px(x_max, 0.0);
    draw_line(&mut img, (x0, y0), (x1, y0), AXIS_COLOR);
    draw_line(&mut img, (x0, y1), (x1, y1), AXIS_COLOR);
    draw_line(&mut img, (x0, y0), (x0, y1), AXIS_COLOR);
    draw_line(&mut img, (x1, y0), (x1, y1), AXIS_COLOR);

    let points: Vec<(i64, i64)> = frequencies
        .iter()
        .zip(&frame.magnitudes)
        .map(|(&f, &m)| to_px(f, m))
        .collect();
    for pair in points.windows(2) {
        draw_line(&mut img, pair[0], pair[1], LINE_COLOR);
    }

    let (peak_x, _) = to_px(frame.peak_hz, 0.0);
    draw_line(&mut img, (peak_x, y0), (peak_x, y1), PEAK_COLOR);

    img
}

/// 每个窗口一帧，无限循环的 GIF
pub fn render_animation(spectrogram: &Spectrogram, config: &RenderConfig, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite)?;

    let delay = Delay::from_numer_denom_ms(config.frame_duration_ms, 1);
    for frame in &spectrogram.frames {
        info!("Frame {}; peak={:06.3}", frame.index, frame.peak_hz);
        let img = spectrum_frame_image(frame, &spectrogram.frequencies, config);
        encoder.encode_frame(Frame::from_parts(img, 0, 0, delay))?;
    }

    Ok(())
}

fn colormap(t: f64) -> Rgb<u8> {
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix = |c: usize| (a[c] + (b[c] - a[c]) * frac).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// Bresenham 画线，超出画布的像素忽略
fn draw_line(img: &mut RgbaImage, from: (i64, i64), to: (i64, i64), color: Rgba<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, color);
        }
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
