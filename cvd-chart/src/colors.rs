//! Series colors and heatmap color scales.

use serde::Serialize;

/// The category-10 palette.
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

/// Control points of the green-blue sequential ramp, light to dark.
const GNBU: [(u8, u8, u8); 9] = [
    (0xf7, 0xfc, 0xf0),
    (0xe0, 0xf3, 0xdb),
    (0xcc, 0xeb, 0xc5),
    (0xa8, 0xdd, 0xb5),
    (0x7b, 0xcc, 0xc4),
    (0x4e, 0xb3, 0xd3),
    (0x2b, 0x8c, 0xbe),
    (0x08, 0x68, 0xac),
    (0x08, 0x40, 0x81),
];

const DARK_TEXT: &str = "#4d4d4d";
const LIGHT_TEXT: &str = "#ffffff";

/// Most buckets an adaptive scale produces.
pub const MAX_ADAPTIVE_BUCKETS: usize = 8;

/// Upper bound used for the open-ended last bucket.
const OPEN_END: f64 = 999_999_999.0;

/// One heatmap bucket. Bounds are inclusive; adjacent buckets share a bound
/// and the earlier bucket takes it, as the chart does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRange {
    pub from: f64,
    pub to: f64,
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fore_color: Option<String>,
}

impl ColorRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.from && value <= self.to
    }
}

/// The first bucket holding `value`.
pub fn bucket_for(ranges: &[ColorRange], value: f64) -> Option<&ColorRange> {
    ranges.iter().find(|r| r.contains(value))
}

fn hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let c = color.strip_prefix('#')?;
    if c.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&c[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// WCAG relative luminance of an `#rrggbb` color.
pub fn luminance(color: &str) -> Option<f64> {
    let (r, g, b) = parse_hex(color)?;
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Some(0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b))
}

/// Dark text on light backgrounds, white text on dark ones.
pub fn readable_color(background: &str) -> &'static str {
    match luminance(background) {
        Some(l) if l > 0.179 => DARK_TEXT,
        _ => LIGHT_TEXT,
    }
}

/// Color at `t` in `[0, 1]` along the green-blue ramp.
pub fn gnbu(t: f64) -> String {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (GNBU.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(GNBU.len() - 2);
    let f = scaled - i as f64;
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
    let (a, b) = (GNBU[i], GNBU[i + 1]);
    hex(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// The fixed heatmap buckets.
pub fn fixed_ranges() -> Vec<ColorRange> {
    let buckets: [(f64, f64, &str, &str); 9] = [
        (0.0, 10.0, "0-10", "#ffffd9"),
        (10.0, 50.0, "11-50", "#edf8b1"),
        (50.0, 100.0, "51-100", "#c7e9b4"),
        (100.0, 250.0, "101-250", "#7fcdbb"),
        (250.0, 500.0, "251-500", "#41b6c4"),
        (500.0, 1000.0, "501-1000", "#1d91c0"),
        (1000.0, 5000.0, "1001-5000", "#225ea8"),
        (5000.0, 10000.0, "5001-10000", "#253494"),
        (10000.0, OPEN_END, "> 10000", "#081d58"),
    ];
    buckets
        .iter()
        .map(|&(from, to, name, color)| ColorRange {
            from,
            to,
            name: name.to_string(),
            color: color.to_string(),
            fore_color: Some(readable_color(color).to_string()),
        })
        .collect()
}

/// d3-style ticks of a log scale over `[min, max]`: every `k·10^e` while the
/// domain spans few decades, powers of ten otherwise.
fn log_ticks(min: f64, max: f64) -> Vec<f64> {
    let lo = min.log10().floor() as i32;
    let hi = max.log10().ceil() as i32;
    let multiples: Vec<f64> = if hi - lo < 10 {
        (1..=9).map(f64::from).collect()
    } else {
        vec![1.0]
    };
    let mut ticks = Vec::new();
    for e in lo..=hi {
        for k in &multiples {
            let v = k * 10f64.powi(e);
            if v >= min && v <= max {
                ticks.push(v);
            }
        }
    }
    ticks
}

/// Logarithmic buckets over the values' domain, at most
/// [`MAX_ADAPTIVE_BUCKETS`] ticks plus the leading bucket from zero.
pub fn adaptive_ranges(values: &[f64]) -> Vec<ColorRange> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(max) = finite.iter().copied().reduce(f64::max) else {
        return Vec::new();
    };
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min).max(1.0);
    let max = max.max(min);

    let ticks = log_ticks(min, max);
    let step = if ticks.is_empty() {
        1
    } else {
        ((ticks.len() as f64 / ticks.len().min(MAX_ADAPTIVE_BUCKETS) as f64).round() as usize).max(1)
    };
    let mut bounds = vec![0.0];
    bounds.extend(ticks.iter().step_by(step).copied());

    let position = |v: f64| {
        if v <= 0.0 || max <= min {
            0.0
        } else {
            (v.ln() - min.ln()) / (max.ln() - min.ln())
        }
    };

    bounds
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let from = if index == 0 { 0.0 } else { value };
            let next = bounds.get(index + 1).copied();
            let name = match next {
                _ if index == 0 => format!("<{}", next.unwrap_or(max) + 1.0),
                Some(to) => format!("{} - {}", value + 1.0, to),
                None => format!(">{}", value),
            };
            let color = gnbu(position(value));
            ColorRange {
                from,
                to: next.unwrap_or(max),
                name,
                fore_color: Some(readable_color(&color).to_string()),
                color,
            }
        })
        .collect()
}

/// Colors for series given as `(name, key)`, returned in input order.
///
/// Up to ten series take the category-10 palette in name order; more series
/// get a color derived from each key.
pub fn series_colors(series: &[(&str, &str)]) -> Vec<String> {
    if series.len() > CATEGORY10.len() {
        return series
            .iter()
            .map(|(_, key)| color_hash(&key.chars().rev().collect::<String>()))
            .collect();
    }
    let mut order: Vec<usize> = (0..series.len()).collect();
    order.sort_by(|&a, &b| series[a].0.cmp(series[b].0));
    let mut colors = vec![String::new(); series.len()];
    for (rank, index) in order.into_iter().enumerate() {
        colors[index] = CATEGORY10[rank].to_string();
    }
    colors
}

fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    hex(channel(r), channel(g), channel(b))
}

/// Deterministic color for a string: hue from an FNV-1a hash, lightness
/// from a shade in 3..=7 derived from the characters.
pub fn color_hash(input: &str) -> String {
    let hash = input
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3));
    let seed: f64 = input
        .chars()
        .enumerate()
        .map(|(i, c)| c as u32 as f64 * i as f64)
        .sum();
    let shade = ((seed.sin() + 1.0) * 2.0 + 3.0).round();
    let hue = (hash % 360) as f64;
    let lightness = 0.85 - shade * 0.08;
    hsl_to_hex(hue, 0.65, lightness)
}
