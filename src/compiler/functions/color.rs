//! Color functions.
//!
//! Two handlers share this module. [`SassColorFunctions`] computes on
//! structured colors (`sass:color` and the legacy globals such as
//! `lighten`). [`CssColorFunctions`] only re-renders the native CSS color
//! functions (`hsl`, `hwb`, `lab`, `lch`, `oklch`) in canonical syntax;
//! their arguments arrive as text.

use super::{amount, arg, color};
use crate::compiler::runtime::ModuleFunctions;
use crate::compiler::values::{format_number, SassColor, SassNumber, Value};
use crate::error::CompileError;

pub struct SassColorFunctions;

impl ModuleFunctions for SassColorFunctions {
    fn namespace(&self) -> Option<&'static str> {
        Some("color")
    }

    fn module_functions(&self) -> &'static [&'static str] {
        &[
            "red", "green", "blue", "alpha", "opacity", "mix", "adjust", "grayscale",
            "complement", "invert", "lighten", "darken", "saturate", "desaturate",
            "adjust-hue", "transparentize", "opacify", "fade-in", "fade-out",
        ]
    }

    fn global_functions(&self) -> &'static [&'static str] {
        &[
            "rgb", "rgba", "red", "green", "blue", "alpha", "opacity", "lighten", "darken",
            "mix", "transparentize", "fade-out", "opacify", "fade-in", "saturate",
            "desaturate", "adjust-hue", "grayscale", "complement", "invert", "adjust-color",
        ]
    }

    fn remap(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("adjust-color", "adjust"),
            ("fade-out", "transparentize"),
            ("fade-in", "opacify"),
            ("opacity", "alpha"),
        ]
    }

    fn signature(&self, name: &str) -> &'static [&'static str] {
        match name {
            "rgb" | "rgba" => &["red", "green", "blue", "alpha"],
            "mix" => &["color1", "color2", "weight"],
            "invert" => &["color", "weight"],
            "adjust-hue" => &["color", "degrees"],
            "adjust" => &[
                "color", "red", "green", "blue", "hue", "saturation", "lightness", "alpha",
            ],
            "lighten" | "darken" | "saturate" | "desaturate" | "transparentize" | "opacify" => {
                &["color", "amount"]
            }
            _ => &["color"],
        }
    }

    fn handle(&self, name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
        match name {
            "rgb" | "rgba" => rgb(name, args),
            "red" => Ok(channel_value(color(&args, 0, "color")?.red)),
            "green" => Ok(channel_value(color(&args, 0, "color")?.green)),
            "blue" => Ok(channel_value(color(&args, 0, "color")?.blue)),
            "alpha" => Ok(Value::number(color(&args, 0, "color")?.alpha, None)),
            "lighten" | "darken" => {
                let c = color(&args, 0, "color")?;
                let delta = amount(&args, 1, "amount")?;
                let (h, s, l) = c.to_hsl();
                let l = if name == "lighten" { l + delta } else { l - delta };
                Ok(Value::Color(SassColor::from_hsl(h, s, l.clamp(0.0, 100.0), c.alpha)))
            }
            "saturate" | "desaturate" => {
                let c = color(&args, 0, "color")?;
                let delta = amount(&args, 1, "amount")?;
                let (h, s, l) = c.to_hsl();
                let s = if name == "saturate" { s + delta } else { s - delta };
                Ok(Value::Color(SassColor::from_hsl(h, s.clamp(0.0, 100.0), l, c.alpha)))
            }
            "adjust-hue" => {
                let c = color(&args, 0, "color")?;
                let degrees = super::number(&args, 1, "degrees")?.value;
                let (h, s, l) = c.to_hsl();
                Ok(Value::Color(SassColor::from_hsl(h + degrees, s, l, c.alpha)))
            }
            "grayscale" => {
                let c = color(&args, 0, "color")?;
                let (h, _, l) = c.to_hsl();
                Ok(Value::Color(SassColor::from_hsl(h, 0.0, l, c.alpha)))
            }
            "complement" => {
                let c = color(&args, 0, "color")?;
                let (h, s, l) = c.to_hsl();
                Ok(Value::Color(SassColor::from_hsl(h + 180.0, s, l, c.alpha)))
            }
            "invert" => {
                let c = color(&args, 0, "color")?;
                let inverted = SassColor::rgba(
                    255.0 - f64::from(c.red),
                    255.0 - f64::from(c.green),
                    255.0 - f64::from(c.blue),
                    c.alpha,
                );
                match arg(&args, 1) {
                    Some(_) => {
                        let weight = amount(&args, 1, "weight")?;
                        Ok(Value::Color(mix(&inverted, c, weight / 100.0)))
                    }
                    None => Ok(Value::Color(inverted)),
                }
            }
            "transparentize" | "opacify" => {
                let c = color(&args, 0, "color")?;
                let delta = fraction(&args, 1)?;
                let alpha = if name == "opacify" {
                    c.alpha + delta
                } else {
                    c.alpha - delta
                };
                Ok(Value::Color(SassColor::rgba(
                    f64::from(c.red),
                    f64::from(c.green),
                    f64::from(c.blue),
                    alpha,
                )))
            }
            "mix" => {
                let first = color(&args, 0, "color1")?;
                let second = color(&args, 1, "color2")?;
                let weight = match arg(&args, 2) {
                    Some(_) => amount(&args, 2, "weight")? / 100.0,
                    None => 0.5,
                };
                Ok(Value::Color(mix(first, second, weight)))
            }
            "adjust" => adjust(&args),
            _ => Err(CompileError::invalid_argument(format!(
                "Unknown color function: {}",
                name
            ))),
        }
    }
}

fn channel_value(channel: u8) -> Value {
    Value::number(f64::from(channel), None)
}

/// Alpha amounts are fractions; `50%` is accepted as `0.5`.
fn fraction(args: &[Value], index: usize) -> Result<f64, CompileError> {
    let n = super::number(args, index, "amount")?;
    Ok(match n.unit.as_deref() {
        Some("%") => n.value / 100.0,
        _ => n.value,
    })
}

/// An `rgb()` channel: `0..255` or a percentage of 255.
fn rgb_channel(n: &SassNumber) -> f64 {
    match n.unit.as_deref() {
        Some("%") => n.value * 255.0 / 100.0,
        _ => n.value,
    }
}

fn alpha_channel(n: &SassNumber) -> f64 {
    match n.unit.as_deref() {
        Some("%") => n.value / 100.0,
        _ => n.value,
    }
}

/// `rgb(r, g, b[, a])`, `rgb(r g b)` and `rgba($color, a)`. Calls with
/// non-numeric channels such as `var(--r)` are emitted as written.
fn rgb(name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
    let mut args: Vec<Value> = args.into_iter().filter(|v| !v.is_null()).collect();
    if args.len() == 1 {
        if let Value::List(list) = &args[0] {
            args = list.values.clone();
        }
    }
    if let (Some(Value::Color(c)), 2) = (args.first(), args.len()) {
        let alpha = match &args[1] {
            Value::Number(n) => alpha_channel(n),
            _ => return Ok(passthrough(name, &args)),
        };
        return Ok(Value::Color(SassColor::rgba(
            f64::from(c.red),
            f64::from(c.green),
            f64::from(c.blue),
            alpha,
        )));
    }
    let numbers: Option<Vec<&SassNumber>> = args.iter().map(Value::as_number).collect();
    match numbers {
        Some(channels) if channels.len() == 3 || channels.len() == 4 => {
            let alpha = channels.get(3).map_or(1.0, |n| alpha_channel(n));
            Ok(Value::Color(SassColor::rgba(
                rgb_channel(channels[0]),
                rgb_channel(channels[1]),
                rgb_channel(channels[2]),
                alpha,
            )))
        }
        Some(channels) if !channels.is_empty() => Err(CompileError::invalid_argument(format!(
            "{}() expects 3 or 4 channels, got {}",
            name,
            channels.len()
        ))),
        _ => Ok(passthrough(name, &args)),
    }
}

fn passthrough(name: &str, args: &[Value]) -> Value {
    let rendered = args.iter().map(Value::to_css).collect::<Vec<_>>().join(", ");
    Value::unquoted(format!("{}({})", name, rendered))
}

/// Weighted average of two colors, `weight` being the share of `first`.
fn mix(first: &SassColor, second: &SassColor, weight: f64) -> SassColor {
    let w = weight * 2.0 - 1.0;
    let a = first.alpha - second.alpha;
    let combined = if (w * a + 1.0).abs() < f64::EPSILON {
        w
    } else {
        (w + a) / (1.0 + w * a)
    };
    let w1 = (combined + 1.0) / 2.0;
    let w2 = 1.0 - w1;
    let blend = |x: u8, y: u8| f64::from(x) * w1 + f64::from(y) * w2;
    SassColor::rgba(
        blend(first.red, second.red),
        blend(first.green, second.green),
        blend(first.blue, second.blue),
        first.alpha * weight + second.alpha * (1.0 - weight),
    )
}

/// `color.adjust($color, $red: …, $lightness: …)`; RGB and HSL adjustments
/// are applied in that order.
fn adjust(args: &[Value]) -> Result<Value, CompileError> {
    let c = color(args, 0, "color")?;
    let delta = |index: usize, param: &str| -> Result<f64, CompileError> {
        match arg(args, index) {
            Some(_) => Ok(super::number(args, index, param)?.value),
            None => Ok(0.0),
        }
    };
    let mut result = SassColor::rgba(
        f64::from(c.red) + delta(1, "red")?,
        f64::from(c.green) + delta(2, "green")?,
        f64::from(c.blue) + delta(3, "blue")?,
        c.alpha + delta(7, "alpha")?,
    );
    let (dh, ds, dl) = (delta(4, "hue")?, delta(5, "saturation")?, delta(6, "lightness")?);
    if dh != 0.0 || ds != 0.0 || dl != 0.0 {
        let (h, s, l) = result.to_hsl();
        result = SassColor::from_hsl(
            h + dh,
            (s + ds).clamp(0.0, 100.0),
            (l + dl).clamp(0.0, 100.0),
            result.alpha,
        );
    }
    Ok(Value::Color(result))
}

// ============================================================================
// Native CSS color functions
// ============================================================================

pub struct CssColorFunctions;

impl ModuleFunctions for CssColorFunctions {
    fn namespace(&self) -> Option<&'static str> {
        None
    }

    fn module_functions(&self) -> &'static [&'static str] {
        &[]
    }

    fn global_functions(&self) -> &'static [&'static str] {
        &["hsl", "hsla", "hwb", "lab", "lch", "oklch"]
    }

    fn requires_raw_values(&self) -> bool {
        false
    }

    fn handle(&self, name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
        let rendered: Vec<String> = args
            .iter()
            .map(Value::to_css_unquoted)
            .filter(|text| !text.is_empty())
            .collect();
        let channels: Vec<&str> = rendered
            .iter()
            .flat_map(|text| text.split(|c: char| c.is_whitespace() || c == '/' || c == ','))
            .filter(|part| !part.is_empty())
            .collect();
        if channels.len() < 3 || channels.len() > 4 {
            return Ok(Value::unquoted(format!("{}({})", name, rendered.join(", "))));
        }
        let alpha = channels.get(3).map(|a| normalize_alpha(a));
        let text = match name {
            "hsl" | "hsla" => match alpha {
                Some(a) => format!("hsla({}, {}, {}, {})", channels[0], channels[1], channels[2], a),
                None => format!("hsl({}, {}, {})", channels[0], channels[1], channels[2]),
            },
            _ => match alpha {
                Some(a) => format!(
                    "{}({} {} {} / {})",
                    name, channels[0], channels[1], channels[2], a
                ),
                None => format!("{}({} {} {})", name, channels[0], channels[1], channels[2]),
            },
        };
        Ok(Value::unquoted(text))
    }
}

/// `.5` → `0.5`; anything that is not a plain number is kept as written.
fn normalize_alpha(text: &str) -> String {
    match text.parse::<f64>() {
        Ok(value) => format_number(value),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(r: u8, g: u8, b: u8) -> Value {
        Value::Color(SassColor::rgba(f64::from(r), f64::from(g), f64::from(b), 1.0))
    }

    fn pct(v: f64) -> Value {
        Value::number(v, Some("%"))
    }

    fn sass(name: &str, args: Vec<Value>) -> String {
        SassColorFunctions.handle(name, args).unwrap().to_css()
    }

    #[test]
    fn lighten_and_darken_move_lightness() {
        assert_eq!(sass("lighten", vec![hex(0, 0, 0), pct(50.0)]), "#808080");
        assert_eq!(sass("darken", vec![hex(255, 255, 255), pct(100.0)]), "#000000");
    }

    #[test]
    fn mix_defaults_to_even_weight() {
        assert_eq!(sass("mix", vec![hex(255, 0, 0), hex(0, 0, 255)]), "#800080");
    }

    #[test]
    fn rgba_with_color_sets_alpha() {
        assert_eq!(
            sass("rgba", vec![hex(255, 0, 0), Value::number(0.5, None)]),
            "rgba(255, 0, 0, 0.5)"
        );
        assert_eq!(
            sass(
                "rgb",
                vec![
                    Value::number(0.0, None),
                    Value::number(128.0, None),
                    Value::number(255.0, None)
                ]
            ),
            "#0080ff"
        );
    }

    #[test]
    fn rgb_with_custom_property_passes_through() {
        assert_eq!(
            sass(
                "rgb",
                vec![
                    Value::unquoted("var(--r)"),
                    Value::number(0.0, None),
                    Value::number(0.0, None)
                ]
            ),
            "rgb(var(--r), 0, 0)"
        );
    }

    #[test]
    fn channel_accessors() {
        assert_eq!(sass("red", vec![hex(12, 34, 56)]), "12");
        assert_eq!(sass("blue", vec![hex(12, 34, 56)]), "56");
        assert_eq!(sass("alpha", vec![hex(12, 34, 56)]), "1");
    }

    #[test]
    fn transparentize_lowers_alpha() {
        assert_eq!(
            sass("transparentize", vec![hex(0, 0, 0), Value::number(0.25, None)]),
            "rgba(0, 0, 0, 0.75)"
        );
    }

    #[test]
    fn native_functions_render_canonically() {
        let css = |name: &str, args: &[&str]| {
            CssColorFunctions
                .handle(name, args.iter().map(|a| Value::unquoted(*a)).collect())
                .unwrap()
                .to_css()
        };
        assert_eq!(css("hsl", &["120deg 100% 50%"]), "hsl(120deg, 100%, 50%)");
        assert_eq!(css("hsl", &["120", "100%", "50%", ".5"]), "hsla(120, 100%, 50%, 0.5)");
        assert_eq!(css("oklch", &["70% 0.1 200 / 50%"]), "oklch(70% 0.1 200 / 50%)");
        assert_eq!(css("lab", &["var(--lab)"]), "lab(var(--lab))");
    }
}
