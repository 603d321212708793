//! Value System
//!
//! Runtime representations of Sass values produced while evaluating
//! expressions. Every operation returns a new value; nothing here mutates a
//! receiver in place.
//!
//! ## Units
//! Numbers carry at most one unit. Units convertible to each other form a
//! group with a canonical unit whose factor is `1.0`:
//!
//! | group  | canonical | members                    |
//! |--------|-----------|----------------------------|
//! | length | `px`      | `px in cm mm pt pc`        |
//! | angle  | `deg`     | `deg rad grad turn`        |
//! | time   | `s`       | `s ms`                     |
//!
//! Other units (`em`, `%`, `vw`, ...) pass through untouched and are only
//! compatible with themselves or with unitless numbers.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use num_traits::ToPrimitive;

use crate::ast::ListSeparator;
use crate::error::{CompileError, CompileErrorKind};

/// Tolerance used by numeric equality.
pub const EPSILON: f64 = 1e-10;

type ValueResult<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitGroup {
    Length,
    Angle,
    Time,
}

/// Group and factor (relative to the group's canonical unit) of a convertible unit.
pub fn unit_factor(unit: &str) -> Option<(UnitGroup, f64)> {
    let factor = match unit.to_ascii_lowercase().as_str() {
        "px" => (UnitGroup::Length, 1.0),
        "in" => (UnitGroup::Length, 96.0),
        "cm" => (UnitGroup::Length, 96.0 / 2.54),
        "mm" => (UnitGroup::Length, 96.0 / 25.4),
        "pt" => (UnitGroup::Length, 4.0 / 3.0),
        "pc" => (UnitGroup::Length, 16.0),
        "deg" => (UnitGroup::Angle, 1.0),
        "rad" => (UnitGroup::Angle, 180.0 / std::f64::consts::PI),
        "grad" => (UnitGroup::Angle, 0.9),
        "turn" => (UnitGroup::Angle, 360.0),
        "s" => (UnitGroup::Time, 1.0),
        "ms" => (UnitGroup::Time, 0.001),
        _ => return None,
    };
    Some(factor)
}

/// Render a number without a unit: integers lose their fraction, everything
/// else is rounded to ten decimals with trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    let rounded = value.round();
    if (value - rounded).abs() < EPSILON {
        return match rounded.to_i64() {
            Some(0) => "0".to_string(),
            Some(int) => int.to_string(),
            None => format!("{}", rounded),
        };
    }
    let text = format!("{:.10}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

// ============================================================================
// Numbers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SassNumber {
    pub value: f64,
    pub unit: Option<String>,
}

impl SassNumber {
    pub fn new(value: f64, unit: Option<&str>) -> Self {
        Self {
            value,
            unit: unit.filter(|u| !u.is_empty()).map(str::to_string),
        }
    }

    pub fn unitless(value: f64) -> Self {
        Self { value, unit: None }
    }

    pub fn is_unitless(&self) -> bool {
        self.unit.is_none()
    }

    pub fn unit_str(&self) -> &str {
        self.unit.as_deref().unwrap_or("")
    }

    pub fn is_integer(&self) -> bool {
        (self.value - self.value.round()).abs() < EPSILON
    }

    fn with_value(&self, value: f64) -> Self {
        Self {
            value,
            unit: self.unit.clone(),
        }
    }

    /// Either side unitless, the same unit, or the same conversion group.
    pub fn is_compatible(&self, other: &SassNumber) -> bool {
        match (&self.unit, &other.unit) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => true,
            (Some(a), Some(b)) => match (unit_factor(a), unit_factor(b)) {
                (Some((ga, _)), Some((gb, _))) => ga == gb,
                _ => false,
            },
        }
    }

    fn incompatible(&self, other: &SassNumber) -> CompileError {
        CompileError::new(CompileErrorKind::IncompatibleUnits {
            left: self.unit_str().to_string(),
            right: other.unit_str().to_string(),
        })
    }

    /// Convert into `unit`, which must share this number's conversion group.
    pub fn convert_to(&self, unit: &str) -> ValueResult<SassNumber> {
        let Some(from) = &self.unit else {
            return Ok(SassNumber::new(self.value, Some(unit)));
        };
        if from.eq_ignore_ascii_case(unit) {
            return Ok(self.clone());
        }
        match (unit_factor(from), unit_factor(unit)) {
            (Some((ga, fa)), Some((gb, fb))) if ga == gb => {
                Ok(SassNumber::new(self.value * fa / fb, Some(unit)))
            }
            _ => Err(CompileError::new(CompileErrorKind::IncompatibleUnits {
                left: from.clone(),
                right: unit.to_string(),
            })),
        }
    }

    /// `other`'s magnitude expressed in this number's unit.
    fn coerce_right(&self, other: &SassNumber) -> ValueResult<f64> {
        if !self.is_compatible(other) {
            return Err(self.incompatible(other));
        }
        match (&self.unit, &other.unit) {
            (Some(unit), Some(_)) => Ok(other.convert_to(unit)?.value),
            _ => Ok(other.value),
        }
    }

    fn result_unit(&self, other: &SassNumber) -> Option<String> {
        self.unit.clone().or_else(|| other.unit.clone())
    }

    pub fn add(&self, other: &SassNumber) -> ValueResult<SassNumber> {
        let right = self.coerce_right(other)?;
        Ok(SassNumber {
            value: self.value + right,
            unit: self.result_unit(other),
        })
    }

    pub fn subtract(&self, other: &SassNumber) -> ValueResult<SassNumber> {
        let right = self.coerce_right(other)?;
        Ok(SassNumber {
            value: self.value - right,
            unit: self.result_unit(other),
        })
    }

    pub fn multiply(&self, other: &SassNumber) -> SassNumber {
        SassNumber {
            value: self.value * other.value,
            unit: self.result_unit(other),
        }
    }

    pub fn divide(&self, other: &SassNumber) -> ValueResult<SassNumber> {
        if other.value == 0.0 {
            return Err(CompileError::new(CompileErrorKind::DivisionByZero));
        }
        match (&self.unit, &other.unit) {
            (_, None) => Ok(self.with_value(self.value / other.value)),
            (None, Some(_)) => Ok(SassNumber::unitless(self.value / other.value)),
            (Some(_), Some(_)) => {
                let right = self.coerce_right(other)?;
                Ok(SassNumber::unitless(self.value / right))
            }
        }
    }

    pub fn modulo(&self, other: &SassNumber) -> ValueResult<SassNumber> {
        if other.value == 0.0 {
            return Err(CompileError::new(CompileErrorKind::DivisionByZero));
        }
        let right = self.coerce_right(other)?;
        let mut rem = self.value % right;
        if rem != 0.0 && (rem < 0.0) != (right < 0.0) {
            rem += right;
        }
        Ok(SassNumber {
            value: rem,
            unit: self.result_unit(other),
        })
    }

    pub fn negate(&self) -> SassNumber {
        self.with_value(-self.value)
    }

    /// Equal within [`EPSILON`] after unit normalization. A unitless number
    /// never equals one with a unit.
    pub fn equals(&self, other: &SassNumber) -> bool {
        if self.unit.is_some() != other.unit.is_some() || !self.is_compatible(other) {
            return false;
        }
        match self.coerce_right(other) {
            Ok(right) => (self.value - right).abs() < EPSILON,
            Err(_) => false,
        }
    }

    pub fn compare(&self, other: &SassNumber) -> ValueResult<Ordering> {
        let right = self.coerce_right(other)?;
        if (self.value - right).abs() < EPSILON {
            return Ok(Ordering::Equal);
        }
        Ok(self.value.partial_cmp(&right).unwrap_or(Ordering::Equal))
    }

    pub fn to_css(&self) -> String {
        format!("{}{}", format_number(self.value), self.unit_str())
    }
}

// ============================================================================
// Strings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SassString {
    pub text: String,
    pub quoted: bool,
}

impl SassString {
    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }

    pub fn unquoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    pub fn to_css(&self) -> String {
        if !self.quoted {
            return self.text.clone();
        }
        if self.text.contains('"') && !self.text.contains('\'') {
            format!("'{}'", self.text)
        } else {
            format!("\"{}\"", self.text.replace('"', "\\\""))
        }
    }
}

// ============================================================================
// Colors
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SassColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
    /// Source spelling (`#fff`, `red`) kept for untouched literals.
    pub repr: Option<String>,
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0).to_u8().unwrap_or(0)
}

impl SassColor {
    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: channel(red),
            green: channel(green),
            blue: channel(blue),
            alpha: alpha.clamp(0.0, 1.0),
            repr: None,
        }
    }

    pub fn from_literal(red: u8, green: u8, blue: u8, alpha: f64, repr: &str) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
            repr: Some(repr.to_string()),
        }
    }

    /// Hue in degrees, saturation and lightness in percent.
    pub fn to_hsl(&self) -> (f64, f64, f64) {
        let r = f64::from(self.red) / 255.0;
        let g = f64::from(self.green) / 255.0;
        let b = f64::from(self.blue) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.0;
        let delta = max - min;
        if delta.abs() < EPSILON {
            return (0.0, 0.0, lightness * 100.0);
        }
        let saturation = if lightness > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        let hue = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        (hue * 60.0, saturation * 100.0, lightness * 100.0)
    }

    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);
        let m2 = if l <= 0.5 { l * (s + 1.0) } else { l + s - l * s };
        let m1 = l * 2.0 - m2;
        let to_rgb = |mut h: f64| {
            if h < 0.0 {
                h += 1.0;
            }
            if h > 1.0 {
                h -= 1.0;
            }
            let v = if h * 6.0 < 1.0 {
                m1 + (m2 - m1) * h * 6.0
            } else if h * 2.0 < 1.0 {
                m2
            } else if h * 3.0 < 2.0 {
                m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
            } else {
                m1
            };
            v * 255.0
        };
        Self::rgba(
            to_rgb(h + 1.0 / 3.0),
            to_rgb(h),
            to_rgb(h - 1.0 / 3.0),
            alpha,
        )
    }

    pub fn to_css(&self) -> String {
        if let Some(repr) = &self.repr {
            return repr.clone();
        }
        if self.alpha >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                self.red,
                self.green,
                self.blue,
                format_number(self.alpha)
            )
        }
    }
}

// ============================================================================
// Lists and maps
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SassList {
    pub values: Vec<Value>,
    pub separator: ListSeparator,
    pub bracketed: bool,
}

impl SassList {
    pub fn new(values: Vec<Value>, separator: ListSeparator) -> Self {
        Self {
            values,
            separator,
            bracketed: false,
        }
    }
}

/// Ordered map with unique keys. Keys compare by their unquoted rendering,
/// so `"a"` and `a` name the same entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SassMap {
    entries: IndexMap<String, (Value, Value)>,
}

impl SassMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_of(key: &Value) -> String {
        key.to_css_unquoted()
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        self.entries.insert(Self::key_of(&key), (key, value));
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(&Self::key_of(key)).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(&Self::key_of(key))
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.entries.shift_remove(&Self::key_of(key)).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> Vec<Value> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Entries of `other` overwrite same-named entries of `self`.
    pub fn merge(&self, other: &SassMap) -> SassMap {
        let mut merged = self.clone();
        for (k, v) in other.iter() {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Like [`SassMap::merge`], recursing where both sides hold maps.
    pub fn deep_merge(&self, other: &SassMap) -> SassMap {
        let mut merged = self.clone();
        for (k, v) in other.iter() {
            let value = match (merged.get(k), v) {
                (Some(Value::Map(left)), Value::Map(right)) => Value::Map(left.deep_merge(right)),
                _ => v.clone(),
            };
            merged.insert(k.clone(), value);
        }
        merged
    }
}

impl FromIterator<(Value, Value)> for SassMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = SassMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ============================================================================
// Callables
// ============================================================================

/// A function reference obtained through `get-function`, resolved when called.
#[derive(Debug, Clone, PartialEq)]
pub struct SassFunction {
    pub namespace: Option<String>,
    pub name: String,
}

/// A mixin reference obtained through `get-mixin`, resolved when applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SassMixin {
    pub namespace: Option<String>,
    pub name: String,
}

fn qualified(namespace: &Option<String>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}.{}", ns, name),
        None => name.to_string(),
    }
}

// ============================================================================
// Value
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(SassNumber),
    String(SassString),
    Color(SassColor),
    List(SassList),
    Map(SassMap),
    Function(SassFunction),
    Mixin(SassMixin),
}

impl Value {
    pub fn number(value: f64, unit: Option<&str>) -> Self {
        Value::Number(SassNumber::new(value, unit))
    }

    pub fn unquoted(text: impl Into<String>) -> Self {
        Value::String(SassString::unquoted(text))
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Value::String(SassString::quoted(text))
    }

    pub fn list(values: Vec<Value>, separator: ListSeparator) -> Self {
        Value::List(SassList::new(values, separator))
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Color(_) => "color",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Mixin(_) => "mixin",
        }
    }

    pub fn as_number(&self) -> Option<&SassNumber> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Members when viewed as a list: maps yield `key value` pairs, scalars
    /// are one-element lists.
    pub fn as_list(&self) -> Vec<Value> {
        match self {
            Value::List(list) => list.values.clone(),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| Value::list(vec![k.clone(), v.clone()], ListSeparator::Space))
                .collect(),
            other => vec![other.clone()],
        }
    }

    pub fn separator(&self) -> ListSeparator {
        match self {
            Value::List(list) => list.separator,
            Value::Map(_) => ListSeparator::Comma,
            _ => ListSeparator::Space,
        }
    }

    /// Sass `==`: numbers within epsilon after unit normalization, strings
    /// regardless of quoting, lists and maps member-wise.
    pub fn sass_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.equals(b),
            (Value::String(a), Value::String(b)) => a.text == b.text,
            (Value::Color(a), Value::Color(b)) => {
                a.red == b.red
                    && a.green == b.green
                    && a.blue == b.blue
                    && (a.alpha - b.alpha).abs() < EPSILON
            }
            (Value::List(a), Value::List(b)) => {
                a.separator == b.separator
                    && a.bracketed == b.bracketed
                    && a.values.len() == b.values.len()
                    && a.values.iter().zip(&b.values).all(|(x, y)| x.sass_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.sass_eq(other)))
            }
            (Value::List(a), Value::Map(b)) | (Value::Map(b), Value::List(a)) => {
                a.values.is_empty() && b.is_empty()
            }
            _ => self == other,
        }
    }

    /// CSS text with string quotes removed; used for map keys and interpolation.
    pub fn to_css_unquoted(&self) -> String {
        match self {
            Value::String(s) => s.text.clone(),
            other => other.to_css(),
        }
    }

    pub fn to_css(&self) -> String {
        ValueFormatter::default().format(self)
    }

    /// Debug rendering used by `inspect()` and `@debug`: `null` and empty
    /// lists stay visible.
    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::List(list) if list.values.is_empty() => {
                if list.bracketed { "[]" } else { "()" }.to_string()
            }
            Value::List(list) => {
                let inner = list
                    .values
                    .iter()
                    .map(Value::inspect)
                    .collect::<Vec<_>>()
                    .join(list.separator.as_str());
                if list.bracketed {
                    format!("[{}]", inner)
                } else {
                    inner
                }
            }
            Value::Map(map) => format!(
                "({})",
                map.iter()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            other => other.to_css(),
        }
    }
}

impl From<SassNumber> for Value {
    fn from(number: SassNumber) -> Self {
        Value::Number(number)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Renders values as CSS text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFormatter {
    pub compressed: bool,
}

impl ValueFormatter {
    pub fn new(compressed: bool) -> Self {
        Self { compressed }
    }

    pub fn format(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => self.format_number(n),
            Value::String(s) => s.to_css(),
            Value::Color(c) => c.to_css(),
            Value::List(list) => {
                let separator = match (list.separator, self.compressed) {
                    (ListSeparator::Comma, true) => ",",
                    (separator, _) => separator.as_str(),
                };
                let inner = list
                    .values
                    .iter()
                    .map(|v| self.format(v))
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(separator);
                if list.bracketed {
                    format!("[{}]", inner)
                } else {
                    inner
                }
            }
            Value::Map(map) => format!(
                "({})",
                map.iter()
                    .map(|(k, v)| format!("{}: {}", self.format(k), self.format(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Value::Function(func) => {
                format!("get-function(\"{}\")", qualified(&func.namespace, &func.name))
            }
            Value::Mixin(mixin) => {
                format!("get-mixin(\"{}\")", qualified(&mixin.namespace, &mixin.name))
            }
        }
    }

    fn format_number(&self, number: &SassNumber) -> String {
        let text = number.to_css();
        if !self.compressed {
            return text;
        }
        if let Some(rest) = text.strip_prefix("0.") {
            format!(".{}", rest)
        } else if let Some(rest) = text.strip_prefix("-0.") {
            format!("-.{}", rest)
        } else {
            text
        }
    }
}

// ============================================================================
// Named colors
// ============================================================================

static NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];

/// Channels of a CSS named color (`transparent` included).
pub fn named_color(name: &str) -> Option<(u8, u8, u8, f64)> {
    let lower = name.to_ascii_lowercase();
    if lower == "transparent" {
        return Some((0, 0, 0, 0.0));
    }
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, rgb)| {
            let [_, r, g, b] = rgb.to_be_bytes();
            (r, g, b, 1.0)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(value: f64) -> SassNumber {
        SassNumber::new(value, Some("px"))
    }

    #[test]
    fn add_then_subtract_restores_the_left_operand() {
        let cases = [
            (px(10.0), SassNumber::new(1.0, Some("in"))),
            (SassNumber::new(2.5, Some("s")), SassNumber::new(300.0, Some("ms"))),
            (SassNumber::unitless(3.0), px(4.0)),
        ];
        for (a, b) in cases {
            let back = a.add(&b).unwrap().subtract(&b).unwrap();
            assert!((back.value - a.value).abs() < EPSILON, "{:?} vs {:?}", back, a);
        }
    }

    #[test]
    fn conversion_round_trips_within_a_group() {
        let groups: [&[&str]; 3] = [
            &["px", "in", "cm", "mm", "pt", "pc"],
            &["deg", "rad", "grad", "turn"],
            &["s", "ms"],
        ];
        for units in groups {
            for from in units {
                for to in units {
                    let n = SassNumber::new(7.25, Some(from));
                    let back = n.convert_to(to).unwrap().convert_to(from).unwrap();
                    assert!((back.value - n.value).abs() < EPSILON);
                    assert_eq!(back.unit.as_deref(), Some(*from));
                }
            }
        }
    }

    #[test]
    fn addition_normalizes_into_left_unit() {
        let sum = px(10.0).add(&SassNumber::new(1.0, Some("in"))).unwrap();
        assert_eq!(sum.to_css(), "106px");
        let sum = SassNumber::unitless(1.0).add(&px(2.0)).unwrap();
        assert_eq!(sum.to_css(), "3px");
    }

    #[test]
    fn incompatible_units_are_rejected() {
        let err = px(1.0).add(&SassNumber::new(1.0, Some("em"))).unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::IncompatibleUnits { .. }));
        assert!(px(1.0).divide(&SassNumber::new(1.0, Some("s"))).is_err());
    }

    #[test]
    fn division_by_zero_always_fails() {
        for unit in [None, Some("px"), Some("%")] {
            let err = px(4.0).divide(&SassNumber::new(0.0, unit)).unwrap_err();
            assert_eq!(err.kind, CompileErrorKind::DivisionByZero);
        }
    }

    #[test]
    fn division_unit_rules() {
        assert_eq!(px(10.0).divide(&SassNumber::unitless(4.0)).unwrap().to_css(), "2.5px");
        assert_eq!(px(10.0).divide(&px(5.0)).unwrap().to_css(), "2");
        assert_eq!(SassNumber::unitless(10.0).divide(&px(5.0)).unwrap().to_css(), "2");
    }

    #[test]
    fn multiplication_keeps_one_unit() {
        assert_eq!(px(2.0).multiply(&SassNumber::unitless(3.0)).to_css(), "6px");
        assert_eq!(SassNumber::unitless(2.0).multiply(&px(3.0)).to_css(), "6px");
    }

    #[test]
    fn equality_and_ordering_normalize_units() {
        assert!(SassNumber::new(1.0, Some("in")).equals(&px(96.0)));
        assert!(!SassNumber::unitless(1.0).equals(&px(1.0)));
        assert!(SassNumber::unitless(0.1 + 0.2).equals(&SassNumber::unitless(0.3)));
        assert_eq!(
            SassNumber::new(1.0, Some("s")).compare(&SassNumber::new(999.0, Some("ms"))).unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
    }

    #[test]
    fn lists_skip_empty_members() {
        let list = Value::list(
            vec![Value::unquoted("a"), Value::Null, Value::unquoted("b")],
            ListSeparator::Comma,
        );
        assert_eq!(list.to_css(), "a, b");
        let mut bracketed = SassList::new(vec![Value::number(1.0, None)], ListSeparator::Space);
        bracketed.bracketed = true;
        assert_eq!(Value::List(bracketed).to_css(), "[1]");
    }

    #[test]
    fn map_keys_ignore_quotes_and_keep_order() {
        let mut map = SassMap::new();
        map.insert(Value::quoted("b"), Value::number(1.0, None));
        map.insert(Value::unquoted("a"), Value::number(2.0, None));
        map.insert(Value::unquoted("b"), Value::number(3.0, None));
        assert_eq!(map.len(), 2);
        assert_eq!(Value::Map(map).to_css(), "(b: 3, a: 2)");
    }

    #[test]
    fn colors_render_literal_or_computed() {
        assert_eq!(SassColor::from_literal(255, 0, 0, 1.0, "red").to_css(), "red");
        assert_eq!(SassColor::rgba(255.0, 102.0, 102.0, 1.0).to_css(), "#ff6666");
        assert_eq!(SassColor::rgba(0.0, 0.0, 0.0, 0.5).to_css(), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn hsl_round_trip() {
        let color = SassColor::rgba(51.0, 102.0, 153.0, 1.0);
        let (h, s, l) = color.to_hsl();
        let back = SassColor::from_hsl(h, s, l, 1.0);
        assert_eq!((back.red, back.green, back.blue), (51, 102, 153));
    }

    #[test]
    fn named_colors_resolve() {
        assert_eq!(named_color("RebeccaPurple"), Some((0x66, 0x33, 0x99, 1.0)));
        assert!(named_color("notacolor").is_none());
    }

    #[test]
    fn compressed_numbers_drop_leading_zero() {
        let formatter = ValueFormatter::new(true);
        assert_eq!(formatter.format(&Value::number(0.5, Some("em"))), ".5em");
    }
}
