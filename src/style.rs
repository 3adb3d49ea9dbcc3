//! Parsers for computed style values.
//!
//! Every parser here is total: a value that does not parse is reported as
//! absent (`None` or an empty list), never as an error, so one malformed
//! property cannot stop a tree export.

use kurbo::{Affine, Vec2};
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit1, multispace0, multispace1, one_of};
use nom::combinator::{map, map_res, opt, recognize};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use crate::tree::ComputedStyle;
use crate::types::{CornerRadii, Effect, GradientFill, GradientStop, GradientTransform, Paint, Rgba, ShadowEffect};

// --- Helper Parsers ---

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

// The exponent only counts when digits follow, so "2em" reads as 2 with an "em" unit.
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit1)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

fn alpha(input: &str) -> IResult<&str, f64> {
    map(pair(number, opt(char('%'))), |(value, percent)| {
        if percent.is_some() { value / 100.0 } else { value }
    })(input)
}

fn px_length(input: &str) -> IResult<&str, f64> {
    terminated(number, opt(tag_no_case("px")))(input)
}

/// Leading numeric prefix of a value, like `parseFloat` ("12px" -> 12).
pub fn parse_float(text: &str) -> Option<f64> {
    number(text.trim_start()).ok().map(|(_, value)| value)
}

// --- Colors ---

// Three required numbers and an optional fourth.
type Quad = (f64, f64, f64, Option<f64>);

fn comma_channels(input: &str) -> IResult<&str, Quad> {
    tuple((
        number,
        preceded(ws(char(',')), number),
        preceded(ws(char(',')), number),
        opt(preceded(ws(char(',')), alpha)),
    ))(input)
}

fn space_channels(input: &str) -> IResult<&str, Quad> {
    tuple((
        number,
        preceded(multispace1, number),
        preceded(multispace1, number),
        opt(preceded(ws(char('/')), alpha)),
    ))(input)
}

fn functional_color(input: &str) -> IResult<&str, Rgba> {
    let channel = |v: f64| (v / 255.0).clamp(0.0, 1.0);
    map(
        preceded(
            pair(tag_no_case("rgb"), opt(tag_no_case("a"))),
            delimited(
                pair(char('('), multispace0),
                alt((comma_channels, space_channels)),
                pair(multispace0, char(')')),
            ),
        ),
        move |(r, g, b, a)| Rgba::new(channel(r), channel(g), channel(b), a.unwrap_or(1.0).clamp(0.0, 1.0)),
    )(input)
}

/// Finds the first functional color in `text` and returns it with the text after it.
fn find_color(text: &str) -> Option<(Rgba, &str)> {
    let lower = text.to_ascii_lowercase();
    lower
        .match_indices("rgb")
        .find_map(|(idx, _)| functional_color(&text[idx..]).ok())
        .map(|(rest, color)| (color, rest))
}

/// Parses `rgb()`/`rgba()` in comma (`rgb(1, 2, 3)`) or space (`rgb(1 2 3 / 50%)`) notation.
pub fn parse_color(text: &str) -> Option<Rgba> {
    find_color(text).map(|(color, _)| color)
}

// --- Lists & angles ---

/// Splits on commas that are not nested inside parentheses. A trailing empty
/// segment is dropped.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

fn angle_literal(input: &str) -> IResult<&str, f64> {
    let (input, value) = number(input)?;
    alt((
        map(tag_no_case("deg"), move |_| value),
        map(tag_no_case("grad"), move |_| value * 360.0 / 400.0),
        map(tag_no_case("rad"), move |_| value.to_degrees()),
        map(tag_no_case("turn"), move |_| value * 360.0),
    ))(input)
}

/// Gradient direction in CSS degrees (0 = up, clockwise).
///
/// Any `to ...` phrase other than the four sides resolves to 180, corners included.
pub fn parse_angle(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok((rest, degrees)) = angle_literal(text) {
        if rest.trim().is_empty() {
            return Some(degrees);
        }
    }
    let phrase = text.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
    match phrase.as_str() {
        "to right" => Some(90.0),
        "to left" => Some(270.0),
        "to bottom" => Some(180.0),
        "to top" => Some(0.0),
        p if p.starts_with("to ") => Some(180.0),
        _ => None,
    }
}

// --- Gradients ---

/// Rotation of the unit paint box by `css_angle - 90` about its center.
pub fn gradient_transform(css_angle: f64) -> GradientTransform {
    let center = Vec2::new(0.5, 0.5);
    let affine = Affine::translate(center) * Affine::rotate((css_angle - 90.0).to_radians()) * Affine::translate(-center);
    let [a, b, c, d, e, f] = affine.as_coeffs();
    [[a, c, e], [b, d, f]]
}

fn parse_stop(text: &str) -> Option<(Rgba, Option<f64>)> {
    let (color, rest) = find_color(text)?;
    let position = terminated(number, char('%'))(rest.trim_start())
        .ok()
        .map(|(_, percent)| percent / 100.0);
    Some((color, position))
}

/// Parses one `linear-gradient(...)` layer. Fewer than two color stops yields `None`.
pub fn parse_linear_gradient(text: &str) -> Option<GradientFill> {
    const PREFIX: &str = "linear-gradient(";
    let start = text.find(PREFIX)? + PREFIX.len();
    let end = text.rfind(')')?;
    if end < start {
        return None;
    }
    let parts = split_top_level(&text[start..end]);

    // A missing direction is CSS's default "to bottom".
    let (angle, stop_parts) = match parts.first().and_then(|p| parse_angle(p)) {
        Some(angle) => (angle, &parts[1..]),
        None => (180.0, &parts[..]),
    };

    let stops: Vec<(Rgba, Option<f64>)> = stop_parts.iter().filter_map(|p| parse_stop(p)).collect();
    if stops.len() < 2 {
        log::trace!("dropping gradient with {} usable stops: {}", stops.len(), text);
        return None;
    }

    let last = (stops.len() - 1) as f64;
    let mut previous = 0.0f64;
    let gradient_stops = stops
        .iter()
        .enumerate()
        .map(|(i, (color, position))| {
            let position = position.unwrap_or(i as f64 / last).clamp(0.0, 1.0).max(previous);
            previous = position;
            GradientStop { color: *color, position }
        })
        .collect();

    Some(GradientFill {
        gradient_stops,
        gradient_transform: gradient_transform(angle),
    })
}

// --- Box paint ---

/// Background color underlay followed by the first linear gradient layer.
pub fn parse_fills(style: &ComputedStyle) -> Vec<Paint> {
    let mut fills = Vec::new();
    if let Some(color) = parse_color(style.get("background-color")).filter(|c| !c.is_transparent()) {
        fills.push(Paint::solid(color));
    }
    let image = style.get("background-image").trim();
    if !image.is_empty() && image != "none" {
        if let Some(gradient) = split_top_level(image).into_iter().find_map(parse_linear_gradient) {
            fills.push(Paint::GradientLinear(gradient));
        }
    }
    fills
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Border {
    pub strokes: Vec<Paint>,
    pub weight: f64,
}

/// Uniform border: the shorthand values win over the top edge.
pub fn parse_borders(style: &ComputedStyle) -> Border {
    let color = parse_color(style.first_of(&["border-color", "border-top-color"]));
    let width = parse_float(style.first_of(&["border-width", "border-top-width"])).unwrap_or(0.0);
    match color {
        Some(color) if !color.is_transparent() && width > 0.0 => Border {
            strokes: vec![Paint::solid(color)],
            weight: width,
        },
        _ => Border::default(),
    }
}

pub fn parse_border_radius(style: &ComputedStyle) -> CornerRadii {
    let corner = |property: &str| parse_float(style.get(property)).unwrap_or(0.0);
    CornerRadii {
        top_left_radius: corner("border-top-left-radius"),
        top_right_radius: corner("border-top-right-radius"),
        bottom_right_radius: corner("border-bottom-right-radius"),
        bottom_left_radius: corner("border-bottom-left-radius"),
    }
}

// --- Shadows ---

fn shadow_geometry(input: &str) -> IResult<&str, Quad> {
    tuple((
        preceded(multispace1, px_length),
        preceded(multispace1, px_length),
        preceded(multispace1, px_length),
        opt(preceded(multispace1, px_length)),
    ))(input)
}

fn parse_shadow(text: &str) -> Option<Effect> {
    let (rest, color) = functional_color(text.trim()).ok()?;
    let (rest, (x, y, radius, spread)) = shadow_geometry(rest).ok()?;
    if rest.split_whitespace().any(|t| t.eq_ignore_ascii_case("inset")) {
        return None;
    }
    Some(Effect::DropShadow(ShadowEffect {
        color,
        offset: Vec2::new(x, y),
        radius,
        spread: spread.unwrap_or(0.0),
        visible: true,
    }))
}

/// Drop shadows from a computed `box-shadow` list; entries that do not read as
/// `<color> <x> <y> <blur> [<spread>]` are skipped on their own.
pub fn parse_effects(text: &str) -> Vec<Effect> {
    let text = text.trim();
    if text.is_empty() || text == "none" {
        return Vec::new();
    }
    split_top_level(text)
        .into_iter()
        .filter_map(|part| {
            let effect = parse_shadow(part);
            if effect.is_none() {
                log::trace!("skipping shadow entry: {}", part);
            }
            effect
        })
        .collect()
}
