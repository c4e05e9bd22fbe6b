/*!
 * # Dark mode colors
 *
 * Content is authored in light mode colors. In dark mode every inline color
 * is swapped for a generated dark counterpart and the pair is remembered so
 * the swap can be undone exactly. [`DarkColorHandler`] owns those pairs;
 * [`transform_color`] rewrites the inline colors of a subtree in either
 * direction.
 */

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::style::{get_style_property, set_style_property};
use crate::dom::{Dom, NodeId};

const DARK_COLOR_KEY_PREFIX: &str = "--darkColor_";
const COLOR_PROPERTIES: [&str; 2] = ["color", "background-color"];

/// A light mode color and the dark mode color shown in its place
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Colors {
    pub light_mode_color: String,
    pub dark_mode_color: String,
}

impl Colors {
    pub fn new(light_mode_color: &str, dark_mode_color: &str) -> Self {
        Self {
            light_mode_color: light_mode_color.to_string(),
            dark_mode_color: dark_mode_color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTransformDirection {
    LightToDark,
    DarkToLight,
}

/// Produces the dark mode color for a light mode color
pub type ColorGenerator = fn(&str) -> String;

#[derive(Debug, Clone)]
pub struct DarkColorHandler {
    root: NodeId,
    known_colors: BTreeMap<String, Colors>,
    generate: ColorGenerator,
}

impl DarkColorHandler {
    pub fn new(root: NodeId) -> Self {
        Self::with_generator(root, invert_color)
    }

    pub fn with_generator(root: NodeId, generate: ColorGenerator) -> Self {
        Self {
            root,
            known_colors: BTreeMap::new(),
            generate,
        }
    }

    pub fn generate_color_key(light_color: &str) -> String {
        let sanitized: String = light_color
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{DARK_COLOR_KEY_PREFIX}{sanitized}")
    }

    /// Registers a color pair. Registering the same pair again changes
    /// nothing; in dark mode the pair is also published on the content root
    /// as a CSS variable.
    pub fn update_known_color(&mut self, dom: &mut Dom, is_dark_mode: bool, colors: &Colors) {
        let key = Self::generate_color_key(&colors.light_mode_color);
        if self.known_colors.get(&key) != Some(colors) {
            log::trace!(target: "color", "registering {key} = {}", colors.dark_mode_color);
            self.known_colors.insert(key.clone(), colors.clone());
        }
        if is_dark_mode {
            set_style_property(dom, self.root, &key, Some(&colors.dark_mode_color));
        }
    }

    pub fn known_colors(&self) -> Vec<Colors> {
        self.known_colors.values().cloned().collect()
    }

    pub fn reset(&mut self) {
        self.known_colors.clear();
    }

    /// Dark counterpart of `light_color`, generated and remembered on first use
    pub fn to_dark(&mut self, light_color: &str) -> String {
        let key = Self::generate_color_key(light_color);
        if let Some(colors) = self.known_colors.get(&key) {
            return colors.dark_mode_color.clone();
        }
        let dark = (self.generate)(light_color);
        self.known_colors
            .insert(key, Colors::new(light_color, &dark));
        dark
    }

    /// Light color a known dark color stands for; unknown colors map to themselves
    pub fn to_light(&self, dark_color: &str) -> String {
        self.known_colors
            .values()
            .find(|c| c.dark_mode_color.eq_ignore_ascii_case(dark_color))
            .map(|c| c.light_mode_color.clone())
            .unwrap_or_else(|| dark_color.to_string())
    }
}

/// Rewrites the inline text and background colors of every element under
/// `root` (and of `root` itself when `include_self`).
pub fn transform_color(
    dom: &mut Dom,
    root: NodeId,
    include_self: bool,
    direction: ColorTransformDirection,
    handler: &mut DarkColorHandler,
) {
    let mut elements = dom.descendants(root);
    if include_self {
        elements.insert(0, root);
    }
    elements.retain(|&n| dom.is_element(n));
    let mut changed = 0usize;
    for element in elements {
        for property in COLOR_PROPERTIES {
            let Some(value) = get_style_property(dom, element, property) else {
                continue;
            };
            let new_value = match direction {
                ColorTransformDirection::LightToDark => handler.to_dark(&value),
                ColorTransformDirection::DarkToLight => handler.to_light(&value),
            };
            if new_value != value {
                set_style_property(dom, element, property, Some(&new_value));
                changed += 1;
            }
        }
    }
    log::debug!(target: "color", "transform {direction:?} rewrote {changed} colors");
}

struct Rgb {
    r: u8,
    g: u8,
    b: u8,
    alpha: Option<String>,
}

fn parse_color(color: &str) -> Option<Rgb> {
    use std::sync::OnceLock;

    static RGB_REGEX: OnceLock<Regex> = OnceLock::new();
    let rgb_regex = RGB_REGEX.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([\d.]+)\s*)?\)$")
            .expect("Invalid rgb regex")
    });

    let color = color.trim().to_ascii_lowercase();
    if let Some(hex) = color.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        return Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            alpha: None,
        });
    }
    if let Some(captures) = rgb_regex.captures(&color) {
        let channel = |i: usize| captures.get(i)?.as_str().parse::<u8>().ok();
        return Some(Rgb {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
            alpha: captures.get(4).map(|m| m.as_str().to_string()),
        });
    }
    match color.as_str() {
        "black" => Some(Rgb { r: 0, g: 0, b: 0, alpha: None }),
        "white" => Some(Rgb { r: 255, g: 255, b: 255, alpha: None }),
        "red" => Some(Rgb { r: 255, g: 0, b: 0, alpha: None }),
        "green" => Some(Rgb { r: 0, g: 128, b: 0, alpha: None }),
        "blue" => Some(Rgb { r: 0, g: 0, b: 255, alpha: None }),
        _ => None,
    }
}

/// Default generator: inverts each channel. Unparseable colors are kept.
pub fn invert_color(color: &str) -> String {
    match parse_color(color) {
        Some(Rgb { r, g, b, alpha: None }) => format!("rgb({}, {}, {})", 255 - r, 255 - g, 255 - b),
        Some(Rgb {
            r,
            g,
            b,
            alpha: Some(alpha),
        }) => format!("rgba({}, {}, {}, {alpha})", 255 - r, 255 - g, 255 - b),
        None => color.to_string(),
    }
}
