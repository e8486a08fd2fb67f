/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Page metadata reported by the host: title, icons, theme colour, plus the
//! load-progress estimate derived from injected timestamps.

use browsershell_core::Timestamp;
use serde::{Deserialize, Serialize};
use url::Url;

/// Ideal favicon edge in CSS pixels.
pub const FAVICON_SIZE: u32 = 16;

/// Time constant of the progress curve, in milliseconds.
const PROGRESS_HALF_LIFE_MS: u64 = 1_500;
/// The estimate never claims completion before the host reports it.
const PROGRESS_CEILING: f32 = 0.95;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub href: String,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub sizes: Option<String>,
}

impl Icon {
    fn is_favicon_rel(&self) -> bool {
        matches!(self.rel.as_deref(), Some("icon") | Some("shortcut icon"))
    }
}

/// Pick the icon that best fits a [`FAVICON_SIZE`] square.
///
/// Icons with an `icon`/`shortcut icon` rel and declared `sizes` compete on
/// distance from the ideal size (`any` counts as ideal). Everything else is
/// only considered when no sized candidate exists, in which case the last
/// favicon-rel icon wins, or failing that the first icon listed.
pub fn best_icon(icons: &[Icon]) -> Option<Icon> {
    let mut sized: Vec<(u32, &Icon)> = Vec::new();
    let mut others: Vec<&Icon> = Vec::new();

    for icon in icons {
        let sizes = icon.sizes.as_deref().map(str::trim).unwrap_or_default();
        if !icon.is_favicon_rel() || sizes.is_empty() {
            others.push(icon);
            continue;
        }
        for size in declared_sizes(sizes) {
            match sized.iter_mut().find(|(known, _)| *known == size) {
                Some(slot) => slot.1 = icon,
                None => sized.push((size, icon)),
            }
        }
    }

    let distance = |size: u32| size.abs_diff(FAVICON_SIZE);
    let best_sized = sized.into_iter().reduce(|best, candidate| {
        if distance(best.0) > distance(candidate.0) {
            candidate
        } else {
            best
        }
    });
    if let Some((size, icon)) = best_sized {
        return Some(Icon {
            href: icon.href.clone(),
            rel: icon.rel.clone(),
            sizes: Some(format!("{size}x{size}")),
        });
    }

    others
        .iter()
        .rev()
        .find(|icon| icon.is_favicon_rel())
        .or_else(|| others.first())
        .map(|icon| (*icon).clone())
}

fn declared_sizes(sizes: &str) -> Vec<u32> {
    if sizes == "any" {
        return vec![FAVICON_SIZE];
    }
    sizes
        .split_whitespace()
        .filter_map(|entry| {
            let digits: String = entry.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect()
}

/// `<origin>/favicon.ico` for pages with a network origin.
pub fn fallback_icon(page_uri: &str) -> Option<String> {
    let url = Url::parse(page_uri).ok()?;
    let origin = url.origin();
    origin
        .is_tuple()
        .then(|| format!("{}/favicon.ico", origin.ascii_serialization()))
}

/// Colours derived from a page's `theme-color`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pallet {
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub is_dark: bool,
}

impl Pallet {
    pub fn from_theme_color(color: &str) -> Self {
        let color = color.trim();
        match parse_hex_color(color) {
            Some((r, g, b)) => {
                let luminance = (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0;
                let is_dark = luminance < 0.5;
                Pallet {
                    background: Some(format!("#{r:02x}{g:02x}{b:02x}")),
                    foreground: Some(if is_dark { "#ffffff" } else { "#000000" }.to_string()),
                    is_dark,
                }
            },
            None if color.is_empty() => Pallet::default(),
            None => Pallet {
                background: Some(color.to_string()),
                foreground: None,
                is_dark: false,
            },
        }
    }
}

fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_string().repeat(2));
            Some((
                channel(&digits.next()?)?,
                channel(&digits.next()?)?,
                channel(&digits.next()?)?,
            ))
        },
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageModel {
    pub title: Option<String>,
    pub icons: Vec<Icon>,
    pub favicon: Option<Icon>,
    pub pallet: Pallet,
}

impl PageModel {
    pub fn with_icons(self, icons: Vec<Icon>) -> Self {
        PageModel {
            favicon: best_icon(&icons),
            icons,
            ..self
        }
    }

    /// The favicon to draw for a page at `page_uri`.
    pub fn favicon_uri(&self, page_uri: &str) -> Option<String> {
        match &self.favicon {
            Some(icon) => Some(icon.href.clone()),
            None => fallback_icon(page_uri),
        }
    }
}

/// Load timing, recorded from host timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub load_start: Option<Timestamp>,
    pub load_end: Option<Timestamp>,
}

impl Progress {
    pub fn started(time: Timestamp) -> Self {
        Progress {
            load_start: Some(time),
            load_end: None,
        }
    }

    /// Estimated completion in `[0, 1]` at `now`.
    pub fn estimate(&self, now: Timestamp) -> f32 {
        match (self.load_start, self.load_end) {
            (None, _) => 0.0,
            (Some(_), Some(_)) => 1.0,
            (Some(start), None) => {
                let elapsed = now.millis_since(start) as f32;
                let curve = elapsed / (elapsed + PROGRESS_HALF_LIFE_MS as f32);
                curve.min(PROGRESS_CEILING)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn icon(href: &str, rel: Option<&str>, sizes: Option<&str>) -> Icon {
        Icon {
            href: href.into(),
            rel: rel.map(Into::into),
            sizes: sizes.map(Into::into),
        }
    }

    #[test]
    fn closest_declared_size_wins() {
        let icons = vec![
            icon("/big.png", Some("icon"), Some("64x64")),
            icon("/multi.ico", Some("shortcut icon"), Some("32x32 16x16")),
            icon("/apple.png", Some("apple-touch-icon"), Some("16x16")),
        ];
        let best = best_icon(&icons).unwrap();
        assert_eq!(best.href, "/multi.ico");
        assert_eq!(best.sizes.as_deref(), Some("16x16"));
    }

    #[test]
    fn any_size_counts_as_ideal() {
        let icons = vec![
            icon("/small.png", Some("icon"), Some("24x24")),
            icon("/vector.svg", Some("icon"), Some("any")),
        ];
        assert_eq!(best_icon(&icons).unwrap().href, "/vector.svg");
    }

    #[test]
    fn unsized_icons_prefer_favicon_rel() {
        let icons = vec![
            icon("/touch.png", Some("apple-touch-icon"), None),
            icon("/favicon.png", Some("icon"), None),
            icon("/mask.svg", Some("mask-icon"), None),
        ];
        assert_eq!(best_icon(&icons).unwrap().href, "/favicon.png");
        assert_eq!(best_icon(&[]), None);
    }

    #[rstest]
    #[case("https://example.org/a/b?c", Some("https://example.org/favicon.ico"))]
    #[case("http://localhost:8080/", Some("http://localhost:8080/favicon.ico"))]
    #[case("about:blank", None)]
    #[case("not a uri", None)]
    fn fallback_icon_uses_the_page_origin(#[case] page: &str, #[case] expected: Option<&str>) {
        assert_eq!(fallback_icon(page).as_deref(), expected);
    }

    #[rstest]
    #[case("#000", Some("#000000"), Some("#ffffff"), true)]
    #[case("#FFFFFF", Some("#ffffff"), Some("#000000"), false)]
    #[case("#1e90ff", Some("#1e90ff"), Some("#ffffff"), true)]
    #[case("rebeccapurple", Some("rebeccapurple"), None, false)]
    #[case("", None, None, false)]
    fn theme_colour_produces_a_contrasting_pallet(
        #[case] color: &str,
        #[case] background: Option<&str>,
        #[case] foreground: Option<&str>,
        #[case] is_dark: bool,
    ) {
        let pallet = Pallet::from_theme_color(color);
        assert_eq!(pallet.background.as_deref(), background);
        assert_eq!(pallet.foreground.as_deref(), foreground);
        assert_eq!(pallet.is_dark, is_dark);
    }

    #[test]
    fn progress_estimate_is_monotonic_and_capped() {
        let progress = Progress::started(Timestamp(1_000));
        let early = progress.estimate(Timestamp(1_100));
        let late = progress.estimate(Timestamp(60_000));
        assert!(early > 0.0 && early < late);
        assert!(late <= PROGRESS_CEILING);
        assert_eq!(Progress::default().estimate(Timestamp(5)), 0.0);

        let finished = Progress {
            load_end: Some(Timestamp(1_200)),
            ..progress
        };
        assert_eq!(finished.estimate(Timestamp(1_200)), 1.0);
    }
}
