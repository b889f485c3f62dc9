use crate::config::DEFAULT_ACCENT;
use aurakit::wheel::SECTOR_COLORS;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::{Srgb, Srgba, WithAlpha};
use std::cell::RefCell;
use std::str::FromStr;

pub struct ThemeColors {
    pub accent: Srgba<f64>,
    pub label: Srgba<f64>,
    pub label_shadow: Srgba<f64>,
    pub rim: Srgba<f64>,
    pub sectors: Vec<Srgba<f64>>,
}

impl ThemeColors {
    pub fn new(context: &gtk::StyleContext, accent: &str) -> Self {
        Self {
            accent: parse_hex(accent).unwrap_or_else(|| {
                log::warn!("Invalid accent colour '{}', using {}", accent, DEFAULT_ACCENT);
                Srgba::new(0.796, 0.631, 0.208, 1.0)
            }),
            label: Self::lookup_color(
                context,
                "theme_selected_fg_color",
                Srgba::new(1.0, 1.0, 1.0, 1.0),
                Some(1.0),
            ),
            label_shadow: Srgba::new(0.0, 0.0, 0.0, 0.6),
            rim: Srgba::new(1.0, 1.0, 1.0, 0.08),
            sectors: SECTOR_COLORS
                .iter()
                .map(|hex| parse_hex(hex).unwrap_or(Srgba::new(0.3, 0.3, 0.5, 1.0)))
                .collect(),
        }
    }

    pub fn sector(&self, index: usize) -> Srgba<f64> {
        self.sectors
            .get(index % self.sectors.len().max(1))
            .copied()
            .unwrap_or(self.accent)
    }

    fn lookup_color(
        context: &gtk::StyleContext,
        name: &str,
        fallback: Srgba<f64>,
        alpha_override: Option<f64>,
    ) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                let (r, g, b, a) = (
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    c.alpha() as f64,
                );
                Srgba::new(r, g, b, alpha_override.unwrap_or(a))
            })
            .unwrap_or(fallback)
    }
}

pub fn parse_hex(hex: &str) -> Option<Srgba<f64>> {
    Srgb::<u8>::from_str(hex.trim())
        .ok()
        .map(|c| c.into_format::<f64>().with_alpha(1.0))
}

thread_local! {
    static PROVIDER: RefCell<Option<gtk::CssProvider>> = const { RefCell::new(None) };
}

/// Installs (or replaces) the application stylesheet for `accent`.
pub fn load_css(accent: &str) {
    let accent = if parse_hex(accent).is_some() {
        accent
    } else {
        DEFAULT_ACCENT
    };
    let css_data = format!(
        "
.aura-window {{
    background-image: linear-gradient(160deg, #120B33, #2A114A 50%, #06112C);
    color: white;
}}
.aura-title {{
    color: {accent};
    font-size: 1.6em;
    font-weight: bold;
}}
.aura-accent {{
    background: {accent};
    color: black;
    font-weight: bold;
    border-radius: 12px;
}}
.aura-card {{
    background-color: alpha(white, 0.05);
    border: 1px solid alpha(white, 0.1);
    border-radius: 16px;
    padding: 16px;
}}
.aura-error {{
    color: #f87171;
}}
.aura-message {{
    color: {accent};
    font-style: italic;
}}
"
    );

    let Some(display) = gdk::Display::default() else {
        return;
    };

    PROVIDER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if let Some(old) = slot.take() {
            gtk::style_context_remove_provider_for_display(&display, &old);
        }
        let provider = gtk::CssProvider::new();
        provider.load_from_data(&css_data);
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
        *slot = Some(provider);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let c = parse_hex("#CBA135").unwrap();
        let (r, g, b, a) = c.into_components();
        assert!((r - 203.0 / 255.0).abs() < 1e-9);
        assert!((g - 161.0 / 255.0).abs() < 1e-9);
        assert!((b - 53.0 / 255.0).abs() < 1e-9);
        assert_eq!(a, 1.0);
        assert!(parse_hex("not a colour").is_none());
    }
}
