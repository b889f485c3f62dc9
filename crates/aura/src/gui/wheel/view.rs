use super::model::{FaceCache, WheelView};
use crate::gui::theme::ThemeColors;
use aurakit::wheel::{
    LABEL_RADIUS_FACTOR, WheelLayout, backing_size, label_font_size, label_line_offsets,
    label_text, wheel_radius, wrap_label,
};
use cairo::{Context, Format, ImageSurface};
use palette::Srgba;
use std::f64::consts::PI;

const POINTER_HALF_WIDTH: f64 = 14.0;
pub const POINTER_HEIGHT: f64 = 26.0;
const RIM_WIDTH: f64 = 2.0;

fn set_color(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

/// Cairo angle (radians, 0 at 3 o'clock) of a wheel angle in degrees
/// (0 at 12 o'clock).
fn to_cairo(deg: f64) -> f64 {
    (deg - 90.0).to_radians()
}

struct FaceRenderer<'a> {
    cr: &'a Context,
    layout: WheelLayout,
    diameter: f64,
    colors: &'a ThemeColors,
}

impl<'a> FaceRenderer<'a> {
    fn center(&self) -> f64 {
        self.diameter / 2.0
    }

    fn radius(&self) -> f64 {
        wheel_radius(self.diameter)
    }

    fn draw(&self, labels: &[String]) -> Result<(), cairo::Error> {
        for (i, label) in labels.iter().enumerate() {
            self.draw_sector(i)?;
            self.draw_label(i, label)?;
        }
        self.draw_rim()
    }

    fn draw_sector(&self, index: usize) -> Result<(), cairo::Error> {
        let (start, end) = self.layout.sector_span(index);
        let c = self.center();
        self.cr.move_to(c, c);
        self.cr
            .arc(c, c, self.radius(), to_cairo(start), to_cairo(end));
        self.cr.close_path();
        set_color(self.cr, self.colors.sector(index));
        self.cr.fill()
    }

    fn draw_label(&self, index: usize, name: &str) -> Result<(), cairo::Error> {
        let cr = self.cr;
        let font_size = label_font_size(self.diameter);
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
        cr.set_font_size(font_size);

        let chord = self.layout.label_chord(self.radius());
        let lines = wrap_label(&label_text(name), chord, |s| {
            cr.text_extents(s).map(|e| e.x_advance()).unwrap_or(0.0)
        });

        let (ax, ay) = self.layout.label_anchor(index, self.radius());
        let (cx, cy) = (self.center() + ax, self.center() + ay);

        for (line, dy) in lines.iter().zip(label_line_offsets(lines.len(), font_size)) {
            let Ok(ext) = cr.text_extents(line) else {
                continue;
            };
            // center the ink box on the anchor
            let x = cx - ext.width() / 2.0 - ext.x_bearing();
            let y = cy + dy - ext.height() / 2.0 - ext.y_bearing();

            set_color(cr, self.colors.label_shadow);
            cr.move_to(x + 1.0, y + 1.0);
            cr.show_text(line)?;

            set_color(cr, self.colors.label);
            cr.move_to(x, y);
            cr.show_text(line)?;
        }
        Ok(())
    }

    fn draw_rim(&self) -> Result<(), cairo::Error> {
        let c = self.center();
        self.cr.new_path();
        self.cr.arc(c, c, self.radius(), 0.0, 2.0 * PI);
        set_color(self.cr, self.colors.rim);
        self.cr.set_line_width(RIM_WIDTH);
        self.cr.stroke()
    }
}

/// Renders the static wheel face at `scale` backing pixels per logical pixel.
pub fn render_face(
    view: &WheelView,
    scale: f64,
    colors: &ThemeColors,
) -> Result<FaceCache, cairo::Error> {
    let size = backing_size(view.diameter, scale).max(1);
    let surface = ImageSurface::create(Format::ARgb32, size, size)?;
    surface.set_device_scale(scale, scale);

    {
        let cr = Context::new(&surface)?;
        FaceRenderer {
            cr: &cr,
            layout: WheelLayout::new(view.labels.len()),
            diameter: view.diameter,
            colors,
        }
        .draw(&view.labels)?;
    }
    surface.flush();

    log::debug!(
        "Rendered wheel face {}px at scale {} (label radius {:.0}px)",
        view.diameter,
        scale,
        wheel_radius(view.diameter) * LABEL_RADIUS_FACTOR
    );

    Ok(FaceCache {
        surface,
        diameter: view.diameter,
        scale,
    })
}

/// Paints the wheel rotated by `rotation` degrees, centered in the area, with
/// the fixed pointer on top.
pub fn draw(
    cr: &Context,
    view: &mut WheelView,
    rotation: f64,
    area: (f64, f64),
    scale: f64,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    if !view.face_is_current(scale) {
        view.face = Some(render_face(view, scale, colors)?);
    }
    let Some(face) = &view.face else {
        return Ok(());
    };

    let d = face.diameter;
    let (cx, cy) = (area.0 / 2.0, (POINTER_HEIGHT / 2.0) + d / 2.0);

    cr.save()?;
    cr.translate(cx, cy);
    cr.rotate(rotation.to_radians());
    cr.translate(-d / 2.0, -d / 2.0);
    cr.set_source_surface(&face.surface, 0.0, 0.0)?;
    cr.arc(d / 2.0, d / 2.0, d / 2.0, 0.0, 2.0 * PI);
    cr.fill()?;
    cr.restore()?;

    draw_pointer(cr, cx, cy - d / 2.0, colors)
}

fn draw_pointer(cr: &Context, x: f64, rim_y: f64, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let top = rim_y - POINTER_HEIGHT / 2.0;
    cr.new_path();
    cr.move_to(x - POINTER_HALF_WIDTH, top);
    cr.line_to(x + POINTER_HALF_WIDTH, top);
    cr.line_to(x, top + POINTER_HEIGHT);
    cr.close_path();
    set_color(cr, colors.accent);
    cr.fill()
}
