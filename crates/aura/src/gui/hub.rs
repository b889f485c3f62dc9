//! Members hub: the four collapsible content sections.

use crate::gui::app::{AppModel, AppMsg};
use aurakit::accordion::{AccordionHub, ExclusiveOpen, Section};
use aurakit::catalog::{self, Catalog, Command, Crystal, Frequency, Geometry};
use aurakit::player::FrequencyPlayer;
use gdk_pixbuf::Pixbuf;
use gdk4::prelude::*;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::ComponentSender;
use strum::IntoEnumIterator;

const GEOMETRY_THUMB_SIZE: i32 = 220;

struct SectionWidgets {
    section: Section,
    header: gtk::Button,
    revealer: gtk::Revealer,
}

struct ExpanderWidgets<K> {
    key: K,
    toggle: gtk::Button,
    revealer: gtk::Revealer,
}

struct PlayWidgets {
    hz: u32,
    button: gtk::Button,
}

pub struct HubWidgets {
    pub root: gtk::Box,
    sections: Vec<SectionWidgets>,
    frequencies: Vec<ExpanderWidgets<u32>>,
    crystals: Vec<ExpanderWidgets<usize>>,
    players: Vec<PlayWidgets>,
    now_playing: gtk::Label,
}

fn card() -> gtk::Box {
    let b = gtk::Box::new(gtk::Orientation::Vertical, 8);
    b.add_css_class("aura-card");
    b
}

fn text_label(text: &str) -> gtk::Label {
    let l = gtk::Label::new(Some(text));
    l.set_wrap(true);
    l.set_xalign(0.0);
    l.set_selectable(true);
    l
}

fn markup_label(markup: &str) -> gtk::Label {
    let l = text_label("");
    l.set_markup(markup);
    l
}

fn chevron(open: bool) -> &'static str {
    if open { "pan-up-symbolic" } else { "pan-down-symbolic" }
}

impl HubWidgets {
    pub fn new(catalog: &Catalog, sender: &ComponentSender<AppModel>) -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 16);
        let mut hub = Self {
            root: root.clone(),
            sections: Vec::new(),
            frequencies: Vec::new(),
            crystals: Vec::new(),
            players: Vec::new(),
            now_playing: text_label(""),
        };

        for section in Section::iter() {
            let content = match section {
                Section::Geometry => hub.geometry_gallery(&catalog.geometries),
                Section::Frequencies => hub.frequency_list(&catalog.frequencies, sender),
                Section::Commands => hub.command_list(&catalog.commands),
                Section::Crystals => hub.crystal_list(&catalog.crystals, sender),
            };

            let header = gtk::Button::new();
            header.add_css_class("flat");
            let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            let title = gtk::Label::new(Some(section.title()));
            title.set_hexpand(true);
            title.set_xalign(0.0);
            title.add_css_class("aura-title");
            row.append(&title);
            row.append(&gtk::Image::from_icon_name(chevron(false)));
            header.set_child(Some(&row));
            {
                let sender = sender.clone();
                header.connect_clicked(move |_| sender.input(AppMsg::ToggleSection(section)));
            }

            let revealer = gtk::Revealer::new();
            revealer.set_transition_type(gtk::RevealerTransitionType::SlideDown);
            revealer.set_child(Some(&content));

            let wrapper = card();
            wrapper.append(&header);
            wrapper.append(&revealer);
            root.append(&wrapper);

            hub.sections.push(SectionWidgets {
                section,
                header,
                revealer,
            });
        }

        hub
    }

    fn geometry_gallery(&mut self, geometries: &[Geometry]) -> gtk::Widget {
        let flow = gtk::FlowBox::new();
        flow.set_selection_mode(gtk::SelectionMode::None);
        flow.set_max_children_per_line(4);
        flow.set_column_spacing(12);
        flow.set_row_spacing(12);

        for g in geometries {
            let item = card();
            let pixbuf = catalog::find_media(&g.image_name()).and_then(|path| {
                Pixbuf::from_file_at_scale(&path, GEOMETRY_THUMB_SIZE, GEOMETRY_THUMB_SIZE, true)
                    .map_err(|e| log::warn!("Failed to load {}: {}", path.display(), e))
                    .ok()
            });

            match pixbuf {
                Some(pixbuf) => item.append(&thumbnail(pixbuf)),
                None => log::debug!("No image for geometry '{}'", g.slug),
            }
            item.append(&markup_label(&format!(
                "<b>{}</b>",
                glib::markup_escape_text(&g.name)
            )));
            item.append(&text_label(&g.description));
            flow.insert(&item, -1);
        }
        flow.upcast()
    }

    fn frequency_list(
        &mut self,
        frequencies: &[Frequency],
        sender: &ComponentSender<AppModel>,
    ) -> gtk::Widget {
        let list = gtk::Box::new(gtk::Orientation::Vertical, 12);
        self.now_playing.add_css_class("aura-message");
        self.now_playing.set_visible(false);
        list.append(&self.now_playing);

        for f in frequencies {
            let item = card();
            let header = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            let title = markup_label(&format!(
                "<b>{}</b>",
                glib::markup_escape_text(&f.display_title())
            ));
            title.set_hexpand(true);
            header.append(&title);

            let play = gtk::Button::with_label("Reproducir");
            play.add_css_class("aura-accent");
            {
                let sender = sender.clone();
                let hz = f.hz;
                play.connect_clicked(move |_| sender.input(AppMsg::PlayFrequency(hz)));
            }
            header.append(&play);

            let toggle = gtk::Button::from_icon_name(chevron(false));
            {
                let sender = sender.clone();
                let hz = f.hz;
                toggle.connect_clicked(move |_| sender.input(AppMsg::ToggleFrequency(hz)));
            }
            header.append(&toggle);
            item.append(&header);

            let details = gtk::Box::new(gtk::Orientation::Vertical, 6);
            let (usage, visualization) = f.sections();
            for paragraph in usage {
                details.append(&text_label(paragraph));
            }
            if let Some(vis) = visualization {
                details.append(&markup_label(&format!(
                    "<b>Visualización:</b> <i>{}</i>",
                    glib::markup_escape_text(vis)
                )));
            }
            let revealer = gtk::Revealer::new();
            revealer.set_child(Some(&details));
            item.append(&revealer);
            list.append(&item);

            self.players.push(PlayWidgets {
                hz: f.hz,
                button: play,
            });
            self.frequencies.push(ExpanderWidgets {
                key: f.hz,
                toggle,
                revealer,
            });
        }
        list.upcast()
    }

    fn command_list(&mut self, commands: &[Command]) -> gtk::Widget {
        let list = gtk::Box::new(gtk::Orientation::Vertical, 12);
        for c in commands {
            let item = card();
            item.append(&markup_label(&format!(
                "<b>{}</b>",
                glib::markup_escape_text(&c.title)
            )));
            item.append(&text_label(&c.text));
            list.append(&item);
        }
        list.upcast()
    }

    fn crystal_list(
        &mut self,
        crystals: &[Crystal],
        sender: &ComponentSender<AppModel>,
    ) -> gtk::Widget {
        let list = gtk::Box::new(gtk::Orientation::Vertical, 12);

        let wheel = gtk::Button::with_label("Rueda de Cristales");
        wheel.add_css_class("aura-accent");
        wheel.set_halign(gtk::Align::Center);
        {
            let sender = sender.clone();
            wheel.connect_clicked(move |_| sender.input(AppMsg::OpenWheel));
        }
        list.append(&wheel);

        for (index, c) in crystals.iter().enumerate() {
            let item = card();

            let toggle = gtk::Button::new();
            toggle.add_css_class("flat");
            let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            let name = gtk::Label::new(Some(&c.name));
            name.set_hexpand(true);
            name.set_xalign(0.0);
            name.add_css_class("aura-title");
            row.append(&name);
            row.append(&gtk::Image::from_icon_name(chevron(false)));
            toggle.set_child(Some(&row));
            {
                let sender = sender.clone();
                toggle.connect_clicked(move |_| sender.input(AppMsg::ToggleCrystal(index)));
            }
            item.append(&toggle);

            let details = gtk::Box::new(gtk::Orientation::Vertical, 6);
            for (field, value) in [
                ("Descripción", &c.description),
                ("Cuerpo", &c.body),
                ("Beneficios", &c.benefits),
            ] {
                details.append(&markup_label(&format!(
                    "<b>{}:</b> {}",
                    field,
                    glib::markup_escape_text(value)
                )));
            }
            details.append(&markup_label("<b>Mensaje holístico:</b>"));
            let message = text_label(&c.message);
            message.add_css_class("aura-message");
            details.append(&message);

            let copy = gtk::Button::with_label("Copiar");
            copy.add_css_class("aura-accent");
            copy.set_halign(gtk::Align::Start);
            {
                let text = c.clipboard_text();
                copy.connect_clicked(move |button| button.clipboard().set_text(&text));
            }
            details.append(&copy);

            let revealer = gtk::Revealer::new();
            revealer.set_child(Some(&details));
            item.append(&revealer);
            list.append(&item);

            self.crystals.push(ExpanderWidgets {
                key: index,
                toggle,
                revealer,
            });
        }
        list.upcast()
    }

    /// Pushes controller state into the widgets.
    pub fn sync(
        &self,
        sections: &AccordionHub,
        frequencies: &ExclusiveOpen<u32>,
        crystals: &ExclusiveOpen<usize>,
        player: &FrequencyPlayer,
    ) {
        for s in &self.sections {
            let open = sections.is_open(s.section);
            s.revealer.set_reveal_child(open);
            set_chevron(&s.header, open);
        }
        sync_expanders(&self.frequencies, frequencies);
        sync_expanders(&self.crystals, crystals);

        for p in &self.players {
            let playing = player.is_playing(p.hz);
            p.button
                .set_label(if playing { "Detener" } else { "Reproducir" });
        }

        match player.now_playing() {
            Some(now) => {
                self.now_playing
                    .set_label(&format!("Reproduciendo: {}", now.title));
                self.now_playing.set_visible(true);
            }
            None => self.now_playing.set_visible(false),
        }
    }
}

fn sync_expanders<K: PartialEq + Copy>(widgets: &[ExpanderWidgets<K>], open: &ExclusiveOpen<K>) {
    for w in widgets {
        let is_open = open.is_open(w.key);
        w.revealer.set_reveal_child(is_open);
        set_chevron(&w.toggle, is_open);
    }
}

/// Swaps the chevron icon of a header button, wherever it sits.
fn set_chevron(button: &gtk::Button, open: bool) {
    if button.icon_name().is_some() {
        button.set_icon_name(chevron(open));
        return;
    }
    let icon = button
        .child()
        .and_then(|row| row.last_child())
        .and_downcast::<gtk::Image>();
    if let Some(icon) = icon {
        icon.set_icon_name(Some(chevron(open)));
    }
}

fn thumbnail(pixbuf: Pixbuf) -> gtk::DrawingArea {
    let area = gtk::DrawingArea::new();
    area.set_content_width(GEOMETRY_THUMB_SIZE);
    area.set_content_height(GEOMETRY_THUMB_SIZE);
    area.set_draw_func(move |_, cr, width, height| {
        // fit and center
        let scale = (width as f64 / pixbuf.width() as f64)
            .min(height as f64 / pixbuf.height() as f64);
        let (w, h) = (
            pixbuf.width() as f64 * scale,
            pixbuf.height() as f64 * scale,
        );
        cr.translate((width as f64 - w) / 2.0, (height as f64 - h) / 2.0);
        cr.scale(scale, scale);
        cr.set_source_pixbuf(&pixbuf, 0.0, 0.0);
        if let Err(e) = cr.paint() {
            log::error!("Thumbnail drawing error: {}", e);
        }
    });
    area
}
