use crate::config::{self, Config};
use crate::events::AppEvent;
use crate::gui::hub::HubWidgets;
use crate::gui::theme;
use crate::gui::wheel::{WheelInit, WheelModel, WheelMsg};
use crate::link::LaunchLink;
use aurakit::accordion::{AccordionHub, ExclusiveOpen, Section};
use aurakit::catalog::{self, Catalog};
use aurakit::contact::{ContactForm, ContactMode, FieldErrors, LinkError, Prefill};
use aurakit::gate::{AccessOutcome, Gate, sanitize_pin_input};
use aurakit::player::{FrequencyPlayer, PlayerCommand};
use aurakit::store::{DisabledStore, FileStore, FlagStore};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::path::Path;
use std::sync::Arc;
use strum::IntoEnumIterator;

pub struct AppModel {
    gate: Gate<Box<dyn FlagStore>>,
    config: Config,
    catalog: Arc<Catalog>,
    sections: AccordionHub,
    open_frequency: ExclusiveOpen<u32>,
    open_crystal: ExclusiveOpen<usize>,
    player: FrequencyPlayer,
    media: Option<gtk::MediaFile>,
    contact: ContactForm,
    contact_errors: FieldErrors,
    contact_submitted: bool,
    pin_input: String,
    visible: bool,
    wheel: Controller<WheelModel>,
    hub: HubWidgets,
    root: gtk::ApplicationWindow,
    hub_container: gtk::Box,
    pin_entry: gtk::Entry,
    message_entry: gtk::Entry,
    mode_dropdown: gtk::DropDown,
}

#[derive(Debug)]
pub enum AppMsg {
    Show,
    Hide,
    Lock,
    ConfigReload,
    OpenWheel,
    PinChanged(String),
    SubmitPin,
    ToggleSection(Section),
    OpenSection(Section),
    ToggleFrequency(u32),
    ToggleCrystal(usize),
    PlayFrequency(u32),
    MediaStarted(u32),
    MediaEnded(u32),
    MediaFailed(String),
    ContactName(String),
    ContactEmail(String),
    ContactMessage(String),
    ContactModeSelected(u32),
    Prefill(Prefill),
    SendContact,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Show => AppMsg::Show,
            AppEvent::Hide => AppMsg::Hide,
            AppEvent::OpenWheel => AppMsg::OpenWheel,
            AppEvent::Lock => AppMsg::Lock,
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

fn open_store() -> Box<dyn FlagStore> {
    match FileStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("Flag storage unavailable, access will not persist: {}", e);
            Box::new(DisabledStore)
        }
    }
}

fn mode_index(mode: ContactMode) -> u32 {
    ContactMode::iter().position(|m| m == mode).unwrap_or(0) as u32
}

fn consigna_markup(accent: &str) -> String {
    let strong = |s: &str| format!("<span foreground=\"{}\"><b>{}</b></span>", accent, s);
    format!(
        "Este espacio reúne {}, {}, {} y {} para que continúes tu proceso. \
         Elegí {}: eso que te atrae es lo que tu campo de energía {}.",
        strong("geometrías"),
        strong("frecuencias"),
        strong("comandos"),
        strong("cristales"),
        strong("lo que te llame"),
        strong("necesita ahora"),
    )
}

const CONSIGNA_STEPS: [&str; 5] = [
    "Imprimí las imágenes y llevalas con vos: casa, trabajo, billetera, celu, bajo la almohada.",
    "Escuchá frecuencias para dormir, meditar o acompañar momentos de calma.",
    "Repetí los comandos en voz alta, con intención clara y respiración consciente.",
    "Elegí un cristal de la lista y si podés conseguirlo, él te acompañará durante los siguientes días posteriores a la sesión.",
    "Tiempo recomendado del ejercicio: +7 días después de nuestra sesión.",
];

impl AppModel {
    fn apply_config(&mut self, config: Config) {
        self.gate.set_pin(config.pin.clone());
        theme::load_css(&config.accent);
        self.wheel.emit(WheelMsg::Configure(
            config.wheel.clone(),
            config.accent.clone(),
        ));
        self.config = config;
    }

    fn rebuild_hub(&mut self, sender: &ComponentSender<Self>) {
        self.stop_media();
        self.player.stop();
        self.hub_container.remove(&self.hub.root);
        self.hub = HubWidgets::new(&self.catalog, sender);
        self.hub_container.append(&self.hub.root);
    }

    fn stop_media(&mut self) {
        if let Some(media) = self.media.take() {
            media.set_playing(false);
        }
    }

    fn start_media(&mut self, hz: u32, source: &Path, sender: &ComponentSender<Self>) {
        let media = gtk::MediaFile::for_filename(source);
        {
            let sender = sender.clone();
            media.connect_playing_notify(move |m| {
                if m.is_playing() {
                    sender.input(AppMsg::MediaStarted(hz));
                }
            });
        }
        {
            let sender = sender.clone();
            media.connect_ended_notify(move |m| {
                if m.is_ended() {
                    sender.input(AppMsg::MediaEnded(hz));
                }
            });
        }
        {
            let sender = sender.clone();
            media.connect_error_notify(move |m| {
                if let Some(e) = m.error() {
                    sender.input(AppMsg::MediaFailed(e.to_string()));
                }
            });
        }
        media.play();
        self.media = Some(media);
    }

    fn play_frequency(&mut self, hz: u32, sender: &ComponentSender<Self>) {
        let Some(freq) = self.catalog.frequencies.iter().find(|f| f.hz == hz) else {
            return;
        };
        let title = freq.display_title();
        let source = catalog::find_media(&freq.media_name());

        for cmd in self.player.toggle(hz, &title, source) {
            match cmd {
                PlayerCommand::Stop => self.stop_media(),
                PlayerCommand::Start { hz, source } => {
                    log::info!("Playing {}", source.display());
                    self.start_media(hz, &source, sender);
                }
            }
        }
    }

    fn refresh_contact_errors(&mut self) {
        if self.contact_submitted {
            self.contact_errors = self.contact.validate();
        }
    }

    fn send_contact(&mut self) {
        self.contact_submitted = true;
        match self
            .contact
            .messaging_link(&self.config.phone, &self.config.recipient)
        {
            Ok(link) => {
                self.contact_errors = FieldErrors::default();
                log::info!("Opening messaging link for {}", self.contact.mode);
                if let Err(e) = gtk::gio::AppInfo::launch_default_for_uri(
                    &link,
                    None::<&gtk::gio::AppLaunchContext>,
                ) {
                    log::error!("Failed to open messaging link: {}", e);
                }
            }
            Err(LinkError::Invalid(errors)) => self.contact_errors = errors,
        }
    }

    fn apply_prefill(&mut self, prefill: &Prefill) {
        self.contact.apply_prefill(prefill);
        self.message_entry.set_text(&self.contact.message);
        self.mode_dropdown
            .set_selected(mode_index(self.contact.mode));
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        Config,
        Option<LaunchLink>,
        async_channel::Receiver<AppEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        gtk::ApplicationWindow {
            set_title: Some("Aura"),
            set_default_width: 960,
            set_default_height: 900,
            add_css_class: "aura-window",
            #[watch]
            set_visible: model.visible,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(AppMsg::Hide);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            gtk::ScrolledWindow {
                set_hscrollbar_policy: gtk::PolicyType::Never,

                gtk::Box {
                    set_orientation: gtk::Orientation::Vertical,
                    set_spacing: 24,
                    set_margin_all: 24,

                    gtk::Stack {
                        set_transition_type: gtk::StackTransitionType::Crossfade,
                        #[watch]
                        set_visible_child_name: if model.gate.is_granted() { "members" } else { "locked" },

                        add_named[Some("locked")] = &gtk::Box {
                            set_orientation: gtk::Orientation::Vertical,
                            set_spacing: 12,
                            add_css_class: "aura-card",

                            gtk::Label {
                                set_label: "Sección de Usuarios",
                                set_xalign: 0.0,
                                add_css_class: "aura-title",
                            },

                            gtk::Label {
                                set_label: "Acceso exclusivo para consultantes. Ingresá con el PIN que te compartí al finalizar tu sesión.\nAquí encontrarás ejercicios, ayudas y frecuencias para tu integración.",
                                set_wrap: true,
                                set_xalign: 0.0,
                            },

                            gtk::Box {
                                set_orientation: gtk::Orientation::Horizontal,
                                set_spacing: 8,

                                #[name = "pin_entry"]
                                gtk::Entry {
                                    set_placeholder_text: Some("PIN"),
                                    set_input_purpose: gtk::InputPurpose::Digits,
                                    set_visibility: false,
                                    set_hexpand: true,
                                    connect_changed[sender] => move |entry| {
                                        sender.input(AppMsg::PinChanged(entry.text().to_string()));
                                    },
                                    connect_activate => AppMsg::SubmitPin,
                                },

                                gtk::Button {
                                    set_label: "Ingresar",
                                    add_css_class: "aura-accent",
                                    connect_clicked => AppMsg::SubmitPin,
                                },
                            },

                            gtk::Label {
                                add_css_class: "aura-error",
                                set_xalign: 0.0,
                                #[watch]
                                set_label: model.gate.error().unwrap_or_default(),
                                #[watch]
                                set_visible: model.gate.error().is_some(),
                            },
                        },

                        add_named[Some("members")] = &gtk::Box {
                            set_orientation: gtk::Orientation::Vertical,
                            set_spacing: 20,

                            gtk::Box {
                                set_orientation: gtk::Orientation::Horizontal,

                                gtk::Label {
                                    set_label: "Usuarios",
                                    set_hexpand: true,
                                    add_css_class: "aura-title",
                                },

                                gtk::Button {
                                    set_label: "Salir",
                                    connect_clicked => AppMsg::Lock,
                                },
                            },

                            gtk::Box {
                                set_orientation: gtk::Orientation::Vertical,
                                set_spacing: 12,
                                add_css_class: "aura-card",

                                gtk::Label {
                                    set_label: "Investiga tu intuición",
                                    add_css_class: "aura-title",
                                },

                                gtk::Label {
                                    set_wrap: true,
                                    #[watch]
                                    set_markup: &consigna_markup(&model.config.accent),
                                },

                                #[name = "steps"]
                                gtk::Box {
                                    set_orientation: gtk::Orientation::Vertical,
                                    set_spacing: 6,
                                },

                                gtk::Label {
                                    set_markup: "Cerrá los ojos, respirá profundo y preguntate:\n<b>¿con qué empiezo hoy?</b>",
                                    set_justify: gtk::Justification::Center,
                                },

                                gtk::Box {
                                    set_orientation: gtk::Orientation::Horizontal,
                                    set_spacing: 8,
                                    set_halign: gtk::Align::Center,

                                    gtk::Button {
                                        set_label: "Geometría",
                                        connect_clicked => AppMsg::OpenSection(Section::Geometry),
                                    },
                                    gtk::Button {
                                        set_label: "Frecuencias",
                                        connect_clicked => AppMsg::OpenSection(Section::Frequencies),
                                    },
                                    gtk::Button {
                                        set_label: "Comandos",
                                        connect_clicked => AppMsg::OpenSection(Section::Commands),
                                    },
                                    gtk::Button {
                                        set_label: "Cristales",
                                        connect_clicked => AppMsg::OpenSection(Section::Crystals),
                                    },
                                    gtk::Button {
                                        set_label: "Rueda de Cristales",
                                        add_css_class: "aura-accent",
                                        connect_clicked => AppMsg::OpenWheel,
                                    },
                                },
                            },

                            #[name = "hub_container"]
                            gtk::Box {
                                set_orientation: gtk::Orientation::Vertical,
                            },
                        },
                    },

                    gtk::Box {
                        set_orientation: gtk::Orientation::Vertical,
                        set_spacing: 10,
                        add_css_class: "aura-card",

                        gtk::Label {
                            set_label: "Contacto",
                            set_xalign: 0.0,
                            add_css_class: "aura-title",
                        },

                        gtk::Box {
                            set_orientation: gtk::Orientation::Horizontal,
                            set_spacing: 8,

                            gtk::Button {
                                set_label: ContactMode::Sesion.label(),
                                add_css_class: "aura-accent",
                                connect_clicked => AppMsg::Prefill(Prefill::new(ContactMode::Sesion, "")),
                            },
                            gtk::Button {
                                set_label: ContactMode::Consulta.label(),
                                connect_clicked => AppMsg::Prefill(Prefill::new(ContactMode::Consulta, "")),
                            },
                        },

                        #[name = "mode_dropdown"]
                        gtk::DropDown::from_strings(&mode_labels) {
                            connect_selected_notify[sender] => move |d| {
                                sender.input(AppMsg::ContactModeSelected(d.selected()));
                            },
                        },

                        gtk::Entry {
                            set_placeholder_text: Some("Nombre completo"),
                            connect_changed[sender] => move |e| {
                                sender.input(AppMsg::ContactName(e.text().to_string()));
                            },
                        },
                        gtk::Label {
                            add_css_class: "aura-error",
                            set_xalign: 0.0,
                            #[watch]
                            set_label: model.contact_errors.name.unwrap_or_default(),
                            #[watch]
                            set_visible: model.contact_errors.name.is_some(),
                        },

                        gtk::Entry {
                            set_placeholder_text: Some("Correo"),
                            set_input_purpose: gtk::InputPurpose::Email,
                            connect_changed[sender] => move |e| {
                                sender.input(AppMsg::ContactEmail(e.text().to_string()));
                            },
                        },
                        gtk::Label {
                            add_css_class: "aura-error",
                            set_xalign: 0.0,
                            #[watch]
                            set_label: model.contact_errors.email.unwrap_or_default(),
                            #[watch]
                            set_visible: model.contact_errors.email.is_some(),
                        },

                        #[name = "message_entry"]
                        gtk::Entry {
                            set_placeholder_text: Some("Mensaje"),
                            connect_changed[sender] => move |e| {
                                sender.input(AppMsg::ContactMessage(e.text().to_string()));
                            },
                            connect_activate => AppMsg::SendContact,
                        },

                        gtk::Button {
                            set_label: "Enviar por WhatsApp",
                            add_css_class: "aura-accent",
                            set_halign: gtk::Align::End,
                            connect_clicked => AppMsg::SendContact,
                        },
                    },
                },
            },
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, link, rx) = init;

        theme::load_css(&config.accent);

        let catalog = catalog::current();
        let query = link.as_ref().map(|l| l.query.as_str());
        let gate = Gate::mount(open_store(), config.pin.clone(), query);
        log::info!(
            "Gate mounted: granted={}, persistent={}",
            gate.is_granted(),
            gate.is_persistent()
        );

        let wheel = WheelModel::builder()
            .launch(WheelInit {
                catalog: catalog.clone(),
                config: config.wheel.clone(),
                accent: config.accent.clone(),
            })
            .detach();
        wheel.widget().set_transient_for(Some(&root));

        let mode_labels: Vec<&str> = ContactMode::iter().map(|m| m.label()).collect();

        let model = AppModel {
            gate,
            hub: HubWidgets::new(&catalog, &sender),
            config,
            catalog,
            sections: AccordionHub::new(),
            open_frequency: ExclusiveOpen::new(),
            open_crystal: ExclusiveOpen::new(),
            player: FrequencyPlayer::new(),
            media: None,
            contact: ContactForm::default(),
            contact_errors: FieldErrors::default(),
            contact_submitted: false,
            pin_input: String::new(),
            visible: true,
            wheel,
            root: root.clone(),
            hub_container: gtk::Box::new(gtk::Orientation::Vertical, 0),
            pin_entry: gtk::Entry::new(),
            message_entry: gtk::Entry::new(),
            mode_dropdown: gtk::DropDown::from_strings(&[]),
        };

        let widgets = view_output!();

        let mut model = model;
        model.hub_container = widgets.hub_container.clone();
        model.pin_entry = widgets.pin_entry.clone();
        model.message_entry = widgets.message_entry.clone();
        model.mode_dropdown = widgets.mode_dropdown.clone();
        model.hub_container.append(&model.hub.root);

        for step in CONSIGNA_STEPS {
            let label = gtk::Label::new(Some(&format!("• {}", step)));
            label.set_wrap(true);
            label.set_xalign(0.0);
            widgets.steps.append(&label);
        }

        if let Some(prefill) = link.as_ref().and_then(|l| l.prefill()) {
            model.apply_prefill(&prefill);
        }

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Show => {
                self.visible = true;
                self.root.present();
            }
            AppMsg::Hide => {
                self.visible = false;
            }
            AppMsg::Lock => {
                self.gate.logout();
                self.wheel.emit(WheelMsg::Close);
                self.stop_media();
                self.player.stop();
                self.sections.close();
                self.pin_entry.set_text("");
                log::info!("Access revoked");
            }
            AppMsg::ConfigReload => {
                match config::load_config() {
                    Ok(new_config) => {
                        self.apply_config(new_config);
                        log::info!("Configuration reloaded");
                    }
                    Err(e) => log::error!("Failed to reload config: {}", e),
                }
                self.catalog = catalog::reload();
                self.wheel.emit(WheelMsg::SetCatalog(self.catalog.clone()));
                self.rebuild_hub(&sender);
            }
            AppMsg::OpenWheel => {
                if self.gate.is_granted() {
                    self.wheel.emit(WheelMsg::Open);
                } else {
                    log::debug!("Wheel requested while locked");
                }
            }
            AppMsg::PinChanged(text) => {
                let clean = sanitize_pin_input(&text);
                if clean != text {
                    self.pin_entry.set_text(&clean);
                }
                self.pin_input = clean;
            }
            AppMsg::SubmitPin => {
                if self.gate.check_access(&self.pin_input) == AccessOutcome::Granted {
                    log::info!("Access granted");
                    self.pin_entry.set_text("");
                }
            }
            AppMsg::ToggleSection(section) => {
                self.sections.toggle(section);
            }
            AppMsg::OpenSection(section) => {
                self.sections.open(section);
            }
            AppMsg::ToggleFrequency(hz) => {
                self.open_frequency.toggle(hz);
            }
            AppMsg::ToggleCrystal(index) => {
                self.open_crystal.toggle(index);
            }
            AppMsg::PlayFrequency(hz) => self.play_frequency(hz, &sender),
            AppMsg::MediaStarted(hz) => self.player.started(hz),
            AppMsg::MediaEnded(hz) => {
                if self.player.is_playing(hz) {
                    self.player.ended();
                    self.media = None;
                }
            }
            AppMsg::MediaFailed(e) => {
                log::warn!("Playback failed: {}", e);
                self.player.failed();
                self.media = None;
            }
            AppMsg::ContactName(name) => {
                self.contact.name = name;
                self.refresh_contact_errors();
            }
            AppMsg::ContactEmail(email) => {
                self.contact.email = email;
                self.refresh_contact_errors();
            }
            AppMsg::ContactMessage(message) => {
                self.contact.message = message;
            }
            AppMsg::ContactModeSelected(index) => {
                if let Some(mode) = ContactMode::iter().nth(index as usize) {
                    self.contact.mode = mode;
                }
            }
            AppMsg::Prefill(prefill) => self.apply_prefill(&prefill),
            AppMsg::SendContact => self.send_contact(),
        }

        self.hub.sync(
            &self.sections,
            &self.open_frequency,
            &self.open_crystal,
            &self.player,
        );
    }
}
