pub mod model;
pub mod view;

use crate::config::WheelConfig;
use crate::gui::theme::ThemeColors;
use aurakit::catalog::Catalog;
use aurakit::rng::Prng;
use aurakit::wheel::Wheel;
use gtk::prelude::*;
use gtk4 as gtk;
use model::WheelView;
use relm4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const RESULT_PROMPT: &str = "Girá la rueda para recibir el cristal que hoy acompaña tu proceso.";

pub struct WheelModel {
    wheel: Rc<RefCell<Wheel<Prng>>>,
    view: Rc<RefCell<WheelView>>,
    colors: Rc<RefCell<ThemeColors>>,
    catalog: Arc<Catalog>,
    visible: bool,
    root: gtk::Window,
    drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum WheelMsg {
    Open,
    Close,
    Spin,
    SpinFinished,
    Resize(i32),
    Configure(WheelConfig, String),
    SetCatalog(Arc<Catalog>),
}

pub struct WheelInit {
    pub catalog: Arc<Catalog>,
    pub config: WheelConfig,
    pub accent: String,
}

impl WheelModel {
    fn is_spinning(&self) -> bool {
        self.wheel.borrow().is_spinning()
    }

    fn result_markup(&self) -> String {
        let result = self
            .wheel
            .borrow()
            .result_index()
            .and_then(|i| self.catalog.crystal(i));

        match result {
            None => format!("<i>{}</i>", glib::markup_escape_text(RESULT_PROMPT)),
            Some(c) => format!(
                "<span size=\"x-large\" weight=\"bold\">{}</span>\n\n\
                 <b>Descripción:</b> {}\n\
                 <b>Cuerpo:</b> {}\n\
                 <b>Beneficios:</b> {}\n\n\
                 <i>{}</i>",
                glib::markup_escape_text(&c.name),
                glib::markup_escape_text(&c.description),
                glib::markup_escape_text(&c.body),
                glib::markup_escape_text(&c.benefits),
                glib::markup_escape_text(&c.message),
            ),
        }
    }

    fn start_frame_clock(&self, sender: ComponentSender<Self>) {
        let view = self.view.clone();
        let area = self.drawing_area.clone();
        glib::timeout_add_local(FRAME_INTERVAL, move || {
            area.queue_draw();
            if view.borrow().is_finished() {
                sender.input(WheelMsg::SpinFinished);
                glib::ControlFlow::Break
            } else {
                glib::ControlFlow::Continue
            }
        });
    }

    fn sync_size(&self) {
        let d = self.view.borrow().diameter;
        self.drawing_area
            .set_content_height((d + view::POINTER_HEIGHT).round() as i32);
        self.drawing_area.queue_draw();
    }
}

#[relm4::component(pub)]
impl SimpleComponent for WheelModel {
    type Init = WheelInit;
    type Input = WheelMsg;
    type Output = ();

    view! {
        #[root]
        gtk::Window {
            set_title: Some("Rueda de Cristales"),
            set_modal: true,
            set_hide_on_close: true,
            set_default_width: 680,
            set_default_height: 920,
            add_css_class: "aura-window",
            #[watch]
            set_visible: model.visible,

            connect_close_request[sender] => move |_| {
                sender.input(WheelMsg::Close);
                glib::Propagation::Stop
            },

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(WheelMsg::Close);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            gtk::ScrolledWindow {
                set_hscrollbar_policy: gtk::PolicyType::Never,

                gtk::Box {
                    set_orientation: gtk::Orientation::Vertical,
                    set_spacing: 20,
                    set_margin_all: 20,

                    gtk::Box {
                        set_orientation: gtk::Orientation::Horizontal,
                        set_spacing: 8,

                        gtk::Label {
                            set_label: "Rueda de Cristales",
                            set_hexpand: true,
                            add_css_class: "aura-title",
                        },

                        gtk::Button {
                            add_css_class: "aura-accent",
                            #[watch]
                            set_label: if model.is_spinning() { "Girando..." } else { "Girar" },
                            #[watch]
                            set_sensitive: !model.is_spinning(),
                            connect_clicked => WheelMsg::Spin,
                        },

                        gtk::Button {
                            set_icon_name: "window-close-symbolic",
                            set_tooltip_text: Some("Cerrar"),
                            connect_clicked => WheelMsg::Close,
                        },
                    },

                    #[name = "drawing_area"]
                    gtk::DrawingArea {
                        set_hexpand: true,
                        set_content_height: 560,

                        connect_resize[sender] => move |_, width, _| {
                            sender.input(WheelMsg::Resize(width));
                        },
                    },

                    gtk::Label {
                        add_css_class: "aura-card",
                        set_wrap: true,
                        set_xalign: 0.0,
                        #[watch]
                        set_markup: &model.result_markup(),
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
        let labels: Vec<String> = init.catalog.crystals.iter().map(|c| c.name.clone()).collect();
        let wheel = Wheel::new(labels.len(), Prng::from_clock())
            .with_turns(init.config.min_turns, init.config.max_turns)
            .with_duration(init.config.duration());

        let model = WheelModel {
            wheel: Rc::new(RefCell::new(wheel)),
            view: Rc::new(RefCell::new(WheelView::new(labels))),
            colors: Rc::new(RefCell::new(ThemeColors::new(
                &root.style_context(),
                &init.accent,
            ))),
            catalog: init.catalog,
            visible: false,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let (wheel_draw, view_draw, colors_draw) =
            (model.wheel.clone(), model.view.clone(), model.colors.clone());
        widgets
            .drawing_area
            .set_draw_func(move |area, cr, width, height| {
                let mut state = view_draw.borrow_mut();
                let rotation = state.current_rotation(&wheel_draw.borrow());
                let scale = area.scale_factor() as f64;
                if let Err(e) = view::draw(
                    cr,
                    &mut state,
                    rotation,
                    (width as f64, height as f64),
                    scale,
                    &colors_draw.borrow(),
                ) {
                    log::error!("Wheel drawing error: {}", e);
                }
            });

        model.sync_size();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            WheelMsg::Open => {
                self.wheel.borrow_mut().reset();
                self.visible = true;
                self.root.present();
                self.drawing_area.queue_draw();
            }
            WheelMsg::Close => {
                self.visible = false;
            }
            WheelMsg::Spin => {
                let plan = self.wheel.borrow_mut().spin();
                if let Some(plan) = plan {
                    self.view.borrow_mut().start(plan);
                    self.start_frame_clock(sender);
                }
            }
            WheelMsg::SpinFinished => {
                self.view.borrow_mut().stop();
                if let Some(i) = self.wheel.borrow_mut().complete() {
                    log::info!(
                        "Wheel settled on {}",
                        self.catalog.crystal(i).map(|c| c.name.as_str()).unwrap_or("?")
                    );
                }
                self.drawing_area.queue_draw();
            }
            WheelMsg::Resize(width) => {
                let viewport = self.root.width().max(width) as f64;
                if self.view.borrow_mut().resize(width as f64, viewport) {
                    self.sync_size();
                }
            }
            WheelMsg::Configure(config, accent) => {
                {
                    let mut wheel = self.wheel.borrow_mut();
                    wheel.set_turns(config.min_turns, config.max_turns);
                    wheel.set_duration(config.duration());
                }
                *self.colors.borrow_mut() = ThemeColors::new(&self.root.style_context(), &accent);
                self.view.borrow_mut().face = None;
                self.drawing_area.queue_draw();
            }
            WheelMsg::SetCatalog(catalog) => {
                let labels: Vec<String> = catalog.crystals.iter().map(|c| c.name.clone()).collect();
                if !self.wheel.borrow_mut().set_count(labels.len()) {
                    log::warn!("Catalog changed during a spin, keeping the current wheel");
                    return;
                }
                self.view.borrow_mut().set_labels(labels);
                self.catalog = catalog;
                self.drawing_area.queue_draw();
            }
        }
    }
}
