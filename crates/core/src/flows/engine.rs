use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::access::{AccessEntry, AccessMap};
use crate::flows::session::SessionStore;
use crate::flows::states::{Area, Brand, FlowKind, MenuState, Role, SessionState};
use crate::fuzzy::similarity;
use crate::text::{contains_any, normalize};

pub const OPTION_FUZZY_THRESHOLD: u8 = 88;

const UNIFORM_TRIGGERS: &[&str] = &["uniforme", "vestimenta", "dress code"];
const EXIT_WORDS: &[&str] = &["salir", "cancelar", "terminar", "menu principal"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Brand(Brand),
    Area(Area),
    Role(Role),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuOption {
    pub label: &'static str,
    /// Normalized alternative spellings accepted as exact matches.
    pub aliases: &'static [&'static str],
    pub selection: Selection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Menu {
    pub title: &'static str,
    pub options: &'static [MenuOption],
}

pub const BRAND_MENU: Menu = Menu {
    title: "¿A qué marca perteneces?",
    options: &[
        MenuOption { label: "OLA", aliases: &["ola opticas"], selection: Selection::Brand(Brand::Ola) },
        MenuOption {
            label: "Visión Total",
            aliases: &["vision", "visiontotal"],
            selection: Selection::Brand(Brand::VisionTotal),
        },
        MenuOption { label: "Lumen", aliases: &["lumen opticas"], selection: Selection::Brand(Brand::Lumen) },
    ],
};

pub const AREA_MENU: Menu = Menu {
    title: "¿En qué área trabajas?",
    options: &[
        MenuOption {
            label: "Administrativo",
            aliases: &["administrativos", "administrativa", "administracion", "oficina"],
            selection: Selection::Area(Area::Administrative),
        },
        MenuOption {
            label: "Comercial",
            aliases: &["comerciales", "tienda", "ventas"],
            selection: Selection::Area(Area::Commercial),
        },
    ],
};

pub const ROLE_MENU: Menu = Menu {
    title: "¿Cuál es tu cargo?",
    options: &[
        MenuOption {
            label: "Asesor",
            aliases: &["asesora", "asesores", "asesor de ventas", "vendedor", "vendedora"],
            selection: Selection::Role(Role::Advisor),
        },
        MenuOption {
            label: "Optómetra",
            aliases: &["optometrista", "optometras", "optometria"],
            selection: Selection::Role(Role::Optometrist),
        },
    ],
};

impl Menu {
    pub fn render(&self) -> String {
        let mut lines = vec![self.title.to_string()];
        lines.extend(
            self.options
                .iter()
                .enumerate()
                .map(|(index, option)| format!("{}. {}", index + 1, option.label)),
        );
        lines.join("\n")
    }
}

/// Result of feeding one message to a menu state. Pure data, no I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuTransition {
    pub from: MenuState,
    pub to: MenuState,
    pub selection: Option<Selection>,
    /// Access-map label of the policy reached by this turn, if any.
    pub link_label: Option<&'static str>,
    pub menus: Vec<&'static Menu>,
}

pub trait FlowDefinition {
    fn kind(&self) -> FlowKind;
    fn initial_state(&self) -> MenuState;
    fn is_trigger(&self, normalized: &str) -> bool;
    fn menus_for(&self, state: &MenuState) -> Vec<&'static Menu>;
    fn transition(&self, current: &MenuState, input: &str) -> MenuTransition;
}

#[derive(Clone, Debug, Default)]
pub struct UniformLookupFlow;

impl FlowDefinition for UniformLookupFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::UniformLookup
    }

    fn initial_state(&self) -> MenuState {
        MenuState::Brand
    }

    fn is_trigger(&self, normalized: &str) -> bool {
        contains_any(normalized, UNIFORM_TRIGGERS)
    }

    fn menus_for(&self, state: &MenuState) -> Vec<&'static Menu> {
        match state {
            MenuState::Brand => vec![&BRAND_MENU],
            MenuState::Area { .. } => vec![&AREA_MENU],
            MenuState::Role { .. } => vec![&ROLE_MENU, &AREA_MENU],
        }
    }

    fn transition(&self, current: &MenuState, input: &str) -> MenuTransition {
        transition_uniform(current, input, &self.menus_for(current))
    }
}

fn transition_uniform(current: &MenuState, input: &str, live: &[&'static Menu]) -> MenuTransition {
    let selection = match_option(input, live);

    let (to, link_label, menus): (MenuState, Option<&'static str>, Vec<&'static Menu>) =
        match (current, selection) {
            (MenuState::Brand, Some(Selection::Brand(Brand::Ola))) => {
                (MenuState::Area { brand: Brand::Ola }, None, vec![&AREA_MENU])
            }
            (MenuState::Brand, Some(Selection::Brand(brand))) => {
                (MenuState::Brand, brand.policy_label(), vec![&BRAND_MENU])
            }
            (MenuState::Area { brand }, Some(Selection::Area(Area::Commercial))) => (
                MenuState::Role { brand: *brand, area: Area::Commercial },
                None,
                vec![&ROLE_MENU],
            ),
            (MenuState::Area { .. }, Some(Selection::Area(area))) => {
                (*current, area.policy_label(), vec![&AREA_MENU])
            }
            (MenuState::Role { .. }, Some(Selection::Role(role))) => {
                (*current, Some(role.policy_label()), vec![&ROLE_MENU, &AREA_MENU])
            }
            (MenuState::Role { .. }, Some(Selection::Area(Area::Commercial))) => {
                (*current, None, vec![&ROLE_MENU])
            }
            (MenuState::Role { .. }, Some(Selection::Area(area))) => {
                (*current, area.policy_label(), vec![&ROLE_MENU, &AREA_MENU])
            }
            _ => (*current, None, live.to_vec()),
        };

    MenuTransition { from: *current, to, selection, link_label, menus }
}

/// Maps free text onto one option of the live menus: exact label, alias or
/// 1-based index of the first menu, then fuzzy match.
pub fn match_option(input: &str, menus: &[&'static Menu]) -> Option<Selection> {
    let normalized = normalize(input);
    if normalized.is_empty() {
        return None;
    }

    if let Ok(index) = normalized.parse::<usize>() {
        return menus
            .first()
            .and_then(|menu| index.checked_sub(1).and_then(|slot| menu.options.get(slot)))
            .map(|option| option.selection);
    }

    let options = menus.iter().flat_map(|menu| menu.options.iter()).collect::<Vec<_>>();

    let exact = options.iter().find(|option| {
        normalize(option.label) == normalized || option.aliases.iter().any(|alias| *alias == normalized)
    });
    if let Some(option) = exact {
        return Some(option.selection);
    }

    let mut best: Option<(u8, Selection)> = None;
    for option in &options {
        let score = std::iter::once(normalize(option.label))
            .chain(option.aliases.iter().map(|alias| alias.to_string()))
            .map(|candidate| similarity(&normalized, &candidate))
            .max()
            .unwrap_or(0);
        if score >= OPTION_FUZZY_THRESHOLD && best.map_or(true, |(top, _)| score > top) {
            best = Some((score, option.selection));
        }
    }

    best.map(|(_, selection)| selection)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowReply {
    pub segments: Vec<String>,
    pub link: Option<AccessEntry>,
    pub step: u8,
    pub ended: bool,
}

pub struct FlowEngine<F = UniformLookupFlow> {
    flow: F,
    store: Arc<dyn SessionStore>,
    access: Arc<AccessMap>,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F, store: Arc<dyn SessionStore>, access: Arc<AccessMap>) -> Self {
        Self { flow, store, access }
    }

    pub fn is_trigger(&self, text: &str) -> bool {
        self.flow.is_trigger(&normalize(text))
    }

    /// Starts (or restarts) the flow. Without a session id the first menu is
    /// shown but nothing is remembered.
    pub async fn start(&self, session_id: Option<&str>) -> FlowReply {
        let initial = self.flow.initial_state();

        if let Some(session_id) = session_id {
            self.store.put(SessionState::at(session_id, initial)).await;
            info!(
                event_name = "flow.started",
                session_id = %session_id,
                flow = ?self.flow.kind(),
                "menu flow started"
            );
        }

        let mut segments = vec!["Te ayudo a encontrar tu política de uniformes.".to_string()];
        segments.extend(self.flow.menus_for(&initial).iter().map(|menu| menu.render()));
        FlowReply { segments, link: None, step: initial.step(), ended: false }
    }

    /// Advances an active flow. Returns `None` when the session has none.
    pub async fn step(&self, session_id: &str, text: &str) -> Option<FlowReply> {
        let state = self.store.get(session_id).await?;
        let current = state.menu_state()?;

        if EXIT_WORDS.contains(&normalize(text).as_str()) {
            self.store.remove(session_id).await;
            info!(event_name = "flow.ended", session_id = %session_id, "menu flow ended by user");
            return Some(FlowReply {
                segments: vec![
                    "Listo, salimos del menú de uniformes. ¿En qué más te puedo ayudar?".to_string()
                ],
                link: None,
                step: current.step(),
                ended: true,
            });
        }

        let transition = self.flow.transition(&current, text);
        debug!(
            event_name = "flow.transition_applied",
            session_id = %session_id,
            from = ?transition.from,
            to = ?transition.to,
            selection = ?transition.selection,
            "menu transition applied"
        );

        self.store.put(SessionState::at(session_id, transition.to)).await;

        Some(self.render(&transition))
    }

    pub async fn active_sessions(&self) -> usize {
        self.store.len().await
    }

    pub async fn purge_expired(&self) -> usize {
        self.store.purge_expired().await
    }

    fn render(&self, transition: &MenuTransition) -> FlowReply {
        let mut segments = Vec::new();
        let mut link = None;

        match (transition.selection, transition.link_label) {
            (_, Some(label)) => match self.access.find_by_label(label) {
                Some(entry) => {
                    segments.push(format!("Aquí tienes la {label}."));
                    link = Some(entry.clone());
                }
                None => {
                    warn!(event_name = "flow.link_missing", label = %label, "policy link not in access map");
                    segments.push(format!(
                        "No encontré el enlace de la {label}. Consúltalo con Recursos Humanos."
                    ));
                }
            },
            (Some(_), None) => {}
            (None, None) => segments.push("No reconocí esa opción, elige una del menú.".to_string()),
        }

        segments.extend(transition.menus.iter().map(|menu| menu.render()));
        FlowReply { segments, link, step: transition.to.step(), ended: false }
    }
}
