pub mod engine;
pub mod session;
pub mod states;

pub use engine::{
    match_option, FlowDefinition, FlowEngine, FlowReply, Menu, MenuOption, MenuTransition,
    Selection, UniformLookupFlow, AREA_MENU, BRAND_MENU, ROLE_MENU,
};
pub use session::{InMemorySessionStore, SessionStore};
pub use states::{Area, Brand, FlowKind, MenuState, Role, SessionState};
