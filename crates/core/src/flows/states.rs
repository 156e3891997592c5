use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    None,
    UniformLookup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brand {
    Ola,
    VisionTotal,
    Lumen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Area {
    Administrative,
    Commercial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Advisor,
    Optometrist,
}

/// Position inside the uniform lookup menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuState {
    Brand,
    Area { brand: Brand },
    Role { brand: Brand, area: Area },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub flow: FlowKind,
    pub step: u8,
    pub brand: Option<Brand>,
    pub area: Option<Area>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// OLA has no brand-wide policy; it is split by area and role.
    pub fn policy_label(&self) -> Option<&'static str> {
        match self {
            Self::Ola => None,
            Self::VisionTotal => Some("Política de uniformes - Visión Total"),
            Self::Lumen => Some("Política de uniformes - Lumen"),
        }
    }
}

impl Area {
    pub fn policy_label(&self) -> Option<&'static str> {
        match self {
            Self::Administrative => Some("Política de uniformes - Administrativos"),
            Self::Commercial => None,
        }
    }
}

impl Role {
    pub fn policy_label(&self) -> &'static str {
        match self {
            Self::Advisor => "Política de uniformes - Asesores",
            Self::Optometrist => "Política de uniformes - Optómetras",
        }
    }
}

impl MenuState {
    pub fn step(&self) -> u8 {
        match self {
            Self::Brand => 1,
            Self::Area { .. } => 2,
            Self::Role { .. } => 3,
        }
    }

    pub fn brand(&self) -> Option<Brand> {
        match self {
            Self::Brand => None,
            Self::Area { brand } | Self::Role { brand, .. } => Some(*brand),
        }
    }

    pub fn area(&self) -> Option<Area> {
        match self {
            Self::Role { area, .. } => Some(*area),
            Self::Brand | Self::Area { .. } => None,
        }
    }
}

impl SessionState {
    pub fn uniform_lookup(session_id: impl Into<String>) -> Self {
        Self::at(session_id, MenuState::Brand)
    }

    pub fn at(session_id: impl Into<String>, menu: MenuState) -> Self {
        Self {
            session_id: session_id.into(),
            flow: FlowKind::UniformLookup,
            step: menu.step(),
            brand: menu.brand(),
            area: menu.area(),
            updated_at: Utc::now(),
        }
    }

    /// Menu position for an active uniform lookup, `None` when no flow runs or
    /// the stored fields are inconsistent.
    pub fn menu_state(&self) -> Option<MenuState> {
        if self.flow != FlowKind::UniformLookup {
            return None;
        }
        match (self.step, self.brand, self.area) {
            (1, _, _) => Some(MenuState::Brand),
            (2, Some(brand), _) => Some(MenuState::Area { brand }),
            (3, Some(brand), Some(area)) => Some(MenuState::Role { brand, area }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Area, Brand, FlowKind, MenuState, SessionState};

    #[test]
    fn session_state_round_trips_menu_position() {
        let menu = MenuState::Role { brand: Brand::Ola, area: Area::Commercial };
        let state = SessionState::at("s-1", menu);

        assert_eq!(state.step, 3);
        assert_eq!(state.brand, Some(Brand::Ola));
        assert_eq!(state.area, Some(Area::Commercial));
        assert_eq!(state.menu_state(), Some(menu));
    }

    #[test]
    fn inactive_or_inconsistent_state_has_no_menu() {
        let mut state = SessionState::uniform_lookup("s-2");
        state.flow = FlowKind::None;
        assert_eq!(state.menu_state(), None);

        let mut state = SessionState::uniform_lookup("s-3");
        state.step = 3;
        assert_eq!(state.menu_state(), None);
    }
}
