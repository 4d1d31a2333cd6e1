//! Navigation between the dashboard screens and the pure render over
//! `(state, profile, data)`.

use models_distrito::{District, DistrictOption, PropertySummary, Role, UserProfile};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

/// The screen a session is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewState {
    Login,
    #[default]
    Dashboard,
    AdminUsers,
    Properties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    OpenAdminUsers,
    OpenProperties,
    BackToDashboard,
    Logout,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::OpenAdminUsers => "👥 Administrar Usuarios",
            Action::OpenProperties => "🏠 Propiedades",
            Action::BackToDashboard => "← Volver al Dashboard",
            Action::Logout => "Cerrar Sesión",
        }
    }
}

/// Next state after `action`. Opening user administration without the super
/// admin role leaves the state unchanged; nothing but a fresh login leaves
/// [ViewState::Login].
pub fn transition(state: ViewState, role: Role, action: Action) -> ViewState {
    match (state, action) {
        (_, Action::Logout) => ViewState::Login,
        (ViewState::Login, _) => ViewState::Login,
        (_, Action::OpenAdminUsers) if role.is_super_admin() => ViewState::AdminUsers,
        (state, Action::OpenAdminUsers) => state,
        (_, Action::OpenProperties) => ViewState::Properties,
        (_, Action::BackToDashboard) => ViewState::Dashboard,
    }
}

/// Actions the sidebar offers on `state`
pub fn available_actions(state: ViewState, role: Role) -> Vec<Action> {
    match state {
        ViewState::Login => vec![],
        ViewState::Dashboard => {
            let mut actions = vec![];
            if role.is_super_admin() {
                actions.push(Action::OpenAdminUsers);
            }
            actions.push(Action::OpenProperties);
            actions.push(Action::Logout);
            actions
        }
        ViewState::AdminUsers | ViewState::Properties => {
            vec![Action::BackToDashboard, Action::Logout]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTab {
    Visualizar,
    Crear,
    Editar,
}

impl DashboardTab {
    pub fn label(&self) -> &'static str {
        match self {
            DashboardTab::Visualizar => "🗺️ Visualizar",
            DashboardTab::Crear => "➕ Crear",
            DashboardTab::Editar => "✏️ Editar",
        }
    }

    pub fn for_role(role: Role) -> Vec<DashboardTab> {
        let mut tabs = vec![DashboardTab::Visualizar];
        if role.is_super_admin() {
            tabs.push(DashboardTab::Crear);
        }
        if role.can_edit_districts() {
            tabs.push(DashboardTab::Editar);
        }
        tabs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminUsersTab {
    CrearUsuario,
    EditarUsuarios,
}

impl AdminUsersTab {
    pub fn label(&self) -> &'static str {
        match self {
            AdminUsersTab::CrearUsuario => "➕ Crear Usuario",
            AdminUsersTab::EditarUsuarios => "✏️ Editar Usuarios",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropertiesTab {
    Listado,
    Nueva,
}

impl PropertiesTab {
    pub fn label(&self) -> &'static str {
        match self {
            PropertiesTab::Listado => "📋 Listado de Propiedades",
            PropertiesTab::Nueva => "🏠 Nueva Propiedad",
        }
    }

    pub fn for_role(role: Role) -> Vec<PropertiesTab> {
        let mut tabs = vec![PropertiesTab::Listado];
        if role.can_create_properties() {
            tabs.push(PropertiesTab::Nueva);
        }
        tabs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Sidebar {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub badge: String,
    pub actions: Vec<Action>,
}

impl Sidebar {
    fn new(profile: &UserProfile, state: ViewState) -> Self {
        let full_name = if profile.full_name.trim().is_empty() {
            "Usuario".to_string()
        } else {
            profile.full_name.clone()
        };
        Sidebar {
            full_name,
            email: profile.email.clone(),
            role: profile.role,
            badge: profile.role.badge().to_string(),
            actions: available_actions(state, profile.role),
        }
    }
}

/// What the client should show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Login,
    Dashboard {
        sidebar: Sidebar,
        tabs: Vec<DashboardTab>,
        districts: Vec<District>,
    },
    AdminUsers {
        sidebar: Sidebar,
        tabs: Vec<AdminUsersTab>,
        district_options: Vec<DistrictOption>,
        users: Vec<UserProfile>,
    },
    Properties {
        sidebar: Sidebar,
        tabs: Vec<PropertiesTab>,
        district_options: Vec<DistrictOption>,
        properties: Vec<PropertySummary>,
    },
    Unauthorized {
        message: String,
    },
}

/// Data loaded for the current state. Fields a state does not use stay empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewData {
    /// Visible districts
    pub districts: Vec<District>,
    pub district_options: Vec<DistrictOption>,
    pub users: Vec<UserProfile>,
    pub properties: Vec<PropertySummary>,
}

/// Renders `state` for `profile`. Never touches the backend.
pub fn render(state: ViewState, profile: &UserProfile, data: ViewData) -> Screen {
    match state {
        ViewState::Login => Screen::Login,
        ViewState::Dashboard => Screen::Dashboard {
            sidebar: Sidebar::new(profile, state),
            tabs: DashboardTab::for_role(profile.role),
            districts: data.districts,
        },
        ViewState::AdminUsers if !profile.role.is_super_admin() => Screen::Unauthorized {
            message: "Acceso no autorizado.".to_string(),
        },
        ViewState::AdminUsers => Screen::AdminUsers {
            sidebar: Sidebar::new(profile, state),
            tabs: vec![AdminUsersTab::CrearUsuario, AdminUsersTab::EditarUsuarios],
            district_options: data.district_options,
            users: data.users,
        },
        ViewState::Properties => Screen::Properties {
            sidebar: Sidebar::new(profile, state),
            tabs: PropertiesTab::for_role(profile.role),
            district_options: data.district_options,
            properties: data.properties,
        },
    }
}
