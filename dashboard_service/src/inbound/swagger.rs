use crate::{
    domain::{
        map::{
            DistrictTableRow, LatLon, MapView, Marker, MarkerIcon, PolygonOverlay, PolygonStyle,
            TileLayer,
        },
        models::{DistrictFields, NewUser, SessionId},
        view::{
            Action, AdminUsersTab, DashboardTab, PropertiesTab, Screen, Sidebar, ViewState,
        },
    },
    inbound::{
        axum_router::{
            ActionRequest, CreatedProperty, DistrictUpload, LoginRequest, LoginResponse,
            PropertyUpload,
        },
        error_response::ErrorResponse,
    },
};
use models_distrito::{
    District, DistrictOption, IsochroneBand, PolygonUrls, PropertySummary, Role, UserProfile,
    property::{
        BackofficeRecord, CaptacionRecord, CbrRecord, Moneda, NewProperty, NewPropertyRoot,
        PortalRecord, Propietario, SiiRecord, TipoPropiedad,
    },
    user::ProfileFields,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Session
        crate::inbound::axum_router::login_handler,
        crate::inbound::axum_router::logout_handler,
        crate::inbound::axum_router::refresh_handler,
        // Navigation
        crate::inbound::axum_router::view_handler,
        crate::inbound::axum_router::action_handler,
        // Districts
        crate::inbound::axum_router::list_districts_handler,
        crate::inbound::axum_router::district_options_handler,
        crate::inbound::axum_router::create_district_handler,
        crate::inbound::axum_router::update_district_handler,
        crate::inbound::axum_router::delete_district_handler,
        crate::inbound::axum_router::map_handler,
        // Properties
        crate::inbound::axum_router::list_properties_handler,
        crate::inbound::axum_router::create_property_handler,
        // Users
        crate::inbound::axum_router::list_users_handler,
        crate::inbound::axum_router::create_user_handler,
        crate::inbound::axum_router::update_user_handler,
    ),
    components(
        schemas(
            ErrorResponse,
            LoginRequest,
            LoginResponse,
            SessionId,
            ActionRequest,
            Action,
            ViewState,
            Screen,
            Sidebar,
            DashboardTab,
            AdminUsersTab,
            PropertiesTab,
            Role,
            UserProfile,
            ProfileFields,
            NewUser,
            District,
            DistrictOption,
            DistrictFields,
            DistrictUpload,
            IsochroneBand,
            PolygonUrls,
            MapView,
            LatLon,
            TileLayer,
            Marker,
            MarkerIcon,
            PolygonOverlay,
            PolygonStyle,
            DistrictTableRow,
            PropertySummary,
            PropertyUpload,
            CreatedProperty,
            NewProperty,
            NewPropertyRoot,
            SiiRecord,
            CbrRecord,
            Moneda,
            Propietario,
            PortalRecord,
            BackofficeRecord,
            TipoPropiedad,
            CaptacionRecord,
        )
    ),
    tags(
        (name = "dashboard service", description = "Distrito 0 dashboard service")
    )
)]
pub struct ApiDoc;
