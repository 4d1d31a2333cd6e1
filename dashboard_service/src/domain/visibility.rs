//! Which districts a profile may see.

use models_distrito::{District, DistrictOption, UserProfile};

use crate::domain::models::DistrictScope;

/// Super admins see every district, everybody else exactly the districts they
/// are assigned to. An empty assignment sees nothing.
pub fn visible_districts(profile: &UserProfile, all: Vec<District>) -> Vec<District> {
    if profile.role.sees_all_districts() {
        return all;
    }
    all.into_iter()
        .filter(|district| profile.is_assigned_to(district.id))
        .collect()
}

pub fn district_options(districts: &[District]) -> Vec<DistrictOption> {
    districts
        .iter()
        .map(|d| DistrictOption {
            id: d.id,
            nombre: d.nombre.clone(),
        })
        .collect()
}

/// Scope of the property listing
pub fn property_scope(profile: &UserProfile, visible: &[District]) -> DistrictScope {
    if profile.role.sees_all_districts() {
        DistrictScope::All
    } else {
        DistrictScope::Only(visible.iter().map(|d| d.id).collect())
    }
}
