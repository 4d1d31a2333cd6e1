//! Distrito 0 models
//!
//! Row and form types shared by the backend client adapters and the dashboard
//! service. Field names follow the backend column names.
//!
//! - **user**: profiles and roles
//! - **district**: districts and their isochrone bands
//! - **property**: the property root, its satellite records and summaries
//! - **embedded**: normalization of embedded join results

pub mod district;
pub mod embedded;
pub mod property;
pub mod user;

pub use district::{District, DistrictId, DistrictOption, IsochroneBand, PolygonUrls};
pub use embedded::Embedded;
pub use property::{PropertyId, PropertyRoot, PropertySummary};
pub use user::{Role, UserProfile};
