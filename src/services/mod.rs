pub mod catalog_service;
pub mod combo_service;
pub mod organization_service;

pub use catalog_service::{CatalogError, CatalogService};
pub use combo_service::{ComboError, ComboService};
pub use organization_service::{OrganizationError, OrganizationService};
