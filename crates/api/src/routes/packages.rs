//! Package catalog.

use axum::Json;
use gardens_core::{catalog, PackageInfo};

/// GET /packages
pub async fn packages_handler() -> Json<Vec<PackageInfo>> {
    Json(catalog())
}
