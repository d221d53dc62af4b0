use actix_web::HttpResponse;

use crate::dto::auth::MeResponse;
use crate::middleware::auth::AuthContext;

/// Handler for GET /api/v1/me
///
/// Echoes the authenticated caller: user, active role and all profiles. The
/// middleware has already rejected suspended, locked or deactivated callers.
pub async fn me(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse::from(&*auth))
}
