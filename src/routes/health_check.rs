use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Liveness probe; doesn't touch Kit or the mail API.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
