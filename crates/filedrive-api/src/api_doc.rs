//! OpenAPI documentation, served at `/api/openapi.json` and browsable under `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use filedrive_core::models;

/// Registers the `bearer_auth` scheme referenced by the protected file routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Filedrive API",
        version = "0.1.0",
        description = "Per-user file storage: upload, list, fetch with a time-limited download link, and delete. Files expire after the configured lifetime."
    ),
    paths(
        handlers::auth::authenticate,
        handlers::files::upload_file,
        handlers::files::list_files,
        handlers::files::get_file,
        handlers::files::delete_file,
    ),
    components(
        schemas(
            models::UploadReceipt,
            models::FileSummary,
            models::FileDetail,
            models::FileRecord,
            models::UserIdentity,
            handlers::auth::AuthRequest,
            handlers::files::MessageResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Identity token verification"),
        (name = "files", description = "File upload, listing, download links and deletion")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = get_openapi_spec();
        for path in ["/auth", "/files", "/files/{fileId}"] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ErrorResponse"));
    }
}
