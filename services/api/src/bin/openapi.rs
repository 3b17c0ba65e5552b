//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3.0 specification for the storefront REST API to a
//! file, so it can be committed or fed to client generators without
//! starting the server.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Output path is the first argument; defaults to the repo convention.
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    std::fs::write(&path, ApiDoc::openapi().to_pretty_json()?)?;
    println!("✅ OpenAPI specification generated at {}", path);
    Ok(())
}
