//! Print the aggregated OpenAPI document as pretty JSON.

use utoipa::OpenApi;
use votem_back::services::documentation::ApiDoc;

fn main() {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json().unwrap());
}
