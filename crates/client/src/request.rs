//! Pure builders for the fixed set of store API calls.
//!
//! Paths are relative to the configured base host. Builders do no I/O
//! and no network: they only shape the request for the transport.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use serde_json::json;

use relpush_multipart::Part;
use relpush_protocol::Document;

pub const LOGIN_PATH: &str = "/gofer/security/rest/auth/login";
pub const LOGOUT_PATH: &str = "/gofer/security/rest/auth/logout";
pub const LANGUAGES_PATH: &str = "/relution/api/v1/languages";
pub const FILES_PATH: &str = "/relution/api/v1/files";
pub const APPS_PATH: &str = "/relution/api/v1/apps";

/// Body of an [`ApiRequest`].
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<Part>),
}

/// One logical API call, ready for the transport to execute.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, body: RequestBody) -> ApiRequest {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    /// Adds query parameters.
    pub fn with_query(
        mut self,
        pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> ApiRequest {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string()
}

/// `POST /gofer/security/rest/auth/login`
pub fn login(user_name: &str, password: &str) -> ApiRequest {
    ApiRequest::new(
        Method::POST,
        LOGIN_PATH,
        RequestBody::Json(json!({ "userName": user_name, "password": password })),
    )
}

/// `POST /gofer/security/rest/auth/logout`
pub fn logout() -> ApiRequest {
    ApiRequest::new(Method::POST, LOGOUT_PATH, RequestBody::Empty)
}

/// `GET /relution/api/v1/languages`
pub fn languages() -> ApiRequest {
    ApiRequest::new(Method::GET, LANGUAGES_PATH, RequestBody::Empty)
}

/// `POST /relution/api/v1/files`: multipart upload, field `file`.
pub fn upload_files(parts: Vec<Part>) -> ApiRequest {
    ApiRequest::new(Method::POST, FILES_PATH, RequestBody::Multipart(parts))
}

/// `POST /relution/api/v1/apps/fromFile/{assetUuid}`
pub fn app_from_file(asset_uuid: &str) -> ApiRequest {
    ApiRequest::new(
        Method::POST,
        format!("{APPS_PATH}/fromFile/{}", encode_segment(asset_uuid)),
        RequestBody::Empty,
    )
}

/// `POST /relution/api/v1/apps`
pub fn create_app(app: &Document) -> ApiRequest {
    ApiRequest::new(
        Method::POST,
        APPS_PATH,
        RequestBody::Json(app.clone().into()),
    )
}

/// `POST /relution/api/v1/apps/{appUuid}/versions`
pub fn create_version(app_uuid: &str, version: &Document) -> ApiRequest {
    ApiRequest::new(
        Method::POST,
        format!("{APPS_PATH}/{}/versions", encode_segment(app_uuid)),
        RequestBody::Json(version.clone().into()),
    )
}

/// `DELETE /relution/api/v1/apps/{appUuid}/versions/{versionUuid}`
pub fn delete_version(app_uuid: &str, version_uuid: &str) -> ApiRequest {
    ApiRequest::new(
        Method::DELETE,
        format!(
            "{APPS_PATH}/{}/versions/{}",
            encode_segment(app_uuid),
            encode_segment(version_uuid)
        ),
        RequestBody::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_carries_credentials_as_json() {
        let req = login("jane", "secret");
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, LOGIN_PATH);
        match &req.body {
            RequestBody::Json(v) => {
                assert_eq!(v["userName"], "jane");
                assert_eq!(v["password"], "secret");
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let req = app_from_file("ab/&?cd");
        assert_eq!(req.path, "/relution/api/v1/apps/fromFile/ab%2F%26%3Fcd");

        let req = delete_version("app-1", "ver 2");
        assert_eq!(req.path, "/relution/api/v1/apps/app%2D1/versions/ver%202");
    }

    #[test]
    fn query_pairs_accumulate() {
        let req = upload_files(Vec::new())
            .with_query([("releaseStatus", "RELEASE")])
            .with_query([("environmentUuid", "env-1")]);
        assert_eq!(req.query.len(), 2);
        assert_eq!(req.query[0].0, "releaseStatus");
        assert_eq!(req.query[1].1, "env-1");
    }

    #[test]
    fn version_calls_use_nested_paths() {
        let req = create_version("a1", &Document::new());
        assert_eq!(req.path, "/relution/api/v1/apps/a1/versions");
        assert_eq!(req.method, Method::POST);

        let req = delete_version("a1", "v1");
        assert_eq!(req.path, "/relution/api/v1/apps/a1/versions/v1");
        assert_eq!(req.method, Method::DELETE);
    }
}
