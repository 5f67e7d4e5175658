//! Resource API: `/api/:resource/:id?`
//!
//! The auth gate runs first (when enabled) and must accept the request before
//! the path is even matched, so unauthenticated callers learn nothing about
//! which resources exist.

use tracing::warn;

use crate::dispatch::ApiRequest;
use crate::envelope::Envelope;
use crate::routes::HttpRequest;
use crate::server::AppState;

/// Split `/api/:resource/:id?` into its segments.
///
/// One trailing slash is tolerated. Empty segments or extra segments do not
/// match.
pub fn parse_api_path(path: &str) -> Option<(&str, Option<&str>)> {
    let rest = path.strip_prefix("/api/")?;
    let rest = rest.strip_suffix('/').unwrap_or(rest);

    let mut segments = rest.split('/');
    let resource = segments.next().filter(|s| !s.is_empty())?;
    let id = match segments.next() {
        None => None,
        Some(id) if !id.is_empty() => Some(id),
        Some(_) => return None,
    };
    if segments.next().is_some() {
        return None;
    }

    Some((resource, id))
}

/// Handle a request under `/api` other than login/register
pub async fn handle_api_request(state: &AppState, req: &HttpRequest) -> Envelope {
    let principal = match &state.gate {
        Some(gate) => match gate.verify(req.authorization.as_deref()) {
            Ok(principal) => Some(principal),
            Err(err) => {
                warn!(method = %req.method, path = %req.path, "Rejected by auth gate: {}", err);
                return err.into();
            }
        },
        None => None,
    };

    let Some((resource, id)) = parse_api_path(&req.path) else {
        return Envelope::route_not_found();
    };

    state
        .dispatcher
        .dispatch(ApiRequest {
            method: &req.method,
            resource,
            id,
            body: &req.body,
            principal: principal.as_ref(),
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_path() {
        assert_eq!(parse_api_path("/api/widgets"), Some(("widgets", None)));
        assert_eq!(parse_api_path("/api/widgets/"), Some(("widgets", None)));
        assert_eq!(
            parse_api_path("/api/widgets/507f1f77bcf86cd799439011"),
            Some(("widgets", Some("507f1f77bcf86cd799439011")))
        );
        assert_eq!(
            parse_api_path("/api/widgets/abc/"),
            Some(("widgets", Some("abc")))
        );
    }

    #[test]
    fn test_parse_api_path_rejects() {
        assert_eq!(parse_api_path("/api"), None);
        assert_eq!(parse_api_path("/api/"), None);
        assert_eq!(parse_api_path("/api//abc"), None);
        assert_eq!(parse_api_path("/api/widgets//"), None);
        assert_eq!(parse_api_path("/api/widgets/abc/def"), None);
        assert_eq!(parse_api_path("/other/widgets"), None);
    }
}
