use std::convert::Infallible;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor that never rejects.
///
/// An empty, unreadable or malformed body yields `T::default()`, leaving it
/// to the handler's validation to answer with a 400.
#[derive(Debug, Clone, Default)]
pub struct LenientJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = match Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(rejection) => {
                tracing::debug!(%rejection, "could not read request body");
                return Ok(Self(T::default()));
            }
        };

        Ok(Self(parse_or_default(&bytes)))
    }
}

/// Task identifier taken from the `:id` path segment.
///
/// An id that cannot be decoded names no stored task, so it is rejected as
/// a JSON 404 instead of axum's plain-text 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TaskId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                tracing::debug!(%rejection, "undecodable task id");
                Err(ApiError::NotFound)
            }
        }
    }
}

/// The first non-empty `search` query parameter, if any. Repeated or
/// unrelated parameters never reject the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for SearchTerm
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = match Query::<Vec<(String, String)>>::from_request_parts(parts, state).await {
            Ok(Query(pairs)) => pairs,
            Err(rejection) => {
                tracing::debug!(%rejection, "ignoring unreadable query string");
                Vec::new()
            }
        };

        Ok(Self(first_search(pairs)))
    }
}

fn first_search(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == "search")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn parse_or_default<T: DeserializeOwned + Default>(bytes: &[u8]) -> T {
    if bytes.is_empty() {
        return T::default();
    }
    serde_json::from_slice(bytes).unwrap_or_else(|error| {
        tracing::debug!(%error, "ignoring malformed JSON body");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use shared::CreateTaskRequest;

    use super::*;

    #[rstest]
    #[case(b"")]
    #[case(b"{not json")]
    #[case(b"[1, 2, 3]")]
    #[case(br#"{"title": 42}"#)]
    fn unusable_bodies_become_default(#[case] body: &[u8]) {
        let request: CreateTaskRequest = parse_or_default(body);
        assert!(request.title.is_none());
        assert!(request.description.is_none());
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[rstest]
    #[case(&[("search", "a"), ("search", "b")], Some("a"))]
    #[case(&[("page", "2"), ("search", "milk")], Some("milk"))]
    #[case(&[("search", "")], None)]
    #[case(&[], None)]
    fn first_search_value_wins(#[case] raw: &[(&str, &str)], #[case] expected: Option<&str>) {
        assert_eq!(first_search(pairs(raw)).as_deref(), expected);
    }

    #[test]
    fn valid_body_is_parsed() {
        let request: CreateTaskRequest =
            parse_or_default(br#"{"title":"A","description":"B"}"#);
        assert_eq!(request.title.as_deref(), Some("A"));
        assert_eq!(request.description.as_deref(), Some("B"));
    }
}
