use crate::constants::{PROPSTREAM_PROPERTY_URL, PROPSTREAM_REFERER, PROPSTREAM_SUGGESTIONS_URL};
use crate::error::Result;
use crate::session::HttpSession;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Property-data lookups with an already issued auth token.
pub struct PropStreamClient<'s> {
    session: &'s HttpSession,
    token: String,
    suggestions_url: String,
    property_url: String,
}

impl<'s> PropStreamClient<'s> {
    pub fn new(session: &'s HttpSession, token: impl Into<String>) -> Self {
        Self {
            session,
            token: token.into(),
            suggestions_url: PROPSTREAM_SUGGESTIONS_URL.to_string(),
            property_url: PROPSTREAM_PROPERTY_URL.to_string(),
        }
    }

    /// Point the client at other suggestion/property endpoints.
    pub fn with_endpoints(mut self, suggestions_url: impl Into<String>, property_url: impl Into<String>) -> Self {
        self.suggestions_url = suggestions_url.into();
        self.property_url = property_url.into();
        self
    }

    /// Full property record for a street address, or `None` unless the
    /// address resolves to exactly one location. A rejected request (any
    /// non-success status) is also `None`.
    #[instrument(skip(self))]
    pub async fn property_value(&self, address: &str) -> Result<Option<Value>> {
        let headers = [("x-auth-token", self.token.as_str()), ("referer", PROPSTREAM_REFERER)];

        let Some(suggestions) = self
            .session
            .get_json(&self.suggestions_url, &[("q", address.to_string())], &headers)
            .await?
        else {
            warn!("Property suggestions were refused for '{}'", address);
            return Ok(None);
        };

        let Some(location) = single_location(&suggestions) else {
            warn!("Address '{}' did not resolve to a single property", address);
            return Ok(None);
        };

        let query = property_query(location);
        let Some(property) = self.session.get_json(&self.property_url, &query, &headers).await? else {
            warn!("Property info is not found for '{}'", address);
            return Ok(None);
        };

        let first = first_property(&property);
        if first.is_some() {
            info!("Found property data for '{}'", address);
        }
        Ok(first)
    }
}

/// The only suggestion, when there is exactly one.
pub fn single_location(suggestions: &Value) -> Option<&Value> {
    match suggestions.as_array()?.as_slice() {
        [only] => Some(only),
        _ => None,
    }
}

/// Query string for the property endpoint, built from a suggestion.
pub fn property_query(location: &Value) -> Vec<(&'static str, String)> {
    let field = |name: &str| match location.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    vec![
        ("id", field("id")),
        ("addressType", field("type")),
        ("streetAddress", field("streetAddress")),
        ("apn", field("apn")),
        ("cityId", field("cityId")),
    ]
}

pub fn first_property(response: &Value) -> Option<Value> {
    response.get("properties")?.as_array()?.first().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned responses, one per connection, then stop.
    async fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_refused_suggestions_are_not_found() {
        let base = serve(vec![("403 Forbidden", r#"{"error":"token expired"}"#)]).await;
        let session = HttpSession::open(&HttpConfig::default()).unwrap();
        let client = PropStreamClient::new(&session, "tok")
            .with_endpoints(format!("{}/suggestions", base), format!("{}/property", base));

        let property = client.property_value("12 Oak St").await.unwrap();
        assert!(property.is_none());
    }

    #[tokio::test]
    async fn test_refused_property_lookup_is_not_found() {
        let base = serve(vec![
            ("200 OK", r#"[{"id": 7, "type": "A", "streetAddress": "12 Oak St"}]"#),
            ("500 Internal Server Error", "{}"),
        ])
        .await;
        let session = HttpSession::open(&HttpConfig::default()).unwrap();
        let client = PropStreamClient::new(&session, "tok")
            .with_endpoints(format!("{}/suggestions", base), format!("{}/property", base));

        assert!(client.property_value("12 Oak St").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_match_returns_first_property() {
        let base = serve(vec![
            ("200 OK", r#"[{"id": 7, "type": "A", "streetAddress": "12 Oak St"}]"#),
            ("200 OK", r#"{"properties": [{"estimatedValue": 215000}]}"#),
        ])
        .await;
        let session = HttpSession::open(&HttpConfig::default()).unwrap();
        let client = PropStreamClient::new(&session, "tok")
            .with_endpoints(format!("{}/suggestions", base), format!("{}/property", base));

        let property = client.property_value("12 Oak St").await.unwrap();
        assert_eq!(property, Some(json!({ "estimatedValue": 215000 })));
    }

    #[test]
    fn test_single_location_requires_exactly_one() {
        let one = json!([{ "id": 1 }]);
        assert_eq!(single_location(&one), Some(&json!({ "id": 1 })));
        assert!(single_location(&json!([])).is_none());
        assert!(single_location(&json!([{ "id": 1 }, { "id": 2 }])).is_none());
        assert!(single_location(&json!({ "id": 1 })).is_none());
    }

    #[test]
    fn test_property_query_fields() {
        let location = json!({
            "id": 3381904,
            "type": "A",
            "streetAddress": "12 Oak St",
            "apn": null,
            "cityId": "4471"
        });
        let query = property_query(&location);
        assert_eq!(
            query,
            vec![
                ("id", "3381904".to_string()),
                ("addressType", "A".to_string()),
                ("streetAddress", "12 Oak St".to_string()),
                ("apn", String::new()),
                ("cityId", "4471".to_string()),
            ]
        );
    }

    #[test]
    fn test_first_property() {
        let response = json!({ "properties": [{ "estimatedValue": 215000 }, { "estimatedValue": 1 }] });
        assert_eq!(first_property(&response), Some(json!({ "estimatedValue": 215000 })));
        assert!(first_property(&json!({ "properties": [] })).is_none());
        assert!(first_property(&json!({})).is_none());
    }
}
