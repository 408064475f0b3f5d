use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RequestPayload<'a> {
    pub cmd: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<&'a str>,
    #[serde(rename = "maxTimeout", skip_serializing_if = "Option::is_none")]
    pub max_timeout: Option<u64>,
}

impl<'a> RequestPayload<'a> {
    pub fn create_session() -> Self {
        Self {
            cmd: "sessions.create",
            url: None,
            session: None,
            max_timeout: None,
        }
    }

    pub fn destroy_session(session: &'a str) -> Self {
        Self {
            cmd: "sessions.destroy",
            url: None,
            session: Some(session),
            max_timeout: None,
        }
    }

    pub fn get(url: &'a str, session: &'a str, max_timeout_ms: u64) -> Self {
        Self {
            cmd: "request.get",
            url: Some(url),
            session: Some(session),
            max_timeout: Some(max_timeout_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FlareSolverrResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub solution: Option<Solution>,
}

impl FlareSolverrResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Deserialize)]
pub struct Solution {
    pub url: String,
    #[serde(default)]
    pub status: u16,
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_get_serializes_flaresolverr_fields() {
        let payload = RequestPayload::get("https://ssbbilla.site/", "s-1", 60000);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["cmd"], "request.get");
        assert_eq!(json["session"], "s-1");
        assert_eq!(json["maxTimeout"], 60000);
        assert!(serde_json::to_value(RequestPayload::create_session())
            .unwrap()
            .get("url")
            .is_none());
    }

    #[test]
    fn parses_solution_response() {
        let body = r#"{"status":"ok","message":"Challenge not detected!","solution":
            {"url":"https://ssbbilla.site/","status":200,"headers":{},"response":"<html></html>",
             "cookies":[],"userAgent":"Mozilla"},"startTimestamp":1,"endTimestamp":2,"version":"3.3.21"}"#;
        let response: FlareSolverrResponse = serde_json::from_str(body).unwrap();

        assert!(response.is_ok());
        assert_eq!(response.solution.unwrap().response, "<html></html>");
    }
}
