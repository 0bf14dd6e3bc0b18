use thiserror::Error;

/// Failures talking to the query service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Http failure response for {url}: {status}")]
    Server {
        url: String,
        status: u16,
        /// Message supplied by the server in the error body, if any
        message: Option<String>,
    },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ServiceError {
    /// Human-readable reason, preferring what the server said over the transport error
    pub fn detail(&self) -> Option<String> {
        let detail = match self {
            ServiceError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            other => other.to_string(),
        };

        let detail = detail.trim();
        if detail.is_empty() {
            None
        } else {
            Some(detail.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins() {
        let err = ServiceError::Server {
            url: "http://localhost:8000/api/chat".to_string(),
            status: 500,
            message: Some("database unavailable".to_string()),
        };
        assert_eq!(err.detail().as_deref(), Some("database unavailable"));
    }

    #[test]
    fn falls_back_to_status_line() {
        let err = ServiceError::Server {
            url: "http://localhost:8000/api/chat".to_string(),
            status: 502,
            message: None,
        };
        let detail = err.detail().unwrap();
        assert!(detail.contains("502"));
        assert!(detail.contains("/api/chat"));
    }

    #[test]
    fn blank_server_message_uses_status_line() {
        let err = ServiceError::Server {
            url: "/api/chat".to_string(),
            status: 500,
            message: Some("   ".to_string()),
        };
        assert!(err.detail().unwrap().contains("500"));
    }

    #[test]
    fn decode_errors_describe_the_body() {
        let err: ServiceError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.detail().unwrap().starts_with("Unexpected response body"));
    }
}
