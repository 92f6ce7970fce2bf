//! JSON envelope for `kanban-board` subcommands other than `serve`.

use serde::Serialize;

const API_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    pub api_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            api_version: API_VERSION,
            data: Some(data),
            error: None,
        }
    }
}

impl CliResponse<()> {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            api_version: API_VERSION,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub fn output_success<T: Serialize>(data: T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string(&CliResponse::ok(data))?);
    Ok(())
}

/// Print an error envelope to stderr and exit with status 1.
pub fn output_error(message: &str) -> ! {
    match serde_json::to_string(&CliResponse::failed(message)) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", message),
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelopes_omit_empty_fields() {
        let ok = serde_json::to_value(CliResponse::ok(json!({ "ordering": true }))).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["ordering"], true);
        assert!(ok.get("error").is_none());

        let failed = serde_json::to_value(CliResponse::failed("Failed to load config")).unwrap();
        assert_eq!(failed["success"], false);
        assert_eq!(failed["error"], "Failed to load config");
        assert!(failed.get("data").is_none());
    }
}
