//! Currency conversion using the Frankfurter API.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{FetchError, ToolSettings, error_result, get_json};
use crate::normalize::normalize_currency;
use crate::tools::{ArgumentError, ParamType, ParameterSpec, Tool, ToolArguments, ToolSpec};

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Converts an amount between two currencies at the latest rate.
///
/// # Parameters
///
/// - `amount` (required): amount in the base currency
/// - `base` (required): source currency code, e.g. "INR"
/// - `target` (required): target currency code, e.g. "USD"
pub struct CurrencyTool {
    spec: ToolSpec,
    client: reqwest::Client,
    base_url: String,
}

impl CurrencyTool {
    pub fn new(client: reqwest::Client, settings: &ToolSettings) -> Self {
        let spec = ToolSpec::new(
            "convert_currency",
            "Convert amount from base currency to target currency using the latest exchange rates",
        )
        .param(ParameterSpec::required("amount", ParamType::Number))
        .param(ParameterSpec::required("base", ParamType::String))
        .param(ParameterSpec::required("target", ParamType::String));

        Self {
            spec,
            client,
            base_url: settings.frankfurter_url.trim_end_matches('/').to_string(),
        }
    }

    async fn convert(&self, amount: f64, base: &str, target: &str) -> Result<f64, FetchError> {
        let url = format!("{}/latest", self.base_url);
        debug!(%url, amount, base, target, "fetching exchange rate");

        let request = self.client.get(&url).query(&[
            ("amount", amount.to_string()),
            ("from", base.to_string()),
            ("to", target.to_string()),
        ]);
        let data: LatestResponse = get_json(request).await?;

        data.rates
            .get(target)
            .copied()
            .ok_or_else(|| FetchError::Data(format!("no rate returned for {target}")))
    }
}

#[async_trait]
impl Tool for CurrencyTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<Value, ArgumentError> {
        let amount = arguments.get_f64("amount")?;
        let base = arguments.get_str("base")?;
        let target = arguments.get_str("target")?;

        let (base, target) = match (normalize_currency(base), normalize_currency(target)) {
            (Ok(base), Ok(target)) => (base, target),
            (Err(e), _) | (_, Err(e)) => return Ok(error_result(e)),
        };

        let converted = match self.convert(amount, &base, &target).await {
            Ok(converted) => converted,
            Err(FetchError::Http(e)) => {
                return Ok(error_result(format!("Currency request failed: {e}")));
            }
            Err(e) => return Ok(e.into_result()),
        };
        let rate = (amount != 0.0).then(|| converted / amount);

        Ok(json!({
            "amount": amount,
            "base": base,
            "target": target,
            "converted": converted,
            "rate": rate,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;

    fn tool(base_url: &str) -> CurrencyTool {
        let settings = ToolSettings {
            frankfurter_url: base_url.to_string(),
            ..ToolSettings::default()
        };
        CurrencyTool::new(settings.http_client().unwrap(), &settings)
    }

    fn arguments(value: Value) -> ToolArguments {
        ToolArguments::from(value.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn converts_with_normalized_codes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/latest")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("amount".into(), "500".into()),
                Matcher::UrlEncoded("from".into(), "INR".into()),
                Matcher::UrlEncoded("to".into(), "USD".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"amount":500.0,"base":"INR","date":"2026-02-19","rates":{"USD":6.0}}"#)
            .create_async()
            .await;

        let result = tool(&server.url())
            .execute(&arguments(json!({"amount": 500, "base": "inr", "target": " usd "})))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["base"], "INR");
        assert_eq!(result["target"], "USD");
        assert_eq!(result["converted"], 6.0);
        assert_eq!(result["rate"], 0.012);
    }

    #[tokio::test]
    async fn provider_error_becomes_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/latest")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"not found"}"#)
            .create_async()
            .await;

        let result = tool(&server.url())
            .execute(&arguments(json!({"amount": 1, "base": "EUR", "target": "XYZ"})))
            .await
            .unwrap();

        assert_eq!(result, json!({"error": {"message": "not found"}}));
    }

    #[tokio::test]
    async fn zero_amount_has_no_rate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/latest")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"rates":{"USD":0.0}}"#)
            .create_async()
            .await;

        let result = tool(&server.url())
            .execute(&arguments(json!({"amount": 0, "base": "EUR", "target": "USD"})))
            .await
            .unwrap();

        assert!(result["rate"].is_null());
    }

    #[tokio::test]
    async fn empty_code_is_reported_inside_the_result() {
        let result = tool("http://127.0.0.1:9")
            .execute(&arguments(json!({"amount": 5, "base": "", "target": "USD"})))
            .await
            .unwrap();

        assert_eq!(result, json!({"error": "currency cannot be empty"}));
    }

    #[tokio::test]
    async fn missing_amount_is_an_argument_error() {
        let err = tool("http://127.0.0.1:9")
            .execute(&arguments(json!({"base": "EUR", "target": "USD"})))
            .await
            .unwrap_err();

        assert_eq!(err, ArgumentError::Missing("amount".into()));
    }

    #[tokio::test]
    async fn unreachable_provider_is_reported_as_data() {
        let result = tool("http://127.0.0.1:9")
            .execute(&arguments(json!({"amount": 5, "base": "EUR", "target": "USD"})))
            .await
            .unwrap();

        let error = result["error"].as_str().unwrap();
        assert!(error.starts_with("Currency request failed: "), "{error}");
    }

    #[tokio::test]
    async fn provider_timeout_is_reported_as_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/latest")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_secs(3));
                w.write_all(br#"{"rates":{"USD":1.1}}"#)
            })
            .create_async()
            .await;

        let settings = ToolSettings {
            frankfurter_url: server.url(),
            timeout_secs: 1,
            ..ToolSettings::default()
        };
        let result = CurrencyTool::new(settings.http_client().unwrap(), &settings)
            .execute(&arguments(json!({"amount": 1, "base": "EUR", "target": "USD"})))
            .await
            .unwrap();

        let error = result["error"].as_str().unwrap();
        assert!(error.starts_with("Currency request failed: "), "{error}");
    }
}
