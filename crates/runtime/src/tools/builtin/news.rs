//! Recent news mentioning a city, from NewsAPI.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{ToolSettings, error_result, get_json};
use crate::normalize::normalize_city;
use crate::tools::{ArgumentError, ParamType, ParameterSpec, Tool, ToolArguments, ToolSpec};

const DEFAULT_PAGE_SIZE: i64 = 5;
const MAX_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    source: Option<RawSource>,
    published_at: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    source: Option<String>,
    published_at: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Self {
            title: raw.title,
            source: raw.source.and_then(|s| s.name),
            published_at: raw.published_at,
            url: raw.url,
            description: raw.description,
        }
    }
}

/// Fetches the newest English articles mentioning a city.
pub struct NewsTool {
    spec: ToolSpec,
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl NewsTool {
    pub fn new(client: reqwest::Client, settings: &ToolSettings) -> Self {
        let spec = ToolSpec::new("get_news_for_city", "Get recent news articles mentioning a city")
            .param(ParameterSpec::required("city", ParamType::String))
            .param(
                ParameterSpec::optional("page_size", ParamType::Integer)
                    .range(1.0, MAX_PAGE_SIZE as f64),
            )
            .presentation_hint("Summarize the news in bullet points with title + source.");

        Self {
            spec,
            client,
            api_key: settings.newsapi_key.clone(),
            base_url: settings.newsapi_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Tool for NewsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<Value, ArgumentError> {
        let city = arguments.get_str("city")?;
        let page_size = arguments
            .get_i64_opt("page_size")?
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let city = match normalize_city(city) {
            Ok(city) => city,
            Err(e) => return Ok(error_result(e)),
        };
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(error_result("Missing NEWSAPI_KEY in environment"));
        };

        let url = format!("{}/v2/everything", self.base_url);
        debug!(%url, %city, page_size, "fetching news");
        let page_size_param = page_size.to_string();
        let request = self.client.get(&url).query(&[
            ("q", city.as_str()),
            ("pageSize", page_size_param.as_str()),
            ("sortBy", "publishedAt"),
            ("language", "en"),
            ("apiKey", api_key),
        ]);

        let data: EverythingResponse = match get_json(request).await {
            Ok(data) => data,
            Err(e) => return Ok(e.into_result()),
        };

        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        let articles: Vec<Article> = data
            .articles
            .into_iter()
            .take(limit)
            .map(Article::from)
            .collect();

        Ok(json!({
            "city": city,
            "count": articles.len(),
            "articles": articles,
        }))
    }
}
