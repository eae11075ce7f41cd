//! 电商平台（Amazon Product Advertising API 5.0）客户端

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};

use super::http::{build_agent, run_blocking, upstream_error};
use super::sigv4::{SigningParams, amz_date, authorization_header};
use crate::config::MarketplaceConfig;
use crate::errors::{DealError, Result};

const PAAPI_URI: &str = "/paapi5/getitems";
const PAAPI_SERVICE: &str = "ProductAdvertisingAPI";
const GET_ITEMS_TARGET: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems";

const GET_ITEMS_RESOURCES: &[&str] = &[
    "Images.Primary.Large",
    "Images.Primary.Medium",
    "Images.Primary.Small",
    "ItemInfo.Title",
    "ItemInfo.Features",
    "Offers.Listings.Price",
    "Offers.Listings.SavingBasis",
    "Offers.Summaries.LowestPrice",
];

/// 平台返回的最新商品信息
#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceProduct {
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub currency: String,
    pub image_url: Option<String>,
    pub product_url: String,
}

#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    fn name(&self) -> &str;

    /// 凭据是否齐全
    fn is_configured(&self) -> bool;

    /// 商品不存在时返回 Ok(None)
    async fn fetch_product(&self, external_id: &str) -> Result<Option<MarketplaceProduct>>;
}

/// 区域对应的 API 主机、签名区域、站点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEndpoint {
    pub host: String,
    pub signing_region: &'static str,
    pub marketplace: &'static str,
    pub currency: &'static str,
    pub site: &'static str,
}

pub fn region_endpoint(region: &str) -> RegionEndpoint {
    match region {
        "in" => RegionEndpoint {
            host: "webservices.amazon.in".to_string(),
            signing_region: "eu-west-1",
            marketplace: "www.amazon.in",
            currency: "INR",
            site: "https://www.amazon.in",
        },
        _ => RegionEndpoint {
            host: "webservices.amazon.com".to_string(),
            signing_region: "us-east-1",
            marketplace: "www.amazon.com",
            currency: "USD",
            site: "https://www.amazon.com",
        },
    }
}

// ---- GetItems 响应（只取用到的字段） ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetItemsResponse {
    #[serde(default)]
    items_result: Option<ItemsResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResult {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    #[serde(rename = "ASIN")]
    asin: String,
    #[serde(rename = "DetailPageURL", default)]
    detail_page_url: Option<String>,
    #[serde(default)]
    item_info: Option<ItemInfo>,
    #[serde(default)]
    images: Option<Images>,
    #[serde(default)]
    offers: Option<Offers>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemInfo {
    #[serde(default)]
    title: Option<DisplayValue<String>>,
    #[serde(default)]
    features: Option<DisplayValues>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DisplayValue<T> {
    display_value: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DisplayValues {
    #[serde(default)]
    display_values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Images {
    #[serde(default)]
    primary: Option<PrimaryImages>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PrimaryImages {
    #[serde(default)]
    large: Option<ImageRef>,
    #[serde(default)]
    medium: Option<ImageRef>,
    #[serde(default)]
    small: Option<ImageRef>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageRef {
    #[serde(rename = "URL")]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Offers {
    #[serde(default)]
    listings: Vec<Listing>,
    #[serde(default)]
    summaries: Vec<Summary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Listing {
    #[serde(default)]
    price: Option<Money>,
    #[serde(default)]
    saving_basis: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Summary {
    #[serde(default)]
    lowest_price: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Money {
    amount: f64,
}

impl Item {
    fn into_product(self, endpoint: &RegionEndpoint) -> MarketplaceProduct {
        let offers = self.offers.unwrap_or_default();
        let listing = offers.listings.into_iter().next().unwrap_or_default();
        let current_price = listing.price.map(|m| m.amount).or_else(|| {
            offers
                .summaries
                .into_iter()
                .find_map(|s| s.lowest_price.map(|m| m.amount))
        });

        let image_url = self.images.and_then(|i| i.primary).and_then(|p| {
            p.large
                .or(p.medium)
                .or(p.small)
                .map(|img| img.url)
        });

        let info = self.item_info.unwrap_or_default();
        let title = info
            .title
            .map(|t| t.display_value)
            .unwrap_or_else(|| "Unknown Product".to_string());
        let description = info
            .features
            .map(|f| f.display_values.join("\n"))
            .filter(|d| !d.is_empty());

        let product_url = self
            .detail_page_url
            .unwrap_or_else(|| format!("{}/dp/{}", endpoint.site, self.asin));

        MarketplaceProduct {
            external_id: self.asin,
            title,
            description,
            current_price,
            original_price: listing.saving_basis.map(|m| m.amount),
            currency: endpoint.currency.to_string(),
            image_url,
            product_url,
        }
    }
}

/// 解析 GetItems 响应，找出指定 ASIN
pub fn parse_get_items(
    body: &str,
    external_id: &str,
    endpoint: &RegionEndpoint,
) -> Result<Option<MarketplaceProduct>> {
    let resp: GetItemsResponse = serde_json::from_str(body)?;
    Ok(resp
        .items_result
        .unwrap_or_default()
        .items
        .into_iter()
        .find(|item| item.asin == external_id)
        .map(|item| item.into_product(endpoint)))
}

/// Amazon PA-API 客户端
pub struct AmazonClient {
    agent: ureq::Agent,
    config: MarketplaceConfig,
    endpoint: RegionEndpoint,
}

impl AmazonClient {
    pub fn new(config: &MarketplaceConfig, timeout: Duration) -> Self {
        let mut endpoint = region_endpoint(&config.region);
        if let Some(host) = config.host.as_ref().filter(|h| !h.is_empty()) {
            endpoint.host = host.clone();
        }
        Self {
            agent: build_agent(timeout),
            config: config.clone(),
            endpoint,
        }
    }

    fn request_body(&self, external_id: &str) -> String {
        json!({
            "ItemIds": [external_id],
            "Resources": GET_ITEMS_RESOURCES,
            "PartnerTag": self.config.associate_tag,
            "PartnerType": "Associates",
            "Marketplace": self.endpoint.marketplace,
        })
        .to_string()
    }
}

#[async_trait]
impl MarketplaceApi for AmazonClient {
    fn name(&self) -> &str {
        "amazon"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn fetch_product(&self, external_id: &str) -> Result<Option<MarketplaceProduct>> {
        if !self.is_configured() {
            return Err(DealError::config("Amazon PA-API credentials not configured"));
        }

        let payload = self.request_body(external_id);
        let now = Utc::now();
        let date = amz_date(&now);
        let content_type = "application/json; charset=utf-8";
        let headers = [
            ("content-encoding", "amz-1.0"),
            ("content-type", content_type),
            ("host", self.endpoint.host.as_str()),
            ("x-amz-date", date.as_str()),
            ("x-amz-target", GET_ITEMS_TARGET),
        ];
        let authorization = authorization_header(&SigningParams {
            access_key: &self.config.access_key,
            secret_key: &self.config.secret_key,
            region: self.endpoint.signing_region,
            service: PAAPI_SERVICE,
            method: "POST",
            uri: PAAPI_URI,
            headers: &headers,
            payload: &payload,
            time: now,
        });

        let url = format!("https://{}{}", self.endpoint.host, PAAPI_URI);
        let agent = self.agent.clone();
        trace!("Amazon GetItems {}", external_id);

        let body = run_blocking("amazon getitems", move || {
            let resp = agent
                .post(&url)
                .header("Content-Encoding", "amz-1.0")
                .header("Content-Type", content_type)
                .header("X-Amz-Date", &date)
                .header("X-Amz-Target", GET_ITEMS_TARGET)
                .header("Authorization", &authorization)
                .send(payload)
                .map_err(|e| upstream_error("Amazon PA-API", e))?;
            resp.into_body()
                .read_to_string()
                .map_err(|e| DealError::upstream(format!("Amazon response read failed: {}", e)))
        })
        .await?;

        let product = parse_get_items(&body, external_id, &self.endpoint)?;
        debug!(
            "Amazon product {} fetched, price: {:?}",
            external_id,
            product.as_ref().and_then(|p| p.current_price)
        );
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "ItemsResult": {
            "Items": [{
                "ASIN": "B0TEST1234",
                "DetailPageURL": "https://www.amazon.in/dp/B0TEST1234?tag=x-21",
                "Images": {"Primary": {"Medium": {"URL": "https://m.media-amazon.com/m.jpg"}}},
                "ItemInfo": {
                    "Title": {"DisplayValue": "Noise Cancelling Headphones"},
                    "Features": {"DisplayValues": ["ANC", "30h battery"]}
                },
                "Offers": {
                    "Listings": [{
                        "Price": {"Amount": 2499.0, "Currency": "INR"},
                        "SavingBasis": {"Amount": 4999.0, "Currency": "INR"}
                    }]
                }
            }]
        }
    }"#;

    #[test]
    fn test_parse_get_items_full_item() {
        let endpoint = region_endpoint("in");
        let product = parse_get_items(SAMPLE, "B0TEST1234", &endpoint)
            .unwrap()
            .unwrap();
        assert_eq!(product.title, "Noise Cancelling Headphones");
        assert_eq!(product.current_price, Some(2499.0));
        assert_eq!(product.original_price, Some(4999.0));
        assert_eq!(product.currency, "INR");
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://m.media-amazon.com/m.jpg")
        );
        assert_eq!(product.description.as_deref(), Some("ANC\n30h battery"));
    }

    #[test]
    fn test_parse_get_items_falls_back_to_lowest_price_and_dp_url() {
        let body = r#"{"ItemsResult": {"Items": [{
            "ASIN": "B0X",
            "Offers": {"Summaries": [{"LowestPrice": {"Amount": 15.5}}]}
        }]}}"#;
        let endpoint = region_endpoint("us");
        let product = parse_get_items(body, "B0X", &endpoint).unwrap().unwrap();
        assert_eq!(product.current_price, Some(15.5));
        assert_eq!(product.product_url, "https://www.amazon.com/dp/B0X");
        assert_eq!(product.title, "Unknown Product");
        assert_eq!(product.currency, "USD");
    }

    #[test]
    fn test_parse_get_items_missing_item() {
        let endpoint = region_endpoint("in");
        assert!(parse_get_items(r#"{"Errors": []}"#, "B0X", &endpoint)
            .unwrap()
            .is_none());
        assert!(parse_get_items(SAMPLE, "OTHER", &endpoint).unwrap().is_none());
    }

    #[test]
    fn test_region_endpoint() {
        assert_eq!(region_endpoint("in").signing_region, "eu-west-1");
        assert_eq!(region_endpoint("us").host, "webservices.amazon.com");
    }
}
