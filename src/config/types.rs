use serde::Deserialize;

/// Main configuration structure for Stall-Scraper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub site: SiteRules,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(rename = "bind-address")]
    pub bind_address: String,

    /// Static bearer token accepted by the API
    #[serde(rename = "api-token", default)]
    pub api_token: String,
}

/// Listing page fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Listing base path; the page number and a trailing slash are appended
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Total attempts per page, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Attempt `i` times out after `i * timeout_step_secs` seconds
    #[serde(rename = "timeout-step-secs", default = "default_timeout_step_secs")]
    pub timeout_step_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Reconciliation cache sizing
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of product codes tracked
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Seconds an entry stays valid after it was last written
    #[serde(rename = "ttl-secs", default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the append-only product log
    #[serde(rename = "log-path")]
    pub log_path: String,
}

/// What to do with a product card whose locators all fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardErrorPolicy {
    /// Fail the whole page
    #[default]
    Abort,
    /// Log the card and carry on with the rest of the page
    Skip,
}

/// Locator rules describing where products live on a listing page
#[derive(Debug, Clone, Deserialize)]
pub struct SiteRules {
    /// CSS selector of the element holding the product list
    #[serde(default = "default_container")]
    pub container: String,

    /// Path from the container to each product card
    #[serde(rename = "card-path", default = "default_card_path")]
    pub card_path: String,

    #[serde(rename = "on-card-error", default)]
    pub on_card_error: CardErrorPolicy,

    #[serde(default)]
    pub fields: FieldRules,
}

impl Default for SiteRules {
    fn default() -> Self {
        Self {
            container: default_container(),
            card_path: default_card_path(),
            on_card_error: CardErrorPolicy::default(),
            fields: FieldRules::default(),
        }
    }
}

/// Locator chains per field, tried in order relative to a product card
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRules {
    #[serde(default = "default_image_locators")]
    pub image: Vec<String>,

    #[serde(rename = "short-title", default = "default_short_title_locators")]
    pub short_title: Vec<String>,

    #[serde(rename = "product-url", default = "default_product_url_locators")]
    pub product_url: Vec<String>,

    /// Sale, regular and single-amount price markup, in that order
    #[serde(default = "default_price_locators")]
    pub price: Vec<String>,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            image: default_image_locators(),
            short_title: default_short_title_locators(),
            product_url: default_product_url_locators(),
            price: default_price_locators(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_step_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("stall-scraper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

fn default_container() -> String {
    "#mf-shop-content".to_string()
}

fn default_card_path() -> String {
    "ul/li".to_string()
}

fn default_image_locators() -> Vec<String> {
    vec!["div/div[1]/a/img/@data-lazy-src".to_string()]
}

fn default_short_title_locators() -> Vec<String> {
    vec!["div/div[2]/div[1]/h2/a/text()".to_string()]
}

fn default_product_url_locators() -> Vec<String> {
    vec!["div/div[2]/div[1]/h2/a/@href".to_string()]
}

fn default_price_locators() -> Vec<String> {
    vec![
        "div/div[2]/div[2]/span[1]/ins/span/bdi/text()".to_string(),
        "div/div[2]/div[2]/span[1]/span[2]/bdi/text()".to_string(),
        "div/div[2]/div[2]/span/span/bdi/text()".to_string(),
    ]
}
