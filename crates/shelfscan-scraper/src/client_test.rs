use super::*;

const LISTING: &str = "https://shop.example/en/collections/women-handbags";

#[test]
fn extract_store_origin_strips_path() {
    assert_eq!(extract_store_origin(LISTING), "https://shop.example");
}

#[test]
fn extract_store_origin_keeps_port() {
    assert_eq!(
        extract_store_origin("http://127.0.0.1:8080/en/collections/bags"),
        "http://127.0.0.1:8080"
    );
}

#[test]
fn extract_store_origin_trailing_slash() {
    assert_eq!(
        extract_store_origin("https://shop.example/"),
        "https://shop.example"
    );
}

#[test]
fn extract_domain_strips_scheme() {
    assert_eq!(extract_domain(LISTING), "shop.example");
}

#[test]
fn extract_domain_fallback_no_scheme() {
    assert_eq!(extract_domain("shop.example"), "shop.example");
}

#[test]
fn collection_handle_from_listing_url() {
    assert_eq!(collection_handle(LISTING).as_deref(), Some("women-handbags"));
    assert_eq!(
        collection_handle("https://shop.example/collections/bags-2024?page=2").as_deref(),
        Some("bags-2024")
    );
}

#[test]
fn collection_handle_absent_without_collection_path() {
    assert!(collection_handle("https://shop.example/en/search?q=bag").is_none());
}

#[test]
fn locale_prefix_is_path_before_collections() {
    assert_eq!(locale_prefix(LISTING), "/en");
    assert_eq!(locale_prefix("https://shop.example/collections/bags"), "");
    assert_eq!(locale_prefix("https://shop.example/en/pages/about"), "");
    assert_eq!(locale_prefix("not a url"), "");
}

#[test]
fn site_root_joins_origin_and_locale() {
    assert_eq!(site_root(LISTING), "https://shop.example/en");
    assert_eq!(
        site_root("https://shop.example/collections/bags"),
        "https://shop.example"
    );
}

#[test]
fn settings_from_app_config() {
    let config = shelfscan_core::load_app_config_from_env().expect("defaults are valid");
    let settings = HttpSettings::from(&config);
    assert_eq!(settings.accept, config.scraper_accept);
    assert_eq!(
        settings.request_timeout,
        Duration::from_secs(config.scraper_request_timeout_secs)
    );
    assert_eq!(
        settings.graphql_timeout,
        Duration::from_secs(config.scraper_graphql_timeout_secs)
    );
}

#[test]
fn referer_defaults_to_source_url() {
    let config = shelfscan_core::load_app_config_from_env().expect("defaults are valid");
    let mut settings = HttpSettings::from(&config);
    settings.referer = None;
    let client = StorefrontClient::new(settings).expect("client builds");
    assert_eq!(client.referer(LISTING), LISTING);
}
