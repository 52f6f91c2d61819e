use super::*;

const BASE: &str = "https://conditofoods.com/shop/";

fn selectors(product: &str, name: &[&str], link: &[&str], image: &[&str]) -> SelectorSet {
    let owned = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
    SelectorSet {
        product: product.to_string(),
        name: owned(name),
        link: owned(link),
        image: owned(image),
    }
}

fn names(products: &[ProductCandidate]) -> Vec<&str> {
    products.iter().map(|p| p.name.as_str()).collect()
}

// -----------------------------------------------------------------------
// containers and names
// -----------------------------------------------------------------------

#[test]
fn extracts_names_links_and_images_in_order() {
    let html = r#"
        <ul>
          <li class="product">
            <a href="/product/tzatziki"><img src="/img/tzatziki.jpg"></a>
            <h2 class="title">Tzatziki 250g</h2>
          </li>
          <li class="product">
            <a href="https://conditofoods.com/product/russian-salad"><img data-src="russian.jpg"></a>
            <h2 class="title">Russian Salad</h2>
          </li>
        </ul>"#;
    let products = extract_products(html, BASE, &selectors("li.product", &["h2.title"], &[], &[]));

    assert_eq!(names(&products), vec!["Tzatziki 250g", "Russian Salad"]);
    assert_eq!(
        products[0].url.as_deref(),
        Some("https://conditofoods.com/product/tzatziki")
    );
    assert_eq!(
        products[0].image_url.as_deref(),
        Some("https://conditofoods.com/img/tzatziki.jpg")
    );
    assert_eq!(
        products[1].image_url.as_deref(),
        Some("https://conditofoods.com/shop/russian.jpg")
    );
    assert!(products.iter().all(|p| p.category.is_none()));
}

#[test]
fn name_selectors_are_tried_in_order_until_one_is_valid() {
    let html = r#"
        <div class="card">
          <span class="badge">NEW</span>
          <h3>Mustard Dijon 370g</h3>
        </div>"#;
    let products = extract_products(
        html,
        BASE,
        &selectors("div.card", &[".badge", "h3"], &[], &[]),
    );
    assert_eq!(names(&products), vec!["Mustard Dijon 370g"]);
}

#[test]
fn falls_back_to_container_text_split_on_separators() {
    let html = r#"<div class="card">Home | Ketchup Classic · 500ml</div>"#;
    let products = extract_products(html, BASE, &selectors("div.card", &["h2"], &[], &[]));
    assert_eq!(names(&products), vec!["Ketchup Classic"]);
}

#[test]
fn text_fallback_window_counts_raw_whitespace() {
    let padding = " ".repeat(160);
    let html = format!(
        r#"<div class="card">Ketchup Classic</div><div class="card">{padding}Mustard Honey</div>"#
    );
    let products = extract_products(&html, BASE, &selectors("div.card", &["h2"], &[], &[]));
    assert_eq!(names(&products), vec!["Ketchup Classic"]);
}

#[test]
fn skips_containers_without_a_valid_name() {
    let html = r#"
        <div class="card"><h2>Contact</h2></div>
        <div class="card"><h2>→ Read more</h2></div>
        <div class="card"><h2>Aioli Garlic Sauce</h2></div>"#;
    let products = extract_products(html, BASE, &selectors("div.card", &["h2"], &[], &[]));
    assert_eq!(names(&products), vec!["Aioli Garlic Sauce"]);
}

#[test]
fn drops_case_insensitive_duplicates() {
    let html = r#"
        <div class="card"><h2>Tzatziki</h2></div>
        <div class="card"><h2>tzatziki</h2></div>
        <div class="card"><h2>Mustard</h2></div>"#;
    let products = extract_products(html, BASE, &selectors("div.card", &["h2"], &[], &[]));
    assert_eq!(names(&products), vec!["Tzatziki", "Mustard"]);
}

#[test]
fn uses_first_matching_fallback_container_selector() {
    let html = r#"
        <article><h2>Ketchup Hot</h2></article>
        <div class="item"><h2>Not Reached</h2></div>"#;
    let products = extract_products(html, BASE, &selectors("li.missing", &["h2"], &[], &[]));
    assert_eq!(names(&products), vec!["Ketchup Hot"]);
}

#[test]
fn attribute_substring_fallback_matches_product_classes() {
    let html = r#"<section class="wc-product-tile"><h4>Honey Mustard</h4></section>"#;
    let products = extract_products(html, BASE, &selectors("li.missing", &["h4"], &[], &[]));
    assert_eq!(names(&products), vec!["Honey Mustard"]);
}

#[test]
fn invalid_brand_selector_uses_fallbacks() {
    let html = r#"<article><h2>Ketchup Hot</h2></article>"#;
    let products = extract_products(html, BASE, &selectors("li[[", &["h2"], &[], &[]));
    assert_eq!(names(&products), vec!["Ketchup Hot"]);
}

#[test]
fn caps_containers_per_page() {
    let html: String = (0..150)
        .map(|i| format!(r#"<div class="card"><h2>Sauce number {i}</h2></div>"#))
        .collect();
    let products = extract_products(&html, BASE, &selectors("div.card", &["h2"], &[], &[]));
    assert_eq!(products.len(), MAX_CONTAINERS);
}

#[test]
fn malformed_or_empty_markup_yields_nothing() {
    let s = selectors("div.card", &["h2"], &[], &[]);
    assert!(extract_products("", BASE, &s).is_empty());
    assert!(extract_products("<<<div class=", BASE, &s).is_empty());
    assert!(extract_products("<p>No products here</p>", BASE, &s).is_empty());
}

// -----------------------------------------------------------------------
// links
// -----------------------------------------------------------------------

#[test]
fn link_selectors_skip_fragment_and_script_links() {
    let html = r##"
        <div class="card">
          <a class="quick" href="#">Quick view</a>
          <a class="js" href="javascript:void(0)">Add</a>
          <a class="more" href="/p/mayo">Details</a>
          <h2>Mayonnaise Light</h2>
        </div>"##;
    let products = extract_products(
        html,
        BASE,
        &selectors("div.card", &["h2"], &["a.quick", "a.js", "a.more"], &[]),
    );
    assert_eq!(
        products[0].url.as_deref(),
        Some("https://conditofoods.com/p/mayo")
    );
}

#[test]
fn link_falls_back_to_first_anchor() {
    let html = r#"
        <div class="card"><a href="mayo.html">x</a><h2>Mayonnaise Light</h2></div>"#;
    let products = extract_products(html, BASE, &selectors("div.card", &["h2"], &["a.none"], &[]));
    assert_eq!(
        products[0].url.as_deref(),
        Some("https://conditofoods.com/shop/mayo.html")
    );
}

#[test]
fn container_without_links_has_no_url() {
    let html = r#"<div class="card"><h2>Mayonnaise Light</h2></div>"#;
    let products = extract_products(html, BASE, &selectors("div.card", &["h2"], &[], &[]));
    assert!(products[0].url.is_none());
    assert!(products[0].image_url.is_none());
}

// -----------------------------------------------------------------------
// images
// -----------------------------------------------------------------------

#[test]
fn image_selectors_read_lazy_load_attributes() {
    let html = r#"
        <div class="card">
          <img class="thumb" data-lazy-src="/img/lazy.webp">
          <h2>Ketchup Squeeze</h2>
        </div>"#;
    let products = extract_products(
        html,
        BASE,
        &selectors("div.card", &["h2"], &[], &["img.thumb"]),
    );
    assert_eq!(
        products[0].image_url.as_deref(),
        Some("https://conditofoods.com/img/lazy.webp")
    );
}

#[test]
fn image_fallback_prefers_src_over_data_src() {
    let html = r#"
        <div class="card">
          <img src="/img/a.png" data-src="/img/b.png">
          <h2>Ketchup Squeeze</h2>
        </div>"#;
    let products = extract_products(html, BASE, &selectors("div.card", &["h2"], &[], &[]));
    assert_eq!(
        products[0].image_url.as_deref(),
        Some("https://conditofoods.com/img/a.png")
    );
}
