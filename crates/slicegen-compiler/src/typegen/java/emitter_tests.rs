use indoc::indoc;

use crate::diagnostics::DiagnosticKind;
use crate::test_utils::{SHOP_MODEL, file, generate_json, indented, paths};
use crate::{Config, Error};

#[test]
fn one_file_per_generated_type() {
    let generation = generate_json(SHOP_MODEL, &Config::new());

    assert!(generation.diagnostics.is_empty(), "{}", generation.diagnostics.render());
    assert_eq!(
        paths(&generation),
        [
            "com/acme/Shop/_Marker.java",
            "com/acme/Shop/Item.java",
            "com/acme/Shop/Status.java",
            "com/acme/Shop/ItemSeqHelper.java",
            "com/acme/Shop/NamesHelper.java",
            "com/acme/Shop/PricesHelper.java",
            "com/acme/Shop/Note.java",
            "com/acme/Shop/Cart.java",
            "com/acme/Shop/_CartDisp.java",
            "com/acme/Shop/CartPrx.java",
            "com/acme/Shop/_CartPrxI.java",
            "com/acme/com/zeroc/IceCompactId/TypeId_3.java",
            "com/acme/Shop/NotFound.java",
            "com/acme/Shop/Catalog.java",
            "com/acme/Shop/CatalogPrx.java",
            "com/acme/Shop/_CatalogPrxI.java",
            "com/acme/Shop/Admin.java",
            "com/acme/Shop/AdminPrx.java",
            "com/acme/Shop/_AdminPrxI.java",
            "com/acme/Shop/Limit.java",
        ]
    );
}

#[test]
fn files_start_with_banner_and_package() {
    let generation = generate_json(SHOP_MODEL, &Config::new());
    let item = file(&generation, "com/acme/Shop/Item.java");

    assert!(item.starts_with(indoc! {"
        //
        // Generated by slicegen from file `Shop.ice'
        //
        // Warning: do not edit this file.
        //

        package com.acme.Shop;

        public class Item implements java.lang.Cloneable, java.io.Serializable
    "}));
}

#[test]
fn marker_only_for_prefixed_top_level_module() {
    let generation = generate_json(SHOP_MODEL, &Config::new());
    assert!(file(&generation, "com/acme/Shop/_Marker.java").ends_with("interface _Marker\n{\n}\n"));

    let bare = indoc! {r#"
        {"files": [{"name": "Bare.ice", "modules": [{"name": "Bare", "definitions": [
          {"kind": "struct", "name": "P", "members": [{"name": "x", "type": "int"}]}
        ]}]}]}
    "#};
    let generation = generate_json(bare, &Config::new());
    assert_eq!(paths(&generation), ["Bare/P.java"]);
}

#[test]
fn compact_id_class() {
    let generation = generate_json(SHOP_MODEL, &Config::new());
    let type_id = file(&generation, "com/acme/com/zeroc/IceCompactId/TypeId_3.java");

    assert!(type_id.contains("package com.acme.com.zeroc.IceCompactId;"));
    assert!(type_id.contains(indoc! {r#"
        public class TypeId_3
        {
            public final static String typeId = "::Shop::Cart";
        }
    "#}));
}

#[test]
fn skeletons_on_request() {
    let generation = generate_json(SHOP_MODEL, &Config::new());
    assert!(!paths(&generation).contains(&"com/acme/Shop/CatalogI.java"));

    let generation = generate_json(SHOP_MODEL, &Config::new().generate_impl(true));
    let catalog = file(&generation, "com/acme/Shop/CatalogI.java");
    assert!(catalog.contains("public final class CatalogI implements Catalog"));
    assert!(paths(&generation).contains(&"com/acme/Shop/CartI.java"));
    assert!(paths(&generation).contains(&"com/acme/Shop/AdminI.java"));
}

#[test]
fn skeleton_placeholders() {
    let generation = generate_json(SHOP_MODEL, &Config::new().generate_impl(true));
    let catalog = file(&generation, "com/acme/Shop/CatalogI.java");

    assert!(catalog.contains(&indented(indoc! {"
        @Override
        public Item find(String id, com.zeroc.Ice.Current current) throws NotFound
        {
            Item r = null;
            return r;
        }
    "})));
    assert!(catalog.contains(&indented(indoc! {"
        @Override
        public Catalog.ListResult list(com.zeroc.Ice.Current current)
        {
            Catalog.ListResult r = new Catalog.ListResult();
            r.returnValue = 0;
            r.items = null;
            r.more = false;
            return r;
        }
    "})));
    assert!(catalog.contains(&indented(indoc! {"
        @Override
        public java.util.concurrent.CompletionStage<Status> refreshAsync(com.zeroc.Ice.Current current)
        {
            Status r = Status.open;
            return java.util.concurrent.CompletableFuture.completedFuture(r);
        }
    "})));
    assert!(catalog.contains(
        "Catalog.SnapshotMarshaledResult r = new Catalog.SnapshotMarshaledResult(null, 0, current);"
    ));
}

#[test]
fn checksum_class() {
    let json = SHOP_MODEL.replacen(
        "\"files\"",
        "\"checksums\": {\"::Shop::Item\": \"cafe0001\"}, \"files\"",
        1,
    );
    let config = Config::new().checksum_class("com.acme.ShopChecksums");
    let generation = generate_json(&json, &config);
    let checksums = file(&generation, "com/acme/ShopChecksums.java");

    assert!(checksums.contains("public class ShopChecksums"));
    assert!(checksums.contains("map.put(\"::Shop::Item\", \"cafe0001\");"));
    assert!(checksums.contains("checksums = java.util.Collections.unmodifiableMap(map);"));
    assert!(!checksums.contains("::Shop::Limit"));
    let admin = checksums.find("\"::Shop::Admin\"").unwrap();
    let status = checksums.find("\"::Shop::Status\"").unwrap();
    assert!(admin < status);
}

#[test]
fn errors_discard_the_source_file() {
    let json = indoc! {r#"
        {"files": [{"name": "Bad.ice", "modules": [{"name": "Bad", "definitions": [
          {"kind": "class", "name": "Thing", "line": 2,
           "members": [{"name": "name", "type": "string", "metadata": ["java:getset"], "line": 3}],
           "operations": [{"name": "getName", "line": 4, "returns": {"type": "string"}}]}
        ]}]}]}
    "#};
    let generation = generate_json(json, &Config::new());

    assert!(generation.files.is_empty());
    assert_eq!(generation.diagnostics.error_count(), 1);
    let diagnostic = generation.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind(), DiagnosticKind::AccessorConflict);
    assert_eq!(
        diagnostic.to_string(),
        "error: Bad.ice:3: operation `getName' conflicts with method for data member (related: operation declared here at Bad.ice:4)"
    );

    let Err(Error::Generation(diagnostics)) = generation.into_result() else {
        panic!("expected generation error");
    };
    assert_eq!(
        Error::Generation(diagnostics).to_string(),
        "generation failed with 1 errors"
    );
}

#[test]
fn invalid_metadata_is_a_warning() {
    let json = indoc! {r#"
        {"files": [{"name": "Meta.ice", "modules": [{"name": "Meta", "definitions": [
          {"kind": "struct", "name": "P", "line": 2, "metadata": ["java:bogus"],
           "members": [{"name": "x", "type": "int"}]}
        ]}]}]}
    "#};
    let generation = generate_json(json, &Config::new());

    assert_eq!(generation.diagnostics.warning_count(), 1);
    assert_eq!(
        generation.diagnostics.iter().next().unwrap().message(),
        "ignoring invalid metadata `java:bogus'"
    );
    assert_eq!(generation.into_result().unwrap().len(), 1);
}

#[test]
fn generated_file_listing_omits_contents() {
    let generation = generate_json(SHOP_MODEL, &Config::new());
    let item = generation
        .files
        .iter()
        .find(|f| f.path.ends_with("Item.java"))
        .unwrap();

    assert_eq!(
        serde_json::to_string(item).unwrap(),
        r#"{"source":"Shop.ice","path":"com/acme/Shop/Item.java"}"#
    );
}
