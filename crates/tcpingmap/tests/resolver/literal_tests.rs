//! IP literals never reach the lookup

use tcpingmap::Resolver;

use crate::common::TableResolver;

#[tokio::test]
async fn test_literals_skip_lookup() {
    let resolver = TableResolver::new();

    for literal in ["127.0.0.1", "203.0.113.250", "::1", "2001:db8::42", "fe80::1"] {
        let ip = resolver.resolve(literal).await.unwrap();
        assert_eq!(ip.to_string(), literal);
    }

    assert_eq!(resolver.lookups(), 0);
}

#[tokio::test]
async fn test_names_go_through_lookup() {
    let resolver = TableResolver::new().with_host("v6only.example", &["2001:db8::7"]);

    let ip = resolver.resolve("v6only.example").await.unwrap();

    assert_eq!(ip.to_string(), "2001:db8::7");
    assert_eq!(resolver.lookups(), 1);
}

#[tokio::test]
async fn test_empty_lookup_is_an_error() {
    let resolver = TableResolver::new().with_host("empty.example", &[]);

    assert!(resolver.resolve("empty.example").await.is_err());
}
