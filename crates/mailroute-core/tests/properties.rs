//! Property tests for alias creation.

#![allow(clippy::unwrap_used)]

use mailroute_core::{Error, MailDb};
use proptest::prelude::*;

fn local_part() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}"
}

fn domain() -> impl Strategy<Value = String> {
    "[a-z]{1,6}\\.(com|org|net)"
}

fn address() -> impl Strategy<Value = String> {
    (local_part(), proptest::option::of("[a-z]{1,4}"), domain()).prop_map(|(local, ext, domain)| {
        match ext {
            Some(ext) => format!("{local}+{ext}@{domain}"),
            None => format!("{local}@{domain}"),
        }
    })
}

fn local_recipient() -> impl Strategy<Value = String> {
    prop_oneof![
        address(),
        local_part(),
        "/var/mail/[a-z]{1,6}",
        "\\| /usr/bin/[a-z]{1,6}",
        ":include:/etc/mail/[a-z]{1,6}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_virtual_alias_round_trip(
        owner_local in local_part(),
        owner_domain in domain(),
        recipients in proptest::collection::vec(address(), 1..5),
    ) {
        let owner = format!("{owner_local}@{owner_domain}");
        let rendered = tokio_test::block_on(async {
            let db = MailDb::in_memory().await.unwrap();
            db.make_alias(&owner, &recipients).await.unwrap();
            let aliases = db.lookup_alias(&owner).await.unwrap();
            aliases.iter().map(ToString::to_string).collect::<Vec<_>>()
        });
        prop_assert_eq!(rendered, vec![format!("{owner} {}", recipients.join(", "))]);
    }

    #[test]
    fn prop_local_alias_round_trip(
        owner in local_part(),
        recipients in proptest::collection::vec(local_recipient(), 1..5),
    ) {
        let rendered = tokio_test::block_on(async {
            let db = MailDb::in_memory().await.unwrap();
            db.make_alias(&owner, &recipients).await.unwrap();
            let aliases = db.lookup_alias(&owner).await.unwrap();
            aliases.iter().map(ToString::to_string).collect::<Vec<_>>()
        });
        prop_assert_eq!(rendered, vec![format!("{owner}: {}", recipients.join(", "))]);
    }

    #[test]
    fn prop_rejected_alias_changes_nothing(
        owner_local in local_part(),
        owner_domain in domain(),
        mut recipients in proptest::collection::vec(address(), 0..4),
        position in 0usize..4,
    ) {
        let owner = format!("{owner_local}@{owner_domain}");
        let position = position.min(recipients.len());
        recipients.insert(position, "/dev/null".to_string());

        let (result, addresses, domains) = tokio_test::block_on(async {
            let db = MailDb::in_memory().await.unwrap();
            db.make_alias("seed@example.com", &["keep@example.com"]).await.unwrap();
            let result = db.make_alias(&owner, &recipients).await;
            (
                result,
                db.count_addresses().await.unwrap(),
                db.count_domains().await.unwrap(),
            )
        });
        prop_assert!(matches!(result, Err(Error::AddrNoAddr)));
        prop_assert_eq!((addresses, domains), (2, 1));
    }
}
