//! Identity verification with a local fallback.
//!
//! When the verification service cannot be reached, a best-effort record is derived from the
//! page URL itself and reported as [`IdentityVerification::Degraded`].
use gateway::{Error, Gateway, VerifyIdentityRequest};
use primitives::{
    config::IdentityConfig,
    util::{slug::humanize, tracking::parse_web_url},
    IdentityRecord, IdentityVerification, VerificationSource,
};
use slog::{info, warn, Logger};

/// Path prefixes which are followed by the actual page name
const NAMED_PREFIXES: [&str; 3] = ["pages", "people", "pg"];

/// Verifies the page, settling on `Verified`, `Degraded` or `Failed`.
pub async fn verify<G: Gateway + ?Sized>(
    gateway: &G,
    request: &VerifyIdentityRequest,
    config: &IdentityConfig,
    logger: &Logger,
) -> IdentityVerification {
    match gateway.verify_identity(request).await {
        Ok(record) => {
            info!(logger, "Verified {}", request.url; "module" => "identity", "name" => &record.name);

            IdentityVerification::Verified { record }
        }
        Err(Error::Unreachable(reason)) => match derive_identity(&request.url, config) {
            Some(record) => {
                warn!(logger, "Verification service unreachable, derived the identity from {}", request.url; "module" => "identity", "reason" => reason);

                IdentityVerification::Degraded { record }
            }
            None => IdentityVerification::Failed {
                reason: format!(
                    "Verification service unreachable ({reason}) and no page name in {}",
                    request.url
                ),
            },
        },
        Err(Error::Rejected(reason)) => IdentityVerification::Failed { reason },
    }
}

/// Derives a record from the path of the page URL.
///
/// `facebook.com/ignite-marketing` becomes `Ignite Marketing`, the `pages`, `people` and `pg`
/// prefixes are skipped and `profile.php?id=123` becomes `Page 123`.
/// Returns `None` when the URL has no usable path segment.
pub fn derive_identity(page_url: &str, config: &IdentityConfig) -> Option<IdentityRecord> {
    let url = parse_web_url(page_url)?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();

    let (slug, name) = match segments.as_slice() {
        ["profile.php", ..] => {
            let id = url
                .query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, id)| id.into_owned())
                .filter(|id| !id.is_empty())?;
            let name = format!("Page {id}");

            (id, name)
        }
        [prefix, slug, ..] if NAMED_PREFIXES.contains(prefix) => (slug.to_string(), humanize(slug)),
        [slug, ..] => (slug.to_string(), humanize(slug)),
        [] => return None,
    };

    Some(IdentityRecord {
        name: if name.is_empty() { slug.clone() } else { name },
        page_url: url.to_string(),
        avatar_url: Some(config.avatar_url(&slug)),
        category: None,
        description: None,
        website: None,
        source: VerificationSource::UrlDerived,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::dummy_gateway;
    use gateway::dummy::Call;
    use primitives::{
        config::DEFAULT_CONFIG,
        test_util::{discard_logger, DUMMY_IDENTITY},
    };
    use pretty_assertions::assert_eq;

    fn request(url: &str) -> VerifyIdentityRequest {
        VerifyIdentityRequest {
            url: url.into(),
            context_url: None,
        }
    }

    #[test]
    fn derives_names_from_page_urls() {
        let config = &DEFAULT_CONFIG.identity;
        let name = |url: &str| derive_identity(url, config).map(|record| record.name);

        assert_eq!(
            Some("Ignite Marketing".to_string()),
            name("https://www.facebook.com/ignite-marketing/")
        );
        assert_eq!(
            Some("Joes Pizza".to_string()),
            name("facebook.com/pages/joes_pizza/1234567")
        );
        assert_eq!(
            Some("Page 100064".to_string()),
            name("https://www.facebook.com/profile.php?id=100064")
        );
        // no alphanumerics, the raw slug is still a name
        assert_eq!(Some("--".to_string()), name("https://facebook.com/--"));

        assert_eq!(None, name("https://www.facebook.com/"));
        assert_eq!(None, name("https://www.facebook.com/profile.php"));
        assert_eq!(None, name("not a url at all"));
    }

    #[test]
    fn derived_record_is_marked_as_url_derived() {
        let record = derive_identity("facebook.com/ignitemarketing", &DEFAULT_CONFIG.identity)
            .expect("Should derive");

        assert_eq!(
            IdentityRecord {
                name: "Ignitemarketing".into(),
                page_url: "https://facebook.com/ignitemarketing".into(),
                avatar_url: Some(
                    "https://graph.facebook.com/ignitemarketing/picture?type=large".into()
                ),
                category: None,
                description: None,
                website: None,
                source: VerificationSource::UrlDerived,
            },
            record
        );
    }

    #[tokio::test]
    async fn settles_on_the_remote_record() {
        let gateway = dummy_gateway();

        let verification = verify(
            &gateway,
            &request("https://www.facebook.com/ignitemarketing"),
            &DEFAULT_CONFIG.identity,
            &discard_logger(),
        )
        .await;

        assert_eq!(
            IdentityVerification::Verified {
                record: DUMMY_IDENTITY.clone()
            },
            verification
        );
    }

    #[tokio::test]
    async fn unreachable_service_degrades_to_the_derived_record() {
        let gateway = dummy_gateway();
        gateway.fail(Call::VerifyIdentity, Error::Unreachable("timed out".into()));

        let verification = verify(
            &gateway,
            &request("https://www.facebook.com/ignite-marketing"),
            &DEFAULT_CONFIG.identity,
            &discard_logger(),
        )
        .await;

        match verification {
            IdentityVerification::Degraded { record } => {
                assert_eq!("Ignite Marketing", record.name);
                assert_eq!(VerificationSource::UrlDerived, record.source);
            }
            other => panic!("Expected a degraded verification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_without_page_name_fails() {
        let gateway = dummy_gateway();
        gateway.fail(Call::VerifyIdentity, Error::Unreachable("timed out".into()));

        let verification = verify(
            &gateway,
            &request("https://www.facebook.com/"),
            &DEFAULT_CONFIG.identity,
            &discard_logger(),
        )
        .await;

        assert!(
            matches!(verification, IdentityVerification::Failed { .. }),
            "{verification:?}"
        );
    }

    #[tokio::test]
    async fn rejection_fails_with_the_reason() {
        let gateway = dummy_gateway();
        gateway.fail(Call::VerifyIdentity, Error::Rejected("Page not found".into()));

        let verification = verify(
            &gateway,
            &request("https://www.facebook.com/ignitemarketing"),
            &DEFAULT_CONFIG.identity,
            &discard_logger(),
        )
        .await;

        assert_eq!(
            IdentityVerification::Failed {
                reason: "Page not found".into()
            },
            verification
        );
    }
}
