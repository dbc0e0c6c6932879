//! Closed settings catalog with read-modify-write access.
//!
//! Every tunable of a service lives in one of five remote settings
//! documents. [`SettingKey`] binds each supported key to its document and to
//! the position of its value inside the document JSON; [`get`] and [`set`]
//! apply that binding through a [`SettingsOps`] implementation without
//! inventing any document structure.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::SkerryError;

/// The five remote settings documents of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsDoc {
    /// General service settings.
    Service,
    /// Microsoft account integration settings.
    Live,
    /// Identity-provider settings; the document is an array with one entry
    /// per provider.
    Auth,
    /// Apple push notification settings.
    Apns,
    /// Log settings.
    Log,
}

impl SettingsDoc {
    /// All documents, in the order the config report reads them.
    pub const ALL: [Self; 5] = [Self::Service, Self::Live, Self::Auth, Self::Apns, Self::Log];

    /// Short name used for collector slots and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Live => "live",
            Self::Auth => "auth",
            Self::Apns => "apns",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for SettingsDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a key's value inside its settings document.
#[derive(Debug, Clone, Copy)]
enum Selector {
    /// Top-level field of the document object.
    Field(&'static str),
    /// The document is an array; the value is `field` of the first element
    /// whose `provider` equals the discriminant.
    Provider {
        provider: &'static str,
        field: &'static str,
    },
}

/// A supported service configuration key.
///
/// The set is closed: a string outside it fails at [`SettingKey::from_str`]
/// and never reaches the accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Whether the data API may add columns on insert.
    DynamicSchemaEnabled,
    /// Microsoft account client secret.
    MicrosoftAccountClientSecret,
    /// Microsoft account client identifier.
    MicrosoftAccountClientId,
    /// Microsoft account package security identifier.
    MicrosoftAccountPackageSid,
    /// Facebook application identifier.
    FacebookClientId,
    /// Facebook application secret.
    FacebookClientSecret,
    /// Twitter application identifier.
    TwitterClientId,
    /// Twitter application secret.
    TwitterClientSecret,
    /// Google application identifier.
    GoogleClientId,
    /// Google application secret.
    GoogleClientSecret,
    /// Minimum level captured by the service log.
    LogLevel,
    /// Apple push notification mode.
    ApnsMode,
    /// Apple push notification certificate password.
    ApnsPassword,
    /// Apple push notification certificate.
    ApnsCertificate,
}

impl SettingKey {
    /// All supported keys, in display order.
    pub const ALL: [Self; 14] = [
        Self::DynamicSchemaEnabled,
        Self::MicrosoftAccountClientSecret,
        Self::MicrosoftAccountClientId,
        Self::MicrosoftAccountPackageSid,
        Self::FacebookClientId,
        Self::FacebookClientSecret,
        Self::TwitterClientId,
        Self::TwitterClientSecret,
        Self::GoogleClientId,
        Self::GoogleClientSecret,
        Self::LogLevel,
        Self::ApnsMode,
        Self::ApnsPassword,
        Self::ApnsCertificate,
    ];

    /// The key as operators type it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DynamicSchemaEnabled => "dynamicSchemaEnabled",
            Self::MicrosoftAccountClientSecret => "microsoftAccountClientSecret",
            Self::MicrosoftAccountClientId => "microsoftAccountClientId",
            Self::MicrosoftAccountPackageSid => "microsoftAccountPackageSID",
            Self::FacebookClientId => "facebookClientId",
            Self::FacebookClientSecret => "facebookClientSecret",
            Self::TwitterClientId => "twitterClientId",
            Self::TwitterClientSecret => "twitterClientSecret",
            Self::GoogleClientId => "googleClientId",
            Self::GoogleClientSecret => "googleClientSecret",
            Self::LogLevel => "logLevel",
            Self::ApnsMode => "apnsMode",
            Self::ApnsPassword => "apnsPassword",
            Self::ApnsCertificate => "apnsCertificate",
        }
    }

    /// The document the key's value lives in.
    #[must_use]
    pub const fn doc(self) -> SettingsDoc {
        match self {
            Self::DynamicSchemaEnabled => SettingsDoc::Service,
            Self::MicrosoftAccountClientSecret
            | Self::MicrosoftAccountClientId
            | Self::MicrosoftAccountPackageSid => SettingsDoc::Live,
            Self::FacebookClientId
            | Self::FacebookClientSecret
            | Self::TwitterClientId
            | Self::TwitterClientSecret
            | Self::GoogleClientId
            | Self::GoogleClientSecret => SettingsDoc::Auth,
            Self::LogLevel => SettingsDoc::Log,
            Self::ApnsMode | Self::ApnsPassword | Self::ApnsCertificate => SettingsDoc::Apns,
        }
    }

    const fn selector(self) -> Selector {
        match self {
            Self::DynamicSchemaEnabled => Selector::Field("dynamicSchemaEnabled"),
            Self::MicrosoftAccountClientSecret => Selector::Field("clientSecret"),
            Self::MicrosoftAccountClientId => Selector::Field("clientID"),
            Self::MicrosoftAccountPackageSid => Selector::Field("packageSID"),
            Self::FacebookClientId => Selector::Provider {
                provider: "facebook",
                field: "appId",
            },
            Self::FacebookClientSecret => Selector::Provider {
                provider: "facebook",
                field: "secret",
            },
            Self::TwitterClientId => Selector::Provider {
                provider: "twitter",
                field: "appId",
            },
            Self::TwitterClientSecret => Selector::Provider {
                provider: "twitter",
                field: "secret",
            },
            Self::GoogleClientId => Selector::Provider {
                provider: "google",
                field: "appId",
            },
            Self::GoogleClientSecret => Selector::Provider {
                provider: "google",
                field: "secret",
            },
            Self::LogLevel => Selector::Field("logLevel"),
            Self::ApnsMode => Selector::Field("mode"),
            Self::ApnsPassword => Selector::Field("password"),
            Self::ApnsCertificate => Selector::Field("certificate"),
        }
    }

    /// The key's value inside an already-fetched copy of its document.
    ///
    /// Read half of the accessors, usable when the document arrived some
    /// other way: the config report reads each document once and resolves
    /// every key against the fetched copies.
    #[must_use]
    pub fn value_in<'a>(self, doc: &'a Value) -> Option<&'a Value> {
        select(doc, self.selector())
    }
}

impl FromStr for SettingKey {
    type Err = SkerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SkerryError::UnknownKey { key: s.to_string() })
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote access to settings documents.
///
/// Implemented by the client layer; [`get`] and [`set`] are the only
/// callers. Reads return the parsed document, writes replace it whole.
#[allow(async_fn_in_trait)]
pub trait SettingsOps {
    /// Fetches the current contents of `doc`.
    async fn read_doc(&self, doc: SettingsDoc) -> Result<Value, SkerryError>;

    /// Replaces the contents of `doc` with `body`.
    async fn write_doc(&self, doc: SettingsDoc, body: Value) -> Result<(), SkerryError>;
}

/// Reads the value of `key` from its settings document.
///
/// Returns `Ok(None)` when the document is readable but carries no value
/// for the key. A failed document read propagates unchanged; the two cases
/// never collapse into each other.
pub async fn get(ops: &impl SettingsOps, key: SettingKey) -> Result<Option<Value>, SkerryError> {
    let doc = ops.read_doc(key.doc()).await?;
    Ok(key.value_in(&doc).cloned())
}

/// Writes `value` into the slot of `key` and stores the full document back.
///
/// The current document is read first; a failed read aborts the operation
/// with that same error and nothing is written. A provider-bound key whose
/// provider entry is missing leaves the document unchanged (no entry is
/// invented), but the write still happens.
pub async fn set(
    ops: &impl SettingsOps,
    key: SettingKey,
    value: Value,
) -> Result<(), SkerryError> {
    let mut doc = ops.read_doc(key.doc()).await?;
    apply(&mut doc, key.selector(), value);
    ops.write_doc(key.doc(), doc).await
}

fn select(doc: &Value, selector: Selector) -> Option<&Value> {
    match selector {
        Selector::Field(field) => doc.get(field),
        Selector::Provider { provider, field } => doc
            .as_array()?
            .iter()
            .find(|entry| entry.get("provider").and_then(Value::as_str) == Some(provider))?
            .get(field),
    }
}

fn apply(doc: &mut Value, selector: Selector, value: Value) {
    match selector {
        Selector::Field(field) => {
            if let Some(object) = doc.as_object_mut() {
                object.insert(field.to_string(), value);
            }
        }
        Selector::Provider { provider, field } => {
            let entry = doc.as_array_mut().and_then(|entries| {
                entries
                    .iter_mut()
                    .find(|entry| entry.get("provider").and_then(Value::as_str) == Some(provider))
            });
            if let Some(object) = entry.and_then(Value::as_object_mut) {
                object.insert(field.to_string(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_json::json;
    use tokio::sync::RwLock;

    use super::*;

    /// In-memory settings store recording every write.
    #[derive(Clone)]
    struct FakeSettings {
        docs: Arc<RwLock<HashMap<SettingsDoc, Value>>>,
        writes: Arc<RwLock<Vec<(SettingsDoc, Value)>>>,
        fail_reads: bool,
    }

    impl FakeSettings {
        fn new(docs: Vec<(SettingsDoc, Value)>) -> Self {
            Self {
                docs: Arc::new(RwLock::new(docs.into_iter().collect())),
                writes: Arc::new(RwLock::new(Vec::new())),
                fail_reads: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_reads: true,
                ..Self::new(Vec::new())
            }
        }

        async fn writes(&self) -> Vec<(SettingsDoc, Value)> {
            self.writes.read().await.clone()
        }
    }

    impl SettingsOps for FakeSettings {
        async fn read_doc(&self, doc: SettingsDoc) -> Result<Value, SkerryError> {
            if self.fail_reads {
                return Err(SkerryError::Remote {
                    message: "read refused".to_string(),
                });
            }
            self.docs
                .read()
                .await
                .get(&doc)
                .cloned()
                .ok_or_else(|| SkerryError::Remote {
                    message: format!("no such document: {doc}"),
                })
        }

        async fn write_doc(&self, doc: SettingsDoc, body: Value) -> Result<(), SkerryError> {
            self.writes.write().await.push((doc, body.clone()));
            self.docs.write().await.insert(doc, body);
            Ok(())
        }
    }

    fn auth_doc() -> Value {
        json!([
            { "provider": "facebook", "appId": "fb-app", "secret": "fb-secret" },
            { "provider": "google", "appId": "g-app", "secret": "g-secret" },
        ])
    }

    mod key_tests {
        use test_case::test_case;

        use super::*;

        #[test]
        fn every_key_round_trips_through_from_str() {
            for key in SettingKey::ALL {
                let parsed: SettingKey = key
                    .as_str()
                    .parse()
                    .unwrap_or_else(|_| panic!("{key} should parse"));
                assert_eq!(parsed, key);
            }
        }

        #[test]
        fn key_strings_are_distinct() {
            let mut names: Vec<_> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), SettingKey::ALL.len());
        }

        #[test_case("fooBar" ; "arbitrary")]
        #[test_case("dynamicschemaenabled" ; "wrong case")]
        #[test_case("" ; "empty")]
        fn unknown_keys_fail_at_the_parse_boundary(raw: &str) {
            match raw.parse::<SettingKey>() {
                Err(SkerryError::UnknownKey { key }) => assert_eq!(key, raw),
                other => panic!("expected UnknownKey, got {other:?}"),
            }
        }

        #[test]
        fn value_in_resolves_against_a_fetched_document() {
            let service = json!({ "dynamicSchemaEnabled": true });
            assert_eq!(
                SettingKey::DynamicSchemaEnabled.value_in(&service),
                Some(&json!(true))
            );

            let auth = json!([{ "provider": "twitter", "appId": "t-id" }]);
            assert_eq!(
                SettingKey::TwitterClientId.value_in(&auth),
                Some(&json!("t-id"))
            );
            assert_eq!(SettingKey::TwitterClientSecret.value_in(&auth), None);
            assert_eq!(SettingKey::FacebookClientId.value_in(&auth), None);
        }

        #[test]
        fn auth_keys_share_the_auth_document() {
            for key in [
                SettingKey::FacebookClientId,
                SettingKey::TwitterClientSecret,
                SettingKey::GoogleClientId,
            ] {
                assert_eq!(key.doc(), SettingsDoc::Auth);
            }
        }
    }

    mod get_tests {
        use super::*;

        #[tokio::test]
        async fn reads_a_top_level_field() {
            let fake = FakeSettings::new(vec![(
                SettingsDoc::Service,
                json!({ "dynamicSchemaEnabled": true }),
            )]);
            let value = get(&fake, SettingKey::DynamicSchemaEnabled)
                .await
                .unwrap_or_else(|_| panic!("get should succeed"));
            assert_eq!(value, Some(json!(true)));
        }

        #[tokio::test]
        async fn absent_field_is_none_not_an_error() {
            let fake = FakeSettings::new(vec![(SettingsDoc::Service, json!({}))]);
            let value = get(&fake, SettingKey::DynamicSchemaEnabled)
                .await
                .unwrap_or_else(|_| panic!("get should succeed"));
            assert_eq!(value, None);
        }

        #[tokio::test]
        async fn provider_selector_takes_the_first_match() {
            let fake = FakeSettings::new(vec![(SettingsDoc::Auth, auth_doc())]);
            let value = get(&fake, SettingKey::GoogleClientSecret)
                .await
                .unwrap_or_else(|_| panic!("get should succeed"));
            assert_eq!(value, Some(json!("g-secret")));
        }

        #[tokio::test]
        async fn provider_without_entry_is_none() {
            let fake = FakeSettings::new(vec![(SettingsDoc::Auth, auth_doc())]);
            let value = get(&fake, SettingKey::TwitterClientId)
                .await
                .unwrap_or_else(|_| panic!("get should succeed"));
            assert_eq!(value, None);
        }

        #[tokio::test]
        async fn failed_read_propagates_unchanged() {
            let fake = FakeSettings::failing();
            let result = get(&fake, SettingKey::LogLevel).await;
            match result {
                Err(SkerryError::Remote { message }) => assert_eq!(message, "read refused"),
                other => panic!("expected Remote, got {other:?}"),
            }
        }
    }

    mod set_tests {
        use super::*;

        #[tokio::test]
        async fn rewrites_the_full_document_with_the_new_field() {
            let fake = FakeSettings::new(vec![(
                SettingsDoc::Log,
                json!({ "logLevel": "error", "retentionDays": 30 }),
            )]);
            set(&fake, SettingKey::LogLevel, json!("verbose"))
                .await
                .unwrap_or_else(|_| panic!("set should succeed"));

            let writes = fake.writes().await;
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].0, SettingsDoc::Log);
            assert_eq!(
                writes[0].1,
                json!({ "logLevel": "verbose", "retentionDays": 30 })
            );
        }

        #[tokio::test]
        async fn inserts_a_missing_top_level_field() {
            let fake = FakeSettings::new(vec![(SettingsDoc::Live, json!({}))]);
            set(&fake, SettingKey::MicrosoftAccountClientId, json!("client-1"))
                .await
                .unwrap_or_else(|_| panic!("set should succeed"));

            let value = get(&fake, SettingKey::MicrosoftAccountClientId)
                .await
                .unwrap_or_else(|_| panic!("get should succeed"));
            assert_eq!(value, Some(json!("client-1")));
        }

        #[tokio::test]
        async fn provider_set_touches_only_the_matching_entry() {
            let fake = FakeSettings::new(vec![(SettingsDoc::Auth, auth_doc())]);
            set(&fake, SettingKey::FacebookClientSecret, json!("rotated"))
                .await
                .unwrap_or_else(|_| panic!("set should succeed"));

            let writes = fake.writes().await;
            assert_eq!(writes.len(), 1);
            assert_eq!(
                writes[0].1,
                json!([
                    { "provider": "facebook", "appId": "fb-app", "secret": "rotated" },
                    { "provider": "google", "appId": "g-app", "secret": "g-secret" },
                ])
            );
        }

        #[tokio::test]
        async fn provider_set_without_entry_writes_the_document_unchanged() {
            let fake = FakeSettings::new(vec![(SettingsDoc::Auth, auth_doc())]);
            set(&fake, SettingKey::TwitterClientSecret, json!("ignored"))
                .await
                .unwrap_or_else(|_| panic!("set should succeed"));

            let writes = fake.writes().await;
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].1, auth_doc());
        }

        #[tokio::test]
        async fn failed_read_means_no_write_is_attempted() {
            let fake = FakeSettings::failing();
            let result = set(&fake, SettingKey::ApnsMode, json!("dev")).await;
            assert!(matches!(result, Err(SkerryError::Remote { .. })));
            assert!(fake.writes().await.is_empty());
        }

        #[tokio::test]
        async fn round_trips_through_get() {
            let fake = FakeSettings::new(vec![(SettingsDoc::Apns, json!({ "mode": "none" }))]);
            set(&fake, SettingKey::ApnsMode, json!("dev"))
                .await
                .unwrap_or_else(|_| panic!("set should succeed"));
            let value = get(&fake, SettingKey::ApnsMode)
                .await
                .unwrap_or_else(|_| panic!("get should succeed"));
            assert_eq!(value, Some(json!("dev")));
        }
    }
}
