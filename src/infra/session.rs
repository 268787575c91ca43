use serde::Deserialize;
use tracing::warn;

use crate::domain::{DraftStore, IdentityProvider, SESSION_USER_KEY};

/// Signed-in user as the login flow stores it. Only the fields needed to
/// identify the owner are read.
#[derive(Debug, Default, Deserialize)]
struct SessionUser {
    #[serde(default, deserialize_with = "string_from_json")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "string_from_json")]
    user_id: Option<String>,
}

/// Sheet-backed user rows may carry phone numbers as JSON numbers.
fn string_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

/// Owner identity read from the local session slot. The owner id is the
/// user's phone number, falling back to the user id.
#[derive(Clone, Debug)]
pub struct StoredSession<S> {
    store: S,
}

impl<S: DraftStore> StoredSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: DraftStore> IdentityProvider for StoredSession<S> {
    fn current_owner_id(&self) -> Option<String> {
        let raw = match self.store.read(SESSION_USER_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("[session] failed to read session: {err}");
                return None;
            }
        };
        let user: SessionUser = match serde_json::from_str(&raw) {
            Ok(user) => user,
            Err(err) => {
                warn!("[session] stored session is unreadable: {err}");
                return None;
            }
        };
        [user.phone, user.user_id]
            .into_iter()
            .flatten()
            .map(|id| id.trim().to_string())
            .find(|id| !id.is_empty())
    }
}
