use serde::{Deserialize, Serialize};

use crate::codec;

/// The Plex account that is active after switching users.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPlexAccount {
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub friendly_name: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub thumb: String,
    /// Token for acting as this user; treat as a credential.
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub auth_token: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub confirmed: bool,
    #[serde(default)]
    pub anonymous: Option<bool>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub email_only_auth: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub has_password: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub guest: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub home: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub home_admin: bool,
    #[serde(default, with = "codec::string_int")]
    pub home_size: i32,
    #[serde(default, with = "codec::string_int")]
    pub max_home_size: i32,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub protected: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub restricted: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub two_factor_enabled: bool,
    #[serde(default, with = "codec::string_int64")]
    pub joined_at: i64,
    #[serde(default, with = "codec::string_int64")]
    pub remember_expires_at: i64,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub mailing_list_active: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub mailing_list_status: MailingListStatus,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub scrobble_types: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub entitlements: Vec<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub roles: Vec<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub experimental_features: bool,
    #[serde(default)]
    pub subscription_description: Option<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub profile: PlexAccountProfile,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub services: Vec<PlexService>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub subscription: PlexAccountSubscription,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub subscriptions: Vec<PlexAccountSubscription>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailingListStatus {
    Active,
    Unsubscribed,
    Removed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Playback defaults. The subtitle modes are small integers Plex may send as
/// strings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlexAccountProfile {
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub auto_select_audio: bool,
    #[serde(default)]
    pub default_audio_language: Option<String>,
    #[serde(default)]
    pub default_subtitle_language: Option<String>,
    #[serde(default, with = "codec::string_int")]
    pub auto_select_subtitle: i32,
    #[serde(default, with = "codec::string_int")]
    pub default_subtitle_accessibility: i32,
    #[serde(default, with = "codec::string_int")]
    pub default_subtitle_forced: i32,
    #[serde(default, with = "codec::string_int")]
    pub watched_indicator: i32,
    #[serde(default, with = "codec::string_int")]
    pub media_reviews_visibility: i32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlexService {
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub identifier: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub endpoint: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub status: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlexAccountSubscription {
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub active: bool,
    #[serde(default)]
    pub subscribed_at: Option<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub status: String,
    #[serde(default)]
    pub payment_service: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{MailingListStatus, UserPlexAccount};

    #[test]
    fn numeric_fields_accept_strings() {
        let account: UserPlexAccount = serde_json::from_str(
            r#"{
                "id": 7,
                "uuid": "dae343c1f45beb4f",
                "homeSize": "4",
                "maxHomeSize": 15,
                "joinedAt": "1556281940",
                "rememberExpiresAt": "",
                "mailingListStatus": "active",
                "profile": {"autoSelectSubtitle": "1", "defaultSubtitleForced": 0}
            }"#,
        )
        .expect("account decodes");

        assert_eq!(account.id, 7);
        assert_eq!(account.home_size, 4);
        assert_eq!(account.max_home_size, 15);
        assert_eq!(account.joined_at, 1_556_281_940);
        assert_eq!(account.remember_expires_at, 0);
        assert_eq!(account.mailing_list_status, MailingListStatus::Active);
        assert_eq!(account.profile.auto_select_subtitle, 1);
    }

    #[test]
    fn unknown_mailing_list_status_is_tolerated() {
        let account: UserPlexAccount =
            serde_json::from_str(r#"{"id": 1, "mailingListStatus": "pending"}"#)
                .expect("account decodes");
        assert_eq!(account.mailing_list_status, MailingListStatus::Unknown);
    }

    #[test]
    fn null_fields_decode_to_defaults() {
        let account: UserPlexAccount = serde_json::from_str(
            r#"{
                "id": 7,
                "email": null,
                "roles": null,
                "homeAdmin": null,
                "mailingListStatus": null,
                "profile": null,
                "subscription": {"features": null, "active": null}
            }"#,
        )
        .expect("account decodes");

        assert_eq!(account.id, 7);
        assert!(account.email.is_empty() && account.roles.is_empty());
        assert!(!account.home_admin);
        assert_eq!(account.mailing_list_status, MailingListStatus::Unknown);
        assert!(account.subscription.features.is_empty());
    }
}
