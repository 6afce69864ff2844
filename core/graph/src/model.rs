//! Wire models for the Microsoft Graph payloads.
//!
//! Only the fields the application needs are modeled; anything the API
//! may omit is optional here and defaulted in one place during the
//! conversion to the domain types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use inboxdrive_common::{ItemId, MimeCategory, Result};

use crate::service::{ListingItem, MessageSummary, Profile, StorageQuota};

/// Collection envelope wrapping Graph list responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ListPayload<T> {
    pub(crate) value: Vec<T>,
}

/// Response from `GET /me`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfilePayload {
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) mail: Option<String>,
    #[serde(default)]
    pub(crate) user_principal_name: Option<String>,
}

impl ProfilePayload {
    pub(crate) fn into_profile(self) -> Profile {
        Profile {
            name: self.display_name.unwrap_or_default(),
            // Accounts without a mailbox only carry the principal name
            email: self.mail.or(self.user_principal_name).unwrap_or_default(),
        }
    }
}

/// A drive item as returned by the children and upload endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveItemPayload {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) folder: Option<FolderFacet>,
    #[serde(default)]
    pub(crate) file: Option<FileFacet>,
    #[serde(default, rename = "@microsoft.graph.downloadUrl")]
    pub(crate) download_url: Option<String>,
}

/// Present on folder items; its contents are not used.
#[derive(Debug, Deserialize)]
pub(crate) struct FolderFacet {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileFacet {
    #[serde(default)]
    pub(crate) mime_type: Option<String>,
}

impl DriveItemPayload {
    pub(crate) fn into_item(self) -> Result<ListingItem> {
        let category = if self.folder.is_some() {
            MimeCategory::Folder
        } else {
            MimeCategory::from_mime(self.file.as_ref().and_then(|f| f.mime_type.as_deref()))
        };

        Ok(ListingItem {
            id: ItemId::new(self.id)?,
            name: self.name,
            category,
            download_url: self.download_url,
        })
    }
}

/// Response from `GET /me/drive`, reduced to the quota facet.
#[derive(Debug, Deserialize)]
pub(crate) struct DrivePayload {
    pub(crate) quota: QuotaPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuotaPayload {
    #[serde(default)]
    pub(crate) used: u64,
    #[serde(default)]
    pub(crate) total: u64,
}

impl QuotaPayload {
    pub(crate) fn into_quota(self) -> StorageQuota {
        StorageQuota {
            used: self.used,
            total: self.total,
        }
    }
}

/// A message as returned by `GET /me/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessagePayload {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) from: Option<RecipientPayload>,
    pub(crate) received_date_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecipientPayload {
    #[serde(default)]
    pub(crate) email_address: Option<EmailAddressPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmailAddressPayload {
    #[serde(default)]
    pub(crate) address: Option<String>,
}

impl MessagePayload {
    pub(crate) fn into_summary(self) -> MessageSummary {
        let sender = self
            .from
            .and_then(|f| f.email_address)
            .and_then(|a| a.address);

        MessageSummary {
            id: self.id,
            subject: self.subject,
            sender,
            received_at: self.received_date_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_item_deserialization() {
        let json = r#"{
            "id": "01FOLDER",
            "name": "Documents",
            "folder": { "childCount": 4 }
        }"#;

        let payload: DriveItemPayload = serde_json::from_str(json).unwrap();
        let item = payload.into_item().unwrap();

        assert_eq!(item.name, "Documents");
        assert!(item.is_folder());
        assert!(item.download_url.is_none());
    }

    #[test]
    fn test_file_item_deserialization() {
        let json = r#"{
            "id": "01FILE",
            "name": "holiday.png",
            "file": { "mimeType": "image/png" },
            "@microsoft.graph.downloadUrl": "https://example.com/dl/holiday.png"
        }"#;

        let payload: DriveItemPayload = serde_json::from_str(json).unwrap();
        let item = payload.into_item().unwrap();

        assert_eq!(item.category, MimeCategory::Image);
        assert_eq!(
            item.download_url.as_deref(),
            Some("https://example.com/dl/holiday.png")
        );
    }

    #[test]
    fn test_file_without_mime_type_is_other() {
        let json = r#"{ "id": "01FILE", "name": "blob", "file": {} }"#;

        let payload: DriveItemPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.into_item().unwrap().category, MimeCategory::Other);
    }

    #[test]
    fn test_profile_email_fallback() {
        let json = r#"{ "displayName": "Ada", "userPrincipalName": "ada@contoso.com" }"#;

        let payload: ProfilePayload = serde_json::from_str(json).unwrap();
        let profile = payload.into_profile();

        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.email, "ada@contoso.com");
    }

    #[test]
    fn test_profile_prefers_mail_over_principal_name() {
        let json = r#"{
            "displayName": "Ada",
            "mail": "ada@mail.contoso.com",
            "userPrincipalName": "ada@contoso.com"
        }"#;

        let payload: ProfilePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.into_profile().email, "ada@mail.contoso.com");
    }

    #[test]
    fn test_quota_defaults_to_zero() {
        let json = r#"{ "quota": {} }"#;

        let payload: DrivePayload = serde_json::from_str(json).unwrap();
        let quota = payload.quota.into_quota();

        assert_eq!(quota.used, 0);
        assert_eq!(quota.total, 0);
    }

    #[test]
    fn test_message_with_missing_optionals() {
        let json = r#"{ "id": "MSG1", "receivedDateTime": "2024-05-01T09:30:00Z" }"#;

        let payload: MessagePayload = serde_json::from_str(json).unwrap();
        let summary = payload.into_summary();

        assert_eq!(summary.id, "MSG1");
        assert!(summary.subject.is_none());
        assert!(summary.sender.is_none());
    }

    #[test]
    fn test_message_sender_extraction() {
        let json = r#"{
            "id": "MSG2",
            "subject": "Weekly report",
            "from": { "emailAddress": { "address": "boss@contoso.com" } },
            "receivedDateTime": "2024-05-01T09:30:00Z"
        }"#;

        let payload: MessagePayload = serde_json::from_str(json).unwrap();
        let summary = payload.into_summary();

        assert_eq!(summary.subject.as_deref(), Some("Weekly report"));
        assert_eq!(summary.sender.as_deref(), Some("boss@contoso.com"));
    }

    #[test]
    fn test_list_envelope() {
        let json = r#"{ "value": [ { "id": "01A", "name": "a" }, { "id": "01B", "name": "b" } ] }"#;

        let payload: ListPayload<DriveItemPayload> = serde_json::from_str(json).unwrap();
        assert_eq!(payload.value.len(), 2);
    }
}
