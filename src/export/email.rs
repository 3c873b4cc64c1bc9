//! Email hand-off payload
//!
//! Built when the finder or the owner asked for a copy. Delivery belongs to
//! another service; this only writes the payload next to the PDF.

use super::OUTPUT_FILE_NAME;
use crate::error::Result;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use funnskjema_common::{EmailWants, FindRecord, FinderInfo, Lang, ObjectInfo, OwnerInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const EMAIL_PAYLOAD_FILE_NAME: &str = "funnskjema-utfylt.email.json";

/// Name and contact details of the finder or the landowner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl From<&FinderInfo> for Contact {
    fn from(finder: &FinderInfo) -> Self {
        Self {
            name: finder.name.clone(),
            address: finder.address.clone(),
            phone: finder.phone.clone(),
            email: finder.email.clone(),
        }
    }
}

impl From<&OwnerInfo> for Contact {
    fn from(owner: &OwnerInfo) -> Self {
        Self {
            name: owner.name.clone(),
            address: owner.address.clone(),
            phone: owner.phone.clone(),
            email: owner.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub lang: Lang,
    pub finder: Contact,
    pub owner: Contact,
    pub object: ObjectInfo,
    pub arealtype: String,
    /// As entered, without unit
    pub depth: String,
    pub location: String,
    pub notes: String,
    pub wants: EmailWants,
    pub pdf_base64: String,
    pub filename: String,
}

impl EmailPayload {
    /// `None` unless at least one copy was requested
    pub fn build(record: &FindRecord, location: &str, pdf: &[u8]) -> Option<Self> {
        if !record.email_wants.any() {
            return None;
        }
        Some(Self {
            lang: record.lang,
            finder: Contact::from(&record.finder),
            owner: Contact::from(&record.owner),
            object: record.object.clone(),
            arealtype: record.arealtype.clone(),
            depth: record.depth.clone(),
            location: location.to_string(),
            notes: record.notes.clone(),
            wants: record.email_wants,
            pdf_base64: B64.encode(pdf),
            filename: OUTPUT_FILE_NAME.to_string(),
        })
    }

    pub fn pdf_bytes(&self) -> Option<Vec<u8>> {
        B64.decode(self.pdf_base64.as_bytes()).ok()
    }

    pub async fn write_to(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(EMAIL_PAYLOAD_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(wants: EmailWants) -> FindRecord {
        let mut record = FindRecord {
            email_wants: wants,
            depth: "15".into(),
            lang: Lang::Es,
            ..Default::default()
        };
        record.owner.name = "Ola".into();
        record.owner.kommune = "Lier".into();
        record.object.kind = "Mynt".into();
        record
    }

    #[test]
    fn test_no_payload_without_wants() {
        assert!(EmailPayload::build(&record(EmailWants::default()), "", b"%PDF").is_none());
    }

    #[test]
    fn test_payload_fields() {
        let wants = EmailWants { finder: false, owner: true };
        let payload = EmailPayload::build(&record(wants), "Lat: 1, Lon: 2", b"%PDF-1.7").unwrap();
        assert_eq!(payload.wants, wants);
        assert_eq!(payload.depth, "15");
        assert_eq!(payload.filename, "funnskjema-utfylt.pdf");
        assert_eq!(payload.pdf_bytes().unwrap(), b"%PDF-1.7");

        let json = serde_json::to_value(&payload).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "arealtype", "depth", "filename", "finder", "lang", "location", "notes",
                "object", "owner", "pdfBase64", "wants"
            ]
        );
        assert_eq!(json["lang"], "es");
        assert_eq!(json["wants"], serde_json::json!({ "finder": false, "owner": true }));
        assert_eq!(
            json["owner"],
            serde_json::json!({ "name": "Ola", "address": "", "phone": "", "email": "" })
        );
        assert_eq!(json["object"]["type"], "Mynt");
    }

    #[tokio::test]
    async fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let wants = EmailWants { finder: true, owner: false };
        let payload = EmailPayload::build(&record(wants), "", b"%PDF").unwrap();
        let path = payload.write_to(dir.path()).await.unwrap();
        assert!(path.ends_with(EMAIL_PAYLOAD_FILE_NAME));

        let read: EmailPayload =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(read, payload);
    }
}
