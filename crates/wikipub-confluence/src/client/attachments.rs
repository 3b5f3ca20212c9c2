//! Attachment operations for Confluence API.

use rand::RngExt;
use serde::Deserialize;
use tracing::info;

use super::{ConfluenceClient, check_status};
use crate::error::ConfluenceError;

/// `child/attachment` listing, reduced to what the upsert needs.
#[derive(Deserialize)]
struct AttachmentList {
    results: Vec<ExistingAttachment>,
}

#[derive(Deserialize)]
struct ExistingAttachment {
    id: String,
    title: String,
}

impl AttachmentList {
    /// Id of the attachment named exactly `filename`.
    fn id_of(self, filename: &str) -> Option<String> {
        self.results
            .into_iter()
            .find(|a| a.title == filename)
            .map(|a| a.id)
    }
}

impl ConfluenceClient {
    /// Upload or update attachment (upsert by filename).
    pub(crate) fn put_attachment(
        &self,
        page_id: &str,
        filename: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), ConfluenceError> {
        let existing = self.list_attachments(page_id, filename)?.id_of(filename);

        let url = if let Some(attachment_id) = &existing {
            info!(
                "Replacing attachment '{}' (id={}) on page {}",
                filename, attachment_id, page_id
            );
            format!(
                "{}/content/{}/child/attachment/{}/data",
                self.api_url(),
                page_id,
                attachment_id
            )
        } else {
            info!(
                "Uploading new attachment '{}' to page {}",
                filename, page_id
            );
            format!("{}/content/{}/child/attachment", self.api_url(), page_id)
        };

        let boundary = format!(
            "----WikipubFormBoundary{:016x}",
            rand::rng().random::<u64>()
        );
        let body = multipart_body(&boundary, filename, content_type, data);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth.header())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Atlassian-Token", "nocheck")
            .header("Accept", "application/json")
            .send(&body[..])?;

        check_status(response)?;
        Ok(())
    }

    /// Attachments on a page matching `filename`.
    fn list_attachments(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<AttachmentList, ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page_id);

        let response = self
            .agent
            .get(&url)
            .query("filename", filename)
            .header("Authorization", &self.auth.header())
            .header("Accept", "application/json")
            .call()?;

        Ok(check_status(response)?.read_json()?)
    }
}

/// Single-file `multipart/form-data` body.
fn multipart_body(boundary: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_attachment_id_by_exact_title() {
        let list: AttachmentList = serde_json::from_str(
            r#"{
                "results": [
                    {"id": "att1", "title": "logo.png.bak", "type": "attachment"},
                    {"id": "att2", "title": "logo.png", "type": "attachment"}
                ],
                "size": 2
            }"#,
        )
        .unwrap();
        assert_eq!(list.id_of("logo.png").as_deref(), Some("att2"));
    }

    #[test]
    fn test_attachment_missing() {
        let list: AttachmentList = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(list.id_of("logo.png"), None);
    }

    #[test]
    fn test_multipart_body() {
        let body = multipart_body("XYZ", "logo.png", "image/png", b"PNG");
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"logo.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNG\r\n\
             --XYZ--\r\n"
        );
    }
}
