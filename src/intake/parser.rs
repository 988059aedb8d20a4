use axum::http::HeaderMap;
use bytes::Bytes;

use crate::models::ApplicantFields;
use crate::relay::client::RESUME_PART;

/// An application as received from the intake form.
#[derive(Debug, Default)]
pub struct ParsedApplication {
    pub fields: ApplicantFields,
    pub resume: Option<Upload>,
}

#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub contents: Bytes,
}

/// Parse a request body based on Content-Type header.
pub async fn parse(headers: &HeaderMap, body: Bytes) -> Result<ParsedApplication, String> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/x-www-form-urlencoded");

    if content_type.contains("multipart/form-data") {
        parse_multipart(content_type, body).await
    } else if content_type.contains("application/x-www-form-urlencoded") {
        Ok(parse_form_urlencoded(&body))
    } else {
        Err(format!("Unsupported content type: {content_type}"))
    }
}

fn parse_form_urlencoded(body: &[u8]) -> ParsedApplication {
    let mut parsed = ParsedApplication::default();
    for (k, v) in form_urlencoded::parse(body) {
        if !parsed.fields.set(&k, v.into_owned()) {
            tracing::debug!("Ignoring unknown form field '{k}'");
        }
    }
    parsed
}

/// Parse multipart form data using multer. An empty file input yields no upload.
async fn parse_multipart(content_type: &str, body: Bytes) -> Result<ParsedApplication, String> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|_| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parsed = ParsedApplication::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == RESUME_PART {
            let file_name = field.file_name().unwrap_or("").to_string();
            let contents = field
                .bytes()
                .await
                .map_err(|e| format!("File read error: {e}"))?;
            if !file_name.is_empty() && !contents.is_empty() {
                parsed.resume = Some(Upload {
                    file_name,
                    contents,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        if !parsed.fields.set(&name, value) {
            tracing::debug!("Ignoring unknown form field '{name}'");
        }
    }

    Ok(parsed)
}
