use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};
use bytes::Bytes;
use tracing::warn;

use crate::error::AppError;

/// A file part pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// Text fields and file parts of a multipart form, keyed by field name.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormData {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();
        loop {
            let field = match mp.next_field().await {
                Ok(Some(f)) => f,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "malformed multipart body");
                    return Err(AppError::validation("รูปแบบข้อมูลฟอร์มไม่ถูกต้อง"));
                }
            };
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field.bytes().await.map_err(|e| {
                    warn!(error = %e, field = %name, "failed to read file part");
                    AppError::validation("อ่านไฟล์ที่อัปโหลดไม่สำเร็จ")
                })?;
                // browsers send an empty part when no file was picked
                if !body.is_empty() {
                    form.files.insert(
                        name,
                        Upload {
                            body,
                            content_type,
                            file_name,
                        },
                    );
                }
            } else {
                let text = field.text().await.map_err(|e| {
                    warn!(error = %e, field = %name, "failed to read text part");
                    AppError::validation("รูปแบบข้อมูลฟอร์มไม่ถูกต้อง")
                })?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    /// Trimmed text value, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        non_blank(self.fields.get(name).cloned())
    }

    /// Parsed value of an optional field; present but unparsable is a 400.
    pub fn parsed<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| AppError::validation(format!("ค่า {name} ไม่ถูกต้อง"))),
        }
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }

    #[cfg(test)]
    pub fn with_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mp = Multipart::from_request(req, state).await?;
        Self::from_multipart(mp).await
    }
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
