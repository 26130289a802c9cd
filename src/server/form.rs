//! Multipart form collection
//!
//! Form routes read the whole multipart body up front, then pick fields by
//! name. Parts carrying a file name are kept as raw uploads.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::core::error::{Result, TtsError};

/// Uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

/// Collected multipart body
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| TtsError::validation("body", format!("malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| {
                TtsError::validation(name.clone(), format!("cannot read field '{}': {}", name, e))
            })?;

            match filename {
                // Browsers send an empty part when no file was chosen
                Some(f) if f.is_empty() && bytes.is_empty() => {}
                Some(f) => {
                    form.files.insert(name, UploadedFile { filename: Some(f), bytes });
                }
                None => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => {
                        form.fields.insert(name, text);
                    }
                    Err(_) => {
                        form.files.insert(name, UploadedFile { filename: None, bytes });
                    }
                },
            }
        }

        Ok(form)
    }

    /// Text field, if present
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Text field, or `default` when absent
    pub fn text_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.text(name).unwrap_or(default)
    }

    /// Text field that must be present
    pub fn required(&self, name: &str) -> Result<&str> {
        self.text(name)
            .ok_or_else(|| TtsError::validation(name, format!("field '{}' is required", name)))
    }

    /// Present and not blank
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).filter(|v| !v.trim().is_empty())
    }

    /// Boolean field; absent means false
    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.text(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" | "" => Ok(false),
                _ => Err(TtsError::validation(
                    name,
                    format!("field '{}' must be a boolean, got '{}'", name, v),
                )),
            },
        }
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    #[cfg(test)]
    pub(crate) fn with_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accessors() {
        let form = FormData::with_fields(&[("text", "Bonjour"), ("name", "  "), ("x_vector_only", "True")]);

        assert_eq!(form.required("text").unwrap(), "Bonjour");
        assert_eq!(form.text_or("voice", "Serena"), "Serena");
        assert!(form.non_blank("name").is_none());
        assert!(form.flag("x_vector_only").unwrap());
        assert!(!form.flag("missing").unwrap());

        match form.required("reference_text").unwrap_err() {
            TtsError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("reference_text")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_flag_rejected() {
        let form = FormData::with_fields(&[("design", "maybe")]);
        assert!(form.flag("design").is_err());
    }
}
