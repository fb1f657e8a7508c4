use crate::ApiError;

pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_BATCH_SIZE: usize = 20;
pub const MAX_TARGET_LANGUAGES: usize = 5;
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Language codes the backend accepts, with display names.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("de", "German"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
];

/// An image queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    fn extension(&self) -> Option<String> {
        let (_, ext) = self.filename.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        }
    }
}

/// Optional knobs sent along with a batch or single translation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslateOptions {
    pub source_language: Option<String>,
    pub exclude_text: Option<String>,
    pub webhook_url: Option<String>,
}

pub fn language_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
}

pub fn validate_file(file: &UploadFile) -> Result<(), ApiError> {
    let allowed = file
        .extension()
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    if !allowed {
        return Err(ApiError::Validation(format!(
            "{}: invalid file type",
            file.filename
        )));
    }
    if file.data.len() > MAX_FILE_SIZE_BYTES {
        return Err(ApiError::Validation(format!("{}: file too large", file.filename)));
    }
    Ok(())
}

fn validate_language(code: &str) -> Result<(), ApiError> {
    match language_name(code) {
        Some(_) => Ok(()),
        None => Err(ApiError::Validation(format!("unsupported language: {code}"))),
    }
}

pub fn validate_batch(files: &[UploadFile], target_languages: &[String]) -> Result<(), ApiError> {
    if files.is_empty() {
        return Err(ApiError::Validation("Please select at least one image".into()));
    }
    if files.len() > MAX_BATCH_SIZE {
        return Err(ApiError::Validation(format!(
            "Maximum {MAX_BATCH_SIZE} images per batch"
        )));
    }
    if target_languages.is_empty() {
        return Err(ApiError::Validation(
            "Please select at least one target language".into(),
        ));
    }
    if target_languages.len() > MAX_TARGET_LANGUAGES {
        return Err(ApiError::Validation(format!(
            "Maximum {MAX_TARGET_LANGUAGES} target languages allowed"
        )));
    }
    for code in target_languages {
        validate_language(code)?;
    }
    files.iter().try_for_each(validate_file)
}

pub fn validate_single(file: &UploadFile, target_lang: &str) -> Result<(), ApiError> {
    validate_language(target_lang)?;
    validate_file(file)
}
