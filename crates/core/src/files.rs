//! Binary asset references: uploads going out and file URLs coming back.

/// An in-memory file attached to a write request.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Form-shaped request bodies that may carry files.
///
/// The request builder sends a multipart body when [`file_fields`] is
/// non-empty and a JSON body otherwise.
///
/// [`file_fields`]: FormEncode::file_fields
pub trait FormEncode {
    /// Text parts, in order. Empty values are already omitted.
    fn text_fields(&self) -> Vec<(&'static str, String)>;

    /// File parts, in order.
    fn file_fields(&self) -> Vec<(&'static str, &FileUpload)>;

    fn has_files(&self) -> bool {
        !self.file_fields().is_empty()
    }
}

/// Identifies the record that owns a stored file.
#[derive(Debug, Clone, Copy)]
pub struct FileOwner<'a> {
    /// Collection id when known, else the collection name.
    pub collection: &'a str,
    pub record_id: &'a str,
}

/// Resolve a stored filename into a fetchable URL.
///
/// `{base}/api/files/{collection}/{record}/{filename}` with an optional
/// `?thumb={size}` suffix (e.g. `"100x100"`). Returns `None` when the record
/// has no file.
pub fn file_url(
    base_url: &str,
    owner: FileOwner<'_>,
    filename: Option<&str>,
    thumb: Option<&str>,
) -> Option<String> {
    let filename = filename.filter(|f| !f.is_empty())?;
    let url = format!(
        "{}/api/files/{}/{}/{}",
        base_url.trim_end_matches('/'),
        owner.collection,
        owner.record_id,
        filename
    );
    Some(match thumb.filter(|t| !t.is_empty()) {
        Some(size) => format!("{url}?thumb={size}"),
        None => url,
    })
}
