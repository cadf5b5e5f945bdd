use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Source language of an extracted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Tsx,
    Jsx,
    TypeScript,
    JavaScript,
    Css,
    Json,
    Markdown,
    Python,
    Html,
    Shell,
    Text,
}

impl Language {
    /// Maps a fence info-string tag (`tsx`, `typescript`, `sh`, ...) to a language.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = match tag.trim().to_ascii_lowercase().as_str() {
            "tsx" => Language::Tsx,
            "jsx" => Language::Jsx,
            "ts" | "typescript" => Language::TypeScript,
            "js" | "javascript" | "mjs" | "cjs" => Language::JavaScript,
            "css" => Language::Css,
            "json" => Language::Json,
            "md" | "markdown" => Language::Markdown,
            "py" | "python" => Language::Python,
            "html" => Language::Html,
            "sh" | "bash" | "shell" | "zsh" | "console" => Language::Shell,
            "txt" | "text" | "plaintext" => Language::Text,
            _ => return None,
        };
        Some(lang)
    }

    /// Infers the language from a file path's extension.
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("tsx") => Language::Tsx,
            Some("ts") => Language::TypeScript,
            Some("js") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("jsx") => Language::Jsx,
            Some("css") => Language::Css,
            Some("json") => Language::Json,
            Some("md") => Language::Markdown,
            Some("py") => Language::Python,
            Some("html") => Language::Html,
            Some("sh") => Language::Shell,
            _ => Language::Text,
        }
    }

    /// File extension used when a path has to be synthesized.
    pub fn extension(self) -> &'static str {
        match self {
            Language::Tsx => "tsx",
            Language::Jsx => "jsx",
            Language::TypeScript => "ts",
            Language::JavaScript => "js",
            Language::Css => "css",
            Language::Json => "json",
            Language::Markdown => "md",
            Language::Python => "py",
            Language::Html => "html",
            Language::Shell => "sh",
            Language::Text => "txt",
        }
    }

    pub fn is_script(self) -> bool {
        matches!(
            self,
            Language::Tsx | Language::Jsx | Language::TypeScript | Language::JavaScript
        )
    }
}

/// Which extraction pattern produced a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePattern {
    JsonFormat,
    ExplicitFile,
    MarkdownHeader,
    PackageJson,
    TsxComponent,
    TypeScriptFile,
    CssFile,
    Unlabeled,
    DefaultTemplate,
    /// Read from an existing file on disk rather than from a response.
    OnDisk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFile {
    pub path: String,
    pub content: String,
    pub language: Language,
    pub source_pattern: SourcePattern,
}

impl ExtractedFile {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        language: Language,
        source_pattern: SourcePattern,
    ) -> Self {
        Self {
            path: normalize_path(&path.into()),
            content: content.into(),
            language,
            source_pattern,
        }
    }
}

/// Path-keyed set of extracted files. The first insertion for a path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    files: BTreeMap<String, ExtractedFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `file` unless its path is already taken. Returns whether it was kept.
    pub fn insert_first(&mut self, file: ExtractedFile) -> bool {
        if self.files.contains_key(&file.path) {
            return false;
        }
        self.files.insert(file.path.clone(), file);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&ExtractedFile> {
        self.files.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut ExtractedFile> {
        self.files.get_mut(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedFile> {
        self.files.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ExtractedFile> {
        self.files.values_mut()
    }
}

impl IntoIterator for FileSet {
    type Item = ExtractedFile;
    type IntoIter = std::collections::btree_map::IntoValues<String, ExtractedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_values()
    }
}

impl FromIterator<ExtractedFile> for FileSet {
    fn from_iter<I: IntoIterator<Item = ExtractedFile>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for file in iter {
            set.insert_first(file);
        }
        set
    }
}

/// Normalizes a project-relative path: forward slashes, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest.to_string();
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest.to_string();
        } else {
            break;
        }
    }
    while p.contains("//") {
        p = p.replace("//", "/");
    }
    p
}

/// True if the path would leave the project root.
pub fn escapes_root(path: &str) -> bool {
    path.split('/').any(|c| c == "..") || Path::new(path).is_absolute()
}
