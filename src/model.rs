//! The uniform, language-neutral data model shared by every stage of the
//! pipeline: catalog lookups produce a [`ResourceLocation`], parsers produce
//! one of the `*Book` variants gathered into a [`BookContent`], and the
//! assembly engine consumes those to build a [`Document`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A three-letter book code drawn from the fixed 66-book canon (`gen`,
/// `tit`, `rev`, ...). Validity against the canon is checked by
/// [`crate::canon::book_number`], not by this type itself.
pub type BookCode = String;

/// A verse reference as it appears in source markup: either a decimal
/// string (`"12"`) or an inclusive range (`"1-2"`). Ranges are matched
/// between resources as opaque strings.
pub type VerseRef = String;

pub type ChapterNum = u32;
pub type HtmlContent = String;

/// Left-to-right or right-to-left, attached to each `*Book` to drive a
/// directional wrapper element in the assembled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LangDirection {
    Ltr,
    Rtl,
}

impl Default for LangDirection {
    fn default() -> Self {
        LangDirection::Ltr
    }
}

impl LangDirection {
    /// The `dir` attribute value for the language-direction wrapper element.
    pub fn as_attr(self) -> &'static str {
        match self {
            LangDirection::Ltr => "ltr",
            LangDirection::Rtl => "rtl",
        }
    }
}

/// Which of the five parser variants handles a given catalog resource-type
/// string. Classification is by convention over the catalog's free-form
/// `resource_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Scripture,
    Notes,
    Questions,
    Words,
    Commentary,
}

impl ResourceKind {
    /// Classify a catalog `resource_type` string (e.g. `"ulb"`, `"tn"`).
    /// Unrecognized strings return `None`; callers should treat that
    /// resource as unsupported rather than guessing.
    pub fn classify(resource_type: &str) -> Option<ResourceKind> {
        match resource_type.to_lowercase().as_str() {
            "ulb" | "udb" | "reg" | "scr" => Some(ResourceKind::Scripture),
            "tn" => Some(ResourceKind::Notes),
            "tq" => Some(ResourceKind::Questions),
            "tw" => Some(ResourceKind::Words),
            "bc" => Some(ResourceKind::Commentary),
            _ => None,
        }
    }
}

/// One (language, resource-type, book) triple requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub lang_code: String,
    pub resource_type: String,
    pub book_code: BookCode,
}

impl ResourceRequest {
    pub fn new(
        lang_code: impl Into<String>,
        resource_type: impl Into<String>,
        book_code: impl Into<String>,
    ) -> Self {
        Self {
            lang_code: lang_code.into(),
            resource_type: resource_type.into(),
            book_code: book_code.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblyStrategyKind {
    #[serde(rename = "lbo")]
    LanguageBookOrder,
    #[serde(rename = "blo")]
    BookLanguageOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblyLayoutKind {
    #[serde(rename = "1c")]
    OneColumn,
    #[serde(rename = "1c_c")]
    OneColumnCompact,
    #[serde(rename = "2c_sl_sr")]
    TwoColumnScriptureLeftScriptureRight,
    #[serde(rename = "2c_sl_sr_c")]
    TwoColumnScriptureLeftScriptureRightCompact,
}

impl AssemblyLayoutKind {
    pub fn is_two_column(self) -> bool {
        matches!(
            self,
            AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight
                | AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRightCompact
        )
    }

    pub fn is_compact(self) -> bool {
        matches!(
            self,
            AssemblyLayoutKind::OneColumnCompact
                | AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRightCompact
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkSize {
    #[serde(rename = "verse")]
    Verse,
    #[serde(rename = "chapter")]
    Chapter,
}

impl Default for ChunkSize {
    fn default() -> Self {
        ChunkSize::Chapter
    }
}

/// The validated request the core pipeline is handed. Built by
/// [`crate::validation::validate`] from a raw, caller-supplied draft; once
/// constructed it never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub email_address: Option<String>,
    pub assembly_strategy_kind: AssemblyStrategyKind,
    pub assembly_layout_kind: Option<AssemblyLayoutKind>,
    #[serde(default)]
    pub layout_for_print: bool,
    #[serde(default)]
    pub chunk_size: ChunkSize,
    #[serde(default)]
    pub generate_pdf: bool,
    #[serde(default)]
    pub generate_epub: bool,
    #[serde(default)]
    pub generate_docx: bool,
    pub resource_requests: Vec<ResourceRequest>,
}

/// How to fetch the bytes once a [`ResourceLocation`] is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Git,
    Zip,
    SingleFile,
}

/// The catalog's answer for one `ResourceRequest`: where to get it, and how.
/// `url: None` means "not found"; the caller skips this resource.
#[derive(Debug, Clone)]
pub struct ResourceLocation {
    pub url: Option<String>,
    pub transport: TransportKind,
    pub resource_type_name: String,
    pub path_selector: Option<String>,
}

impl ResourceLocation {
    pub fn not_found(resource_type_name: impl Into<String>) -> Self {
        Self {
            url: None,
            transport: TransportKind::SingleFile,
            resource_type_name: resource_type_name.into(),
            path_selector: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.url.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptureChapter {
    /// Whole-chapter HTML fragments, in document order (sans footnotes).
    pub fragments: Vec<HtmlContent>,
    /// Verse-only rendering, keyed by verse_ref.
    pub verses: BTreeMap<VerseRef, HtmlContent>,
    /// Chapter footnotes block HTML, empty if none.
    pub footnotes_html: HtmlContent,
}

#[derive(Debug, Clone)]
pub struct ScriptureBook {
    pub lang_code: String,
    pub lang_name: String,
    pub lang_direction: LangDirection,
    pub book_code: BookCode,
    pub resource_type_name: String,
    pub chapters: BTreeMap<ChapterNum, ScriptureChapter>,
}

#[derive(Debug, Clone, Default)]
pub struct NotesChapter {
    pub chapter_intro_html: HtmlContent,
    pub verses: BTreeMap<VerseRef, HtmlContent>,
}

#[derive(Debug, Clone)]
pub struct NotesBook {
    pub lang_code: String,
    pub lang_name: String,
    pub lang_direction: LangDirection,
    pub book_code: BookCode,
    pub book_intro_html: HtmlContent,
    pub chapters: BTreeMap<ChapterNum, NotesChapter>,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionsChapter {
    pub verses: BTreeMap<VerseRef, HtmlContent>,
}

#[derive(Debug, Clone)]
pub struct QuestionsBook {
    pub lang_code: String,
    pub lang_name: String,
    pub lang_direction: LangDirection,
    pub book_code: BookCode,
    pub chapters: BTreeMap<ChapterNum, QuestionsChapter>,
}

/// One recorded use of a translation word, created only during the
/// Words-linking pass that runs inside assembly (word-uses
/// accumulation). Never constructed by the Words parser itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordUse {
    pub lang_code: String,
    pub book_code: BookCode,
    pub book_name: String,
    pub chapter_num: ChapterNum,
    pub verse_ref: VerseRef,
    pub localized_word: String,
}

#[derive(Debug, Clone)]
pub struct WordsBook {
    pub lang_code: String,
    /// Sorted by `localized_word` ascending.
    pub entries: Vec<(String, HtmlContent)>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentaryChapter {
    pub html: HtmlContent,
}

#[derive(Debug, Clone)]
pub struct CommentaryBook {
    pub lang_code: String,
    pub lang_name: String,
    pub lang_direction: LangDirection,
    pub book_code: BookCode,
    pub book_intro_html: HtmlContent,
    pub chapters: BTreeMap<ChapterNum, CommentaryChapter>,
}

/// A tagged union over the five parsed resource kinds; exactly one variant.
#[derive(Debug, Clone)]
pub enum BookContent {
    Scripture(ScriptureBook),
    Notes(NotesBook),
    Questions(QuestionsBook),
    Words(WordsBook),
    Commentary(CommentaryBook),
}

impl BookContent {
    pub fn lang_code(&self) -> &str {
        match self {
            BookContent::Scripture(b) => &b.lang_code,
            BookContent::Notes(b) => &b.lang_code,
            BookContent::Questions(b) => &b.lang_code,
            BookContent::Words(b) => &b.lang_code,
            BookContent::Commentary(b) => &b.lang_code,
        }
    }

    pub fn book_code(&self) -> Option<&str> {
        match self {
            BookContent::Scripture(b) => Some(&b.book_code),
            BookContent::Notes(b) => Some(&b.book_code),
            BookContent::Questions(b) => Some(&b.book_code),
            BookContent::Words(_) => None,
            BookContent::Commentary(b) => Some(&b.book_code),
        }
    }
}

/// Per-resource outcome recorded by the orchestrator, surfaced in the final
/// result alongside the assembled document.
#[derive(Debug, Clone)]
pub enum ResourceStatus {
    Assembled,
    Unfound {
        request: ResourceRequest,
    },
    ProvisionFailed {
        request: ResourceRequest,
        reason: String,
    },
    Malformed {
        request: ResourceRequest,
        reason: String,
    },
    OrphanVerses {
        request: ResourceRequest,
        verse_refs: Vec<VerseRef>,
    },
}

/// The final product of the pipeline: the assembled HTML bytes, the
/// deterministic document key used as the output filename stem, and the
/// per-resource status list used to report partial failures.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub document_key: String,
    pub html: String,
    pub statuses: Vec<ResourceStatus>,
    pub output_path: PathBuf,
}
