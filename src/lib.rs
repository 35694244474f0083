//! Resolves, parses, and interleaves multi-language Bible study resources
//! (scripture, translation notes, translation questions, translation
//! words, and commentary) into a single assembled HTML document.
//!
//! [`assemble_document`] is the whole pipeline in one call: validate the
//! request, resolve and provision every requested resource through the
//! catalog, parse each into its `*Book` form, interleave them into an
//! ordered body, append a Word-Definitions glossary, and wrap the result
//! in a header/footer template. Callers own the long-lived [`Catalog`],
//! [`provision::LockRegistry`], and [`provision::Fetcher`] so that repeated
//! calls share the provisioning cache and lock table.

#![deny(
    bare_trait_objects,
    elided_lifetimes_in_paths,
    rust_2018_idioms,
    unsafe_code
)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

pub mod assembler;
pub mod assembly;
pub mod canon;
pub mod catalog;
pub mod collaborators;
pub mod concurrency;
pub mod config;
pub mod errors;
pub mod heading;
pub mod logging;
pub mod model;
pub mod parsers;
pub mod provision;
pub mod transform;
pub mod validation;
pub mod word_definitions;

pub use crate::assembler::DocumentAssembler;
pub use crate::catalog::Catalog;
pub use crate::config::Config;
pub use crate::errors::Error;

use crate::assembly::ordering::Resources;
use crate::model::{
    AssembledDocument, BookContent, DocumentRequest, ResourceKind, ResourceRequest,
    ResourceStatus,
};
use crate::parsers::usfm::InlineUsfmConverter;
use crate::provision::{Fetcher, LockRegistry};
use crate::transform::{AlwaysAbsent, LinkRewriter, NotesAssetLookup};
use crate::word_definitions::UsesByLangWord;

/// Run the whole pipeline for one validated request: resolve -> provision
/// -> parse -> transform -> assemble -> append words -> wrap.
///
/// Per-resource failures (`CatalogMiss`, `ProvisionFailure`,
/// `MalformedAsset`) are recoverable: the offending resource is dropped,
/// recorded in the returned [`ResourceStatus`] list, and the rest of the
/// request proceeds. Only [`Error::is_fatal`] errors abort the whole
/// call. `now_nanos` is the caller's clock reading, threaded in rather than
/// read here so the core never touches the clock itself; it's only
/// used as a fallback document-key suffix when the deterministic key would
/// be too long for a filesystem name.
///
/// Resolution, provisioning, and parsing for distinct resource requests run
/// concurrently across `config.worker_pool_size` threads (see
/// [`concurrency::fan_out`]), in two barriered phases: every Words resource
/// first, then everything else. The barrier exists because the link
/// rewriter needs a language's known-word set at construction time, and
/// that set only exists once the language's Words resource has finished
/// parsing. Within a phase, completion order doesn't affect the result:
/// parsed content is collected into canonically keyed maps before assembly
/// ever looks at it.
pub fn assemble_document(
    request: DocumentRequest,
    config: &Config,
    catalog: &Catalog,
    fetcher: &(dyn Fetcher + Sync),
    locks: &LockRegistry,
    now_nanos: u128,
) -> Result<AssembledDocument, Error> {
    let request = validation::validate(request)?;
    let layout = request
        .assembly_layout_kind
        .expect("validate always fills in a layout");
    let print_mode = request.layout_for_print;
    let removed_titles: HashSet<String> = config.removed_section_titles.iter().cloned().collect();

    let words_requested_langs: HashSet<&str> = request
        .resource_requests
        .iter()
        .filter(|r| ResourceKind::classify(&r.resource_type) == Some(ResourceKind::Words))
        .map(|r| r.lang_code.as_str())
        .collect();
    let any_scripture_requested = request
        .resource_requests
        .iter()
        .any(|r| ResourceKind::classify(&r.resource_type) == Some(ResourceKind::Scripture));

    let mut statuses = Vec::new();
    let mut contents: Vec<BookContent> = Vec::new();
    let mut known_words_by_lang: HashMap<String, HashSet<String>> = HashMap::new();
    let mut uses_by_lang_word: UsesByLangWord = HashMap::new();

    // Phase 1: every Words resource, fanned out across the worker pool.
    // Words must finish before Notes/Questions for the same language run:
    // the link rewriter needs the language's known-word set at
    // construction time to decide whether a `[[rc://.../tw/...]]` wikilink
    // resolves to an anchor or is dropped.
    let words_requests: Vec<ResourceRequest> = request
        .resource_requests
        .iter()
        .filter(|r| ResourceKind::classify(&r.resource_type) == Some(ResourceKind::Words))
        .cloned()
        .collect();

    let words_results = concurrency::fan_out(words_requests, config.worker_pool_size, |r: ResourceRequest| -> Result<WordsOutcome, Error> {
        match resolve_and_provision(catalog, fetcher, locks, config, &r)? {
            ProvisionOutcome::Status(status) => Ok(WordsOutcome {
                status,
                content: None,
                known: None,
            }),
            ProvisionOutcome::Provisioned { dir, .. } => {
                let words_book = parsers::words::parse_words(&dir, &r.lang_code, &removed_titles);
                let known: HashSet<String> =
                    words_book.entries.iter().map(|(w, _)| w.clone()).collect();
                Ok(WordsOutcome {
                    status: ResourceStatus::Assembled,
                    content: Some(BookContent::Words(words_book)),
                    known: Some((r.lang_code.clone(), known)),
                })
            }
        }
    });

    for result in words_results {
        let outcome = result?;
        statuses.push(outcome.status);
        if let Some(content) = outcome.content {
            contents.push(content);
        }
        if let Some((lang, known)) = outcome.known {
            known_words_by_lang.insert(lang, known);
        }
    }

    // Phase 2: every other resource, fanned out the same way, now that
    // `known_words_by_lang` is complete for every requested language.
    let other_requests: Vec<ResourceRequest> = request
        .resource_requests
        .iter()
        .filter(|r| ResourceKind::classify(&r.resource_type) != Some(ResourceKind::Words))
        .cloned()
        .collect();

    let other_results = concurrency::fan_out(
        other_requests,
        config.worker_pool_size,
        |r: ResourceRequest| -> Result<ParsedOutcome, Error> {
            let Some(kind) = ResourceKind::classify(&r.resource_type) else {
                return Ok(ParsedOutcome {
                    status: ResourceStatus::Malformed {
                        request: r.clone(),
                        reason: format!("unrecognized resource type {:?}", r.resource_type),
                    },
                    content: None,
                    word_uses: Vec::new(),
                });
            };

            let (dir, resource_type_name) = match resolve_and_provision(catalog, fetcher, locks, config, &r)? {
                ProvisionOutcome::Status(status) => {
                    return Ok(ParsedOutcome {
                        status,
                        content: None,
                        word_uses: Vec::new(),
                    });
                }
                ProvisionOutcome::Provisioned { dir, resource_type_name } => (dir, resource_type_name),
            };
            let lang_name = parsers::read_lang_name(&dir, &r.lang_code);

            match kind {
                ResourceKind::Scripture => match parsers::scripture::parse_scripture(
                    &dir,
                    &r.lang_code,
                    &lang_name,
                    &r.book_code,
                    &resource_type_name,
                    print_mode,
                    &InlineUsfmConverter,
                ) {
                    Ok(book) => Ok(ParsedOutcome {
                        status: ResourceStatus::Assembled,
                        content: Some(BookContent::Scripture(book)),
                        word_uses: Vec::new(),
                    }),
                    Err(e) => Ok(ParsedOutcome {
                        status: ResourceStatus::Malformed {
                            request: r.clone(),
                            reason: e.to_string(),
                        },
                        content: None,
                        word_uses: Vec::new(),
                    }),
                },
                ResourceKind::Notes => {
                    let known = known_words_by_lang.get(&r.lang_code).cloned().unwrap_or_default();
                    let words_requested = words_requested_langs.contains(r.lang_code.as_str());
                    let lookup = FsNotesAssetLookup { root: dir.clone() };
                    let mut rewriter = LinkRewriter::new(r.lang_code.clone(), &known, words_requested, &lookup);
                    rewriter.set_contributes_uses(true);
                    let book = parsers::notes::parse_notes(
                        &dir,
                        &r.lang_code,
                        &lang_name,
                        &r.book_code,
                        request.chunk_size,
                        config.include_tn_book_intros,
                        &removed_titles,
                        &mut rewriter,
                    );
                    let word_uses = rewriter.take_uses();
                    Ok(ParsedOutcome {
                        status: ResourceStatus::Assembled,
                        content: Some(BookContent::Notes(book)),
                        word_uses,
                    })
                }
                ResourceKind::Questions => {
                    let known = known_words_by_lang.get(&r.lang_code).cloned().unwrap_or_default();
                    let words_requested = words_requested_langs.contains(r.lang_code.as_str());
                    let lookup = AlwaysAbsent;
                    let mut rewriter = LinkRewriter::new(r.lang_code.clone(), &known, words_requested, &lookup);
                    let book = parsers::questions::parse_questions(
                        &dir,
                        &r.lang_code,
                        &lang_name,
                        &r.book_code,
                        request.chunk_size,
                        &removed_titles,
                        &mut rewriter,
                    );
                    Ok(ParsedOutcome {
                        status: ResourceStatus::Assembled,
                        content: Some(BookContent::Questions(book)),
                        word_uses: Vec::new(),
                    })
                }
                ResourceKind::Commentary => {
                    let book = parsers::commentary::parse_commentary(
                        &dir,
                        &r.lang_code,
                        &lang_name,
                        &r.book_code,
                        config.include_tn_book_intros,
                        &removed_titles,
                        &config.commentary_external_url_fmt,
                    );
                    Ok(ParsedOutcome {
                        status: ResourceStatus::Assembled,
                        content: Some(BookContent::Commentary(book)),
                        word_uses: Vec::new(),
                    })
                }
                ResourceKind::Words => unreachable!("words are filtered out of this phase"),
            }
        },
    );

    for result in other_results {
        let outcome = result?;
        statuses.push(outcome.status);
        if let Some(content) = outcome.content {
            contents.push(content);
        }
        for word_use in outcome.word_uses {
            uses_by_lang_word
                .entry((word_use.lang_code.clone(), word_use.localized_word.clone()))
                .or_default()
                .push(word_use);
        }
    }

    let resources = Resources::from_contents(contents);
    statuses.extend(assembly::detect_orphan_notes(&resources));

    let body = assembly::assemble_body(
        &resources,
        request.assembly_strategy_kind,
        layout,
        request.chunk_size,
    );
    let word_definitions_html =
        word_definitions::render(&resources, &uses_by_lang_word, any_scripture_requested);

    let document_assembler = DocumentAssembler::new()?;
    let css = assembler::build_stylesheet(config)?;
    let html = document_assembler.wrap(layout, &css, &body, &word_definitions_html)?;

    let document_key =
        assembler::compute_document_key(&request, || assembler::timestamp_fallback_key(now_nanos));
    let output_path = assembler::write_document(config, &document_key, &html)?;

    Ok(AssembledDocument {
        document_key,
        html,
        statuses,
        output_path,
    })
}

/// Outcome of resolving and provisioning one resource request: either an
/// unrecoverable status to record as-is, or the provisioned directory plus
/// the catalog's display name for the resource type.
enum ProvisionOutcome {
    Status(ResourceStatus),
    Provisioned { dir: PathBuf, resource_type_name: String },
}

/// Outcome of fully processing one Words resource request in phase 1.
struct WordsOutcome {
    status: ResourceStatus,
    content: Option<BookContent>,
    known: Option<(String, HashSet<String>)>,
}

/// Outcome of fully processing one non-Words resource request in phase 2.
struct ParsedOutcome {
    status: ResourceStatus,
    content: Option<BookContent>,
    word_uses: Vec<crate::model::WordUse>,
}

/// Resolve `r` against the catalog and provision it. Recoverable failures
/// (`CatalogMiss`, `ProvisionFailure`) come back as a `ProvisionOutcome::Status`
/// for the caller to record; any other error propagates per
/// `Error::is_fatal` rather than being swallowed into a status.
fn resolve_and_provision(
    catalog: &Catalog,
    fetcher: &(dyn Fetcher + Sync),
    locks: &LockRegistry,
    config: &Config,
    r: &ResourceRequest,
) -> Result<ProvisionOutcome, Error> {
    let location = catalog.resolve(&r.lang_code, &r.resource_type, &r.book_code);
    if !location.is_found() {
        return Ok(ProvisionOutcome::Status(ResourceStatus::Unfound { request: r.clone() }));
    }
    let resource_type_name = location.resource_type_name.clone();

    match provision::provision(fetcher, locks, config, &r.lang_code, &r.resource_type, &location) {
        Ok(dir) => Ok(ProvisionOutcome::Provisioned { dir, resource_type_name }),
        Err(e @ Error::ProvisionFailure { .. }) => Ok(ProvisionOutcome::Status(ResourceStatus::ProvisionFailed {
            request: r.clone(),
            reason: e.to_string(),
        })),
        Err(Error::CatalogMiss { .. }) => {
            Ok(ProvisionOutcome::Status(ResourceStatus::Unfound { request: r.clone() }))
        }
        Err(e) => Err(e),
    }
}

/// Checks whether a notes asset file exists on disk for a scripture-ref
/// link target, scoped to one already-provisioned Notes resource root.
/// A single Notes resource directory covers every book requested for
/// that language, since provisioning is keyed by `(lang_code,
/// resource_type)` rather than by book.
struct FsNotesAssetLookup {
    root: PathBuf,
}

impl NotesAssetLookup for FsNotesAssetLookup {
    fn exists(&self, _lang_code: &str, book_num: u32, chapter: u32, verse: &str) -> bool {
        let Some(book_code) = canon::book_code_for_number(book_num) else {
            return false;
        };
        for ext in ["md", "txt"] {
            for chapter_dir in [format!("{chapter:02}"), chapter.to_string()] {
                let pattern =
                    format!("{}/**/{book_code}/{chapter_dir}/{verse}.{ext}", self.root.display());
                if glob::glob(&pattern).ok().and_then(|mut m| m.next()).is_some() {
                    return true;
                }
            }
        }
        false
    }
}
