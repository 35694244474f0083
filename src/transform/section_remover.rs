//! Removes configured top-level sections from a markdown event stream
//! before HTML conversion. A section spans its
//! heading through to the next heading of equal or higher level,
//! exclusive; everything else passes through untouched and in order.

use std::collections::HashSet;

use pulldown_cmark::{Event, HeadingLevel, Tag, TagEnd};

/// A heading whose match against `removed_titles` isn't decided yet: every
/// event from its `Start` to its `End` is held here instead of being
/// emitted, so a removed section's opening tag and title text never reach
/// the output.
struct PendingHeading<'a> {
    level: HeadingLevel,
    title: String,
    events: Vec<Event<'a>>,
}

/// A stateful `apply`/`flat_map` step over the event stream, mirroring
/// the shape of the other markup filters in this module.
pub struct SectionRemover<'a> {
    removed_titles: HashSet<String>,
    skipping_level: Option<HeadingLevel>,
    pending: Option<PendingHeading<'a>>,
}

impl<'a> SectionRemover<'a> {
    pub fn new(removed_titles: HashSet<String>) -> Self {
        SectionRemover {
            removed_titles,
            skipping_level: None,
            pending: None,
        }
    }

    /// Consume one event, emitting zero or more events in its place: a
    /// buffered heading resolves to either nothing (removed) or its whole
    /// buffered run (kept), once its `End` event shows the decision.
    pub fn apply(&mut self, event: Event<'a>) -> Vec<Event<'a>> {
        match &event {
            Event::Start(Tag::Heading { level, .. }) => {
                if let Some(skip_level) = self.skipping_level {
                    if *level <= skip_level {
                        self.skipping_level = None;
                    } else {
                        // Nested inside an already-removed section; its own
                        // title never matters, so never buffer it.
                        return Vec::new();
                    }
                }
                self.pending = Some(PendingHeading {
                    level: *level,
                    title: String::new(),
                    events: vec![event],
                });
                return Vec::new();
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut pending) = self.pending.take() {
                    let removed = self.removed_titles.contains(pending.title.trim());
                    pending.events.push(event);
                    if removed {
                        self.skipping_level = Some(pending.level);
                        return Vec::new();
                    }
                    return pending.events;
                }
                return if self.skipping_level.is_some() {
                    Vec::new()
                } else {
                    vec![event]
                };
            }
            _ => {}
        }

        if let Some(pending) = self.pending.as_mut() {
            if let Event::Text(text) = &event {
                pending.title.push_str(text);
            }
            pending.events.push(event);
            return Vec::new();
        }

        if self.skipping_level.is_some() {
            Vec::new()
        } else {
            vec![event]
        }
    }
}
