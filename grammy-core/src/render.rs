//! Render synchronization - annotated text and caret preservation.
//!
//! A repaint structurally replaces whatever the surface is showing, which
//! loses the caret. The synchronizer reads the caret as a linear offset
//! before the repaint and puts it back into the run that contains that
//! offset afterwards.

use grammy_api::{Suggestion, SuggestionId};

/// One contiguous piece of rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    Plain { text: String },
    /// The span of an active suggestion.
    Marked {
        id: SuggestionId,
        text: String,
        hovered: bool,
    },
}

impl Run {
    pub fn text(&self) -> &str {
        match self {
            Run::Plain { text } | Run::Marked { text, .. } => text,
        }
    }

    pub fn len(&self) -> usize {
        self.text().len()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    pub fn suggestion_id(&self) -> Option<SuggestionId> {
        match self {
            Run::Plain { .. } => None,
            Run::Marked { id, .. } => Some(*id),
        }
    }
}

/// Where the caret sits, both as a run position and as a linear offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaretPosition {
    /// Index into [`AnnotatedText::runs`]. Zero when there are no runs.
    pub run: usize,
    /// Byte offset inside that run.
    pub offset_in_run: usize,
    /// Byte offset into the whole text.
    pub linear: usize,
}

/// The full text split into plain and marked runs, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedText {
    runs: Vec<Run>,
    len: usize,
}

impl AnnotatedText {
    /// Split `text` around `suggestions`, which must be ordered by offset.
    ///
    /// Suggestions that do not fit the text or overlap a previous one
    /// produce no marked run. An insertion becomes an empty marked run at
    /// its offset.
    pub fn build(text: &str, suggestions: &[Suggestion], hovered: Option<SuggestionId>) -> Self {
        let mut runs = Vec::with_capacity(suggestions.len() * 2 + 1);
        let mut pos = 0;

        for s in suggestions {
            if s.offset < pos {
                continue;
            }
            let Some(marked) = text.get(s.range()) else {
                tracing::debug!("Not rendering suggestion {} outside the text", s.id);
                continue;
            };
            if s.offset > pos {
                runs.push(Run::Plain {
                    text: text[pos..s.offset].to_string(),
                });
            }
            runs.push(Run::Marked {
                id: s.id,
                text: marked.to_string(),
                hovered: hovered == Some(s.id),
            });
            pos = s.end();
        }

        if pos < text.len() {
            runs.push(Run::Plain {
                text: text[pos..].to_string(),
            });
        }

        Self {
            runs,
            len: text.len(),
        }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Concatenation of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }

    /// Marked run ids, in order.
    pub fn marked_ids(&self) -> impl Iterator<Item = SuggestionId> + '_ {
        self.runs.iter().filter_map(Run::suggestion_id)
    }

    /// Place a linear offset inside a run.
    ///
    /// The offset is clamped to `[0, len]` and moved back onto a character
    /// boundary. An offset on a run boundary belongs to the non-empty run
    /// that starts there; the end of the text belongs to the end of the last
    /// non-empty run. Empty runs never hold the caret.
    pub fn locate(&self, offset: usize) -> CaretPosition {
        let offset = offset.min(self.len);
        let mut start = 0;

        for (index, run) in self.runs.iter().enumerate() {
            let end = start + run.len();
            if offset < end {
                let mut inner = offset - start;
                while !run.text().is_char_boundary(inner) {
                    inner -= 1;
                }
                return CaretPosition {
                    run: index,
                    offset_in_run: inner,
                    linear: start + inner,
                };
            }
            start = end;
        }

        match self.runs.iter().rposition(|run| !run.is_empty()) {
            Some(index) => CaretPosition {
                run: index,
                offset_in_run: self.runs[index].len(),
                linear: self.len,
            },
            None => CaretPosition::default(),
        }
    }

    /// Linear offset of a run position. Inverse of [`AnnotatedText::locate`].
    pub fn linear_offset(&self, run: usize, offset_in_run: usize) -> usize {
        let before: usize = self.runs.iter().take(run).map(Run::len).sum();
        before + offset_in_run
    }
}

/// The on-screen editable view.
///
/// The surface owns what the user sees; the engine only tells it what to
/// draw and where the caret goes. Content edits and hover changes flow back
/// to the engine as messages.
pub trait Surface {
    /// Replace the displayed content. The caret may be lost.
    fn render(&mut self, annotated: &AnnotatedText);

    /// Current caret as a linear byte offset.
    fn caret_offset(&self) -> usize;

    /// Put the caret at a run position.
    fn set_caret(&mut self, caret: CaretPosition);
}

/// Drives a [`Surface`]: renders annotated text and restores the caret.
#[derive(Debug, Default)]
pub struct RenderSync {
    last: Option<AnnotatedText>,
}

impl RenderSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `text` with `suggestions` highlighted, keeping the caret at
    /// the same linear offset. Returns the caret that was restored.
    pub fn repaint<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        text: &str,
        suggestions: &[Suggestion],
        hovered: Option<SuggestionId>,
    ) -> CaretPosition {
        let annotated = AnnotatedText::build(text, suggestions, hovered);
        let caret = surface.caret_offset();

        if self.last.as_ref() == Some(&annotated) {
            return annotated.locate(caret);
        }

        surface.render(&annotated);
        let restored = annotated.locate(caret);
        surface.set_caret(restored);

        self.last = Some(annotated);
        restored
    }

    /// Forget the last render so the next repaint always reaches the surface.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

/// In-memory surface for headless use and tests.
///
/// Rendering resets the caret to zero, the way replacing a rich-text
/// widget's content does.
#[derive(Debug, Default)]
pub struct BufferSurface {
    annotated: AnnotatedText,
    text: String,
    caret: usize,
    renders: usize,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user changing the text and moving the caret.
    pub fn edit(&mut self, text: impl Into<String>, caret: usize) {
        self.text = text.into();
        self.caret = caret;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn annotated(&self) -> &AnnotatedText {
        &self.annotated
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn renders(&self) -> usize {
        self.renders
    }
}

impl Surface for BufferSurface {
    fn render(&mut self, annotated: &AnnotatedText) {
        self.annotated = annotated.clone();
        self.text = annotated.plain_text();
        self.caret = 0;
        self.renders += 1;
    }

    fn caret_offset(&self) -> usize {
        self.caret
    }

    fn set_caret(&mut self, caret: CaretPosition) {
        self.caret = self.annotated.linear_offset(caret.run, caret.offset_in_run);
    }
}
