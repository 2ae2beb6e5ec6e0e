//! Live editing session for one design.

use std::sync::{Arc, Weak};

use log::debug;

use crate::design::{Design, SizePreset};
use crate::error::Result;
use crate::field::{parse_edit, reset_fields, set_field, DesignEdit, DesignField};
use crate::preview::{fill_percentage, MountedPreview, PreviewNode};
use crate::query::{decode_from_query, encode_to_query};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Types whose state round-trips through a query string.
pub trait Configurable {
    /// Replaces the current state with the one encoded in `query`.
    fn apply_query(&mut self, query: &str);

    /// Encodes the current state as a query string.
    fn export_query(&self) -> String;
}

// ============================================================================
// DesignEditor
// ============================================================================

/// Owns the design being edited and, while mounted, its rendered preview.
///
/// Every accepted edit replaces the design wholesale and bumps
/// [`version`](Self::version). A mounted preview is re-rendered in place on
/// each change; exports observe it through [`node`](Self::node), which stops
/// upgrading once the preview is unmounted.
///
/// # Example
///
/// ```
/// use hellscore_renderer::{DesignEditor, DesignEdit, DesignField};
///
/// let mut editor = DesignEditor::default();
/// editor.mount();
///
/// editor.edit(DesignEdit::Current(5000.0));
/// assert_eq!(editor.fill_percentage(), 50.0);
///
/// editor.edit_raw(DesignField::Theme, "molten").unwrap();
/// assert!(editor.node().upgrade().is_some());
/// ```
#[derive(Debug, Default)]
pub struct DesignEditor {
    design: Design,
    version: u64,
    mounted: Option<Arc<MountedPreview>>,
}

impl DesignEditor {
    pub fn new(design: Design) -> Self {
        Self {
            design,
            version: 0,
            mounted: None,
        }
    }

    /// Starts a session from a query string.
    pub fn from_query(query: &str) -> Self {
        Self::new(decode_from_query(query))
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Number of changes accepted so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fill_percentage(&self) -> f64 {
        fill_percentage(self.design.goal, self.design.current)
    }

    /// Applies one edit. Returns true if the design changed.
    ///
    /// Width and height edits only take effect under the custom size preset.
    pub fn edit(&mut self, edit: DesignEdit) -> bool {
        if matches!(edit, DesignEdit::Width(_) | DesignEdit::Height(_))
            && self.design.size_preset != SizePreset::Custom
        {
            debug!("ignoring {} edit for a fixed size preset", edit.field());
            return false;
        }
        let next = set_field(&self.design, edit);
        self.replace(next)
    }

    /// Parses `raw` as control input for `field` and applies it.
    pub fn edit_raw(&mut self, field: DesignField, raw: &str) -> Result<bool> {
        let edit = parse_edit(field, raw)?;
        Ok(self.edit(edit))
    }

    /// Restores `fields` to their defaults in a single change.
    pub fn reset(&mut self, fields: &[DesignField]) -> bool {
        let next = reset_fields(&self.design, fields);
        self.replace(next)
    }

    fn replace(&mut self, next: Design) -> bool {
        if next == self.design {
            return false;
        }
        self.design = next;
        self.version += 1;
        if let Some(mount) = &self.mounted {
            mount.replace(PreviewNode::render(&self.design));
        }
        true
    }

    /// Renders the preview and keeps it mounted until [`unmount`](Self::unmount).
    pub fn mount(&mut self) -> Weak<MountedPreview> {
        let mount = Arc::new(MountedPreview::new(PreviewNode::render(&self.design)));
        let weak = Arc::downgrade(&mount);
        self.mounted = Some(mount);
        weak
    }

    pub fn unmount(&mut self) {
        self.mounted = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// The currently mounted preview, if any.
    pub fn preview(&self) -> Option<Arc<PreviewNode>> {
        self.mounted.as_ref().map(|mount| mount.current())
    }

    /// Weak handle to the mount point. Dangles when nothing is mounted.
    pub fn node(&self) -> Weak<MountedPreview> {
        self.mounted.as_ref().map(Arc::downgrade).unwrap_or_default()
    }
}

impl Configurable for DesignEditor {
    fn apply_query(&mut self, query: &str) {
        let next = decode_from_query(query);
        self.replace(next);
    }

    fn export_query(&self) -> String {
        encode_to_query(&self.design)
    }
}

// ============================================================================
// Tests
// ============================================================================
