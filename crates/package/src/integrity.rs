//! Referential-integrity rules
//!
//! One rule evaluation, two policies. [`evaluate`] walks a document set and
//! reports every violation to a [`ViolationSink`]; the sink decides whether
//! to keep going. Export collects everything as warnings ([`CollectAll`]),
//! import stops at the first blocking violation ([`FirstBlocking`]).
//!
//! Advisory violations (no elements, a diagram without a layout, a snapshot
//! section that is absent) are reported to both sinks but never block.

use std::collections::HashSet;
use std::ops::ControlFlow;

use eapkg_core::{
    BaselineRecord, BaselineSnapshot, DiagramRecord, ElementRecord, LayoutsRecord, PackageData,
    RelationshipRecord,
};
use thiserror::Error;

/// A single integrity rule failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    /// The package has no elements
    #[error("Package contains no elements")]
    NoElements,

    /// A record lacks a required field
    #[error("{collection}[{index}] is missing required field '{field}'")]
    MissingField {
        /// Collection name (elements, relationships, diagrams)
        collection: &'static str,
        /// Position within the collection
        index: usize,
        /// Field name
        field: &'static str,
    },

    /// Two records of the same kind share an id
    #[error("Duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Record kind (element, relationship, diagram, baseline)
        kind: &'static str,
        /// The repeated id
        id: String,
    },

    /// A relationship endpoint does not resolve
    #[error("Relationship '{relationship}' {endpoint} references missing element '{element}'")]
    DanglingEndpoint {
        /// Relationship id
        relationship: String,
        /// "source" or "target"
        endpoint: &'static str,
        /// Unresolved element id
        element: String,
    },

    /// A diagram references an element that does not exist
    #[error("Diagram '{diagram}' references missing element '{element}'")]
    DiagramMissingElement {
        /// Diagram id
        diagram: String,
        /// Unresolved element id
        element: String,
    },

    /// A diagram shows a relationship that does not exist
    #[error("Diagram '{diagram}' references missing relationship '{relationship}'")]
    DiagramMissingRelationship {
        /// Diagram id
        diagram: String,
        /// Unresolved relationship id
        relationship: String,
    },

    /// A layout entry is keyed by an unknown diagram
    #[error("Layout references missing diagram '{diagram}'")]
    LayoutMissingDiagram {
        /// Unresolved diagram id
        diagram: String,
    },

    /// A layout positions an unknown element
    #[error("Layout for diagram '{diagram}' references missing element '{element}'")]
    LayoutMissingElement {
        /// Diagram id of the layout
        diagram: String,
        /// Unresolved element id
        element: String,
    },

    /// A diagram has no layout entry
    #[error("Diagram '{diagram}' has no layout entry")]
    DiagramWithoutLayout {
        /// Diagram id
        diagram: String,
    },

    /// A baseline snapshot lacks one of its sections
    #[error("Baseline '{baseline}' snapshot is missing '{section}'")]
    SnapshotSectionMissing {
        /// Baseline id
        baseline: String,
        /// Absent section (elements, relationships, diagrams)
        section: &'static str,
    },

    /// A violation found inside a baseline snapshot
    #[error("Baseline '{baseline}': {inner}")]
    InBaseline {
        /// Baseline id
        baseline: String,
        /// The snapshot's violation
        inner: Box<IntegrityViolation>,
    },
}

impl IntegrityViolation {
    /// True for informational violations that never block an import
    pub fn is_advisory(&self) -> bool {
        match self {
            IntegrityViolation::NoElements
            | IntegrityViolation::DiagramWithoutLayout { .. }
            | IntegrityViolation::SnapshotSectionMissing { .. } => true,
            IntegrityViolation::InBaseline { inner, .. } => inner.is_advisory(),
            _ => false,
        }
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Receives violations as rules find them
pub trait ViolationSink {
    /// Record a violation; `Break` stops the evaluation
    fn report(&mut self, violation: IntegrityViolation) -> ControlFlow<()>;
}

/// Keeps every violation (export policy)
#[derive(Debug, Default)]
pub struct CollectAll {
    /// Violations in evaluation order
    pub violations: Vec<IntegrityViolation>,
}

impl ViolationSink for CollectAll {
    fn report(&mut self, violation: IntegrityViolation) -> ControlFlow<()> {
        self.violations.push(violation);
        ControlFlow::Continue(())
    }
}

/// Stops at the first blocking violation (import policy)
#[derive(Debug, Default)]
pub struct FirstBlocking {
    /// The violation that stopped evaluation
    pub blocking: Option<IntegrityViolation>,
    /// Advisory violations seen before stopping
    pub advisories: Vec<IntegrityViolation>,
}

impl ViolationSink for FirstBlocking {
    fn report(&mut self, violation: IntegrityViolation) -> ControlFlow<()> {
        if violation.is_advisory() {
            self.advisories.push(violation);
            return ControlFlow::Continue(());
        }
        self.blocking = Some(violation);
        ControlFlow::Break(())
    }
}

/// Wraps every violation in the baseline it was found in
struct BaselineScoped<'a, S: ?Sized> {
    baseline: &'a str,
    inner: &'a mut S,
}

impl<S: ViolationSink + ?Sized> ViolationSink for BaselineScoped<'_, S> {
    fn report(&mut self, violation: IntegrityViolation) -> ControlFlow<()> {
        self.inner.report(IntegrityViolation::InBaseline {
            baseline: self.baseline.to_string(),
            inner: Box::new(violation),
        })
    }
}

macro_rules! report {
    ($sink:expr, $violation:expr) => {
        if $sink.report($violation).is_break() {
            return ControlFlow::Break(());
        }
    };
}

// =============================================================================
// Document sets
// =============================================================================

/// The collections the rules look at
#[derive(Debug, Clone, Copy)]
pub struct DocumentSet<'a> {
    /// Elements
    pub elements: &'a [ElementRecord],
    /// Relationships
    pub relationships: &'a [RelationshipRecord],
    /// Diagrams
    pub diagrams: &'a [DiagramRecord],
    /// Layouts; `None` skips the layout rules
    pub layouts: Option<&'a LayoutsRecord>,
    /// Baselines whose snapshots are checked recursively
    pub baselines: &'a [BaselineRecord],
    /// Set when this is a baseline snapshot rather than the repository
    pub is_snapshot: bool,
}

impl<'a> DocumentSet<'a> {
    /// The top-level documents of a package
    pub fn of(data: &'a PackageData) -> Self {
        Self {
            elements: &data.elements,
            relationships: &data.relationships,
            diagrams: &data.diagrams,
            layouts: Some(&data.layouts),
            baselines: &data.baselines,
            is_snapshot: false,
        }
    }

    fn of_snapshot(snapshot: &'a BaselineSnapshot) -> Self {
        Self {
            elements: snapshot.elements.as_deref().unwrap_or(&[]),
            relationships: snapshot.relationships.as_deref().unwrap_or(&[]),
            diagrams: snapshot.diagrams.as_deref().unwrap_or(&[]),
            layouts: snapshot.layouts.as_ref(),
            baselines: &[],
            is_snapshot: true,
        }
    }
}

// =============================================================================
// Rule evaluation
// =============================================================================

/// Run every rule over `set`, reporting violations to `sink`
///
/// Returns `Break` if the sink asked to stop.
pub fn evaluate(set: &DocumentSet<'_>, sink: &mut dyn ViolationSink) -> ControlFlow<()> {
    if set.elements.is_empty() && !set.is_snapshot {
        report!(sink, IntegrityViolation::NoElements);
    }

    // Required fields
    for (index, element) in set.elements.iter().enumerate() {
        if element.id.trim().is_empty() {
            report!(sink, missing("elements", index, "id"));
        }
    }
    for (index, rel) in set.relationships.iter().enumerate() {
        for (field, value) in [
            ("id", &rel.id),
            ("sourceId", &rel.source_id),
            ("targetId", &rel.target_id),
        ] {
            if value.trim().is_empty() {
                report!(sink, missing("relationships", index, field));
            }
        }
    }
    for (index, diagram) in set.diagrams.iter().enumerate() {
        if diagram.id.trim().is_empty() {
            report!(sink, missing("diagrams", index, "id"));
        }
    }

    // Uniqueness
    let ControlFlow::Continue(element_ids) =
        unique_ids(set.elements.iter().map(|e| e.id.as_str()), "element", sink)
    else {
        return ControlFlow::Break(());
    };
    let ControlFlow::Continue(relationship_ids) = unique_ids(
        set.relationships.iter().map(|r| r.id.as_str()),
        "relationship",
        sink,
    ) else {
        return ControlFlow::Break(());
    };
    let ControlFlow::Continue(diagram_ids) =
        unique_ids(set.diagrams.iter().map(|d| d.id.as_str()), "diagram", sink)
    else {
        return ControlFlow::Break(());
    };
    if unique_ids(set.baselines.iter().map(|b| b.id.as_str()), "baseline", sink).is_break() {
        return ControlFlow::Break(());
    }

    // Relationship endpoints
    for rel in set.relationships {
        for (endpoint, element) in [("source", &rel.source_id), ("target", &rel.target_id)] {
            if !element.trim().is_empty() && !element_ids.contains(element.as_str()) {
                report!(
                    sink,
                    IntegrityViolation::DanglingEndpoint {
                        relationship: rel.id.clone(),
                        endpoint,
                        element: element.clone(),
                    }
                );
            }
        }
    }

    // Diagram references
    for diagram in set.diagrams {
        for element in &diagram.referenced_element_ids {
            if !element_ids.contains(element.as_str()) {
                report!(
                    sink,
                    IntegrityViolation::DiagramMissingElement {
                        diagram: diagram.id.clone(),
                        element: element.clone(),
                    }
                );
            }
        }
        for relationship in &diagram.visible_relationship_ids {
            if !relationship_ids.contains(relationship.as_str()) {
                report!(
                    sink,
                    IntegrityViolation::DiagramMissingRelationship {
                        diagram: diagram.id.clone(),
                        relationship: relationship.clone(),
                    }
                );
            }
        }
    }

    // Layout references
    if let Some(layouts) = set.layouts {
        for (diagram, positions) in &layouts.view_layouts {
            if !diagram_ids.contains(diagram.as_str()) {
                report!(
                    sink,
                    IntegrityViolation::LayoutMissingDiagram {
                        diagram: diagram.clone(),
                    }
                );
            }
            for element in positions.keys() {
                if !element_ids.contains(element.as_str()) {
                    report!(
                        sink,
                        IntegrityViolation::LayoutMissingElement {
                            diagram: diagram.clone(),
                            element: element.clone(),
                        }
                    );
                }
            }
        }
        for diagram in set.diagrams {
            if !diagram.id.is_empty() && !layouts.view_layouts.contains_key(&diagram.id) {
                report!(
                    sink,
                    IntegrityViolation::DiagramWithoutLayout {
                        diagram: diagram.id.clone(),
                    }
                );
            }
        }
    }

    // Baseline snapshots, each checked as an independent document set
    for baseline in set.baselines {
        let Some(snapshot) = &baseline.snapshot else {
            continue;
        };
        for (section, present) in [
            ("elements", snapshot.elements.is_some()),
            ("relationships", snapshot.relationships.is_some()),
            ("diagrams", snapshot.diagrams.is_some()),
        ] {
            if !present {
                report!(
                    sink,
                    IntegrityViolation::SnapshotSectionMissing {
                        baseline: baseline.id.clone(),
                        section,
                    }
                );
            }
        }

        let mut scoped = BaselineScoped {
            baseline: &baseline.id,
            inner: &mut *sink,
        };
        if evaluate(&DocumentSet::of_snapshot(snapshot), &mut scoped).is_break() {
            return ControlFlow::Break(());
        }
    }

    ControlFlow::Continue(())
}

fn missing(collection: &'static str, index: usize, field: &'static str) -> IntegrityViolation {
    IntegrityViolation::MissingField {
        collection,
        index,
        field,
    }
}

/// Collect non-empty ids, reporting each repeated id once
fn unique_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    kind: &'static str,
    sink: &mut dyn ViolationSink,
) -> ControlFlow<(), HashSet<&'a str>> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            continue;
        }
        if !seen.insert(id) && reported.insert(id) {
            let violation = IntegrityViolation::DuplicateId {
                kind,
                id: id.to_string(),
            };
            if sink.report(violation).is_break() {
                return ControlFlow::Break(());
            }
        }
    }
    ControlFlow::Continue(seen)
}

/// Every violation in `set`, advisory ones included
pub fn collect_warnings(set: &DocumentSet<'_>) -> Vec<IntegrityViolation> {
    let mut sink = CollectAll::default();
    let _ = evaluate(set, &mut sink);
    sink.violations
}

/// First blocking violation in `set`, if any
pub fn check_strict(set: &DocumentSet<'_>) -> Result<(), IntegrityViolation> {
    let mut sink = FirstBlocking::default();
    let _ = evaluate(set, &mut sink);
    match sink.blocking {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}
