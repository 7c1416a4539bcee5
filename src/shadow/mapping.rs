//! Bidirectional offset translation between original and generated text.
//!
//! The shadow generator records one [`MappingRecord`] for every span it
//! copies verbatim; synthetic text (the ambient prelude, wrappers, the
//! default export) has no record. Translation looks for a containing record
//! and falls back to the nearest preceding record for offsets landing in
//! synthetic regions, so callers always get a best-effort offset back,
//! never an error.

/// What a mapped span originated from.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum MappingKind {
    Identity,
    Script,
    Module,
    Markup,
    Style,
    Directive,
    Interpolation,
}

/// Associates a contiguous original-text span with an equal-length span of
/// generated text. The copy is 1:1; no rewriting happens inside a mapped
/// span.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MappingRecord {
    pub original_offset: usize,
    pub original_length: usize,
    pub generated_offset: usize,
    pub kind: MappingKind,
}

/// An ordered set of mapping records, searchable from either coordinate
/// space.
///
/// Records arrive in increasing `generated_offset` order (the generator
/// emits them as it writes); a secondary index sorted by `original_offset`
/// keeps the original-to-generated direction binary-searchable too.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PositionMap {
    records: Vec<MappingRecord>,
    by_original: Vec<usize>,
}

impl PositionMap {
    pub fn new(records: Vec<MappingRecord>) -> PositionMap {
        let mut by_original: Vec<usize> = (0..records.len()).collect();
        by_original.sort_by_key(|&idx| records[idx].original_offset);
        PositionMap {
            records,
            by_original,
        }
    }

    pub fn records(&self) -> &[MappingRecord] {
        &self.records
    }

    /// Translates an original-text offset into the generated text.
    pub fn to_generated(&self, original_offset: usize) -> usize {
        translate(
            self.last_le_original(original_offset),
            original_offset,
            |record| record.original_offset,
            |record| record.generated_offset,
        )
    }

    /// Translates a generated-text offset back into the original text.
    pub fn to_original(&self, generated_offset: usize) -> usize {
        translate(
            self.last_le_generated(generated_offset),
            generated_offset,
            |record| record.generated_offset,
            |record| record.original_offset,
        )
    }

    /// The record whose generated range contains `generated_offset`, if the
    /// offset lands in mapped (non-synthetic) text.
    pub fn record_at_generated(&self, generated_offset: usize) -> Option<&MappingRecord> {
        self.last_le_generated(generated_offset)
            .filter(|record| generated_offset < record.generated_offset + record.original_length)
    }

    /// Last record starting at or before `offset` in generated space;
    /// `records` is already in emission (generated) order.
    fn last_le_generated(&self, offset: usize) -> Option<&MappingRecord> {
        let partition = self
            .records
            .partition_point(|record| record.generated_offset <= offset);
        partition.checked_sub(1).map(|idx| &self.records[idx])
    }

    /// Last record starting at or before `offset` in original space, via
    /// the secondary index.
    fn last_le_original(&self, offset: usize) -> Option<&MappingRecord> {
        let partition = self
            .by_original
            .partition_point(|&idx| self.records[idx].original_offset <= offset);
        partition
            .checked_sub(1)
            .map(|idx| &self.records[self.by_original[idx]])
    }
}

/// Shared translation logic for both directions.
///
/// Containment maps exactly; a query at the exact end boundary clamps to
/// the last in-range offset instead of spilling into the next record;
/// offsets past the record extrapolate by the record's delta; with no
/// candidate at all the offset passes through unchanged. The identity
/// passthrough is only exact while both texts share an equal-length prefix,
/// which stops being true once synthetic prologue text exists; queries
/// landing before the first record are therefore best-effort.
fn translate(
    candidate: Option<&MappingRecord>,
    offset: usize,
    from: impl Fn(&MappingRecord) -> usize,
    to: impl Fn(&MappingRecord) -> usize,
) -> usize {
    let Some(record) = candidate else {
        return offset;
    };

    let delta = offset - from(record);
    if record.original_length > 0 && delta == record.original_length {
        // Exact end boundary: clamp to the last in-range offset.
        return to(record) + record.original_length - 1;
    }
    to(record) + delta
}
