//! Per-whiskey roll-up of descriptor assignments.
//!
//! A total rebuild: the output is a pure function of the full assignment
//! set and the review → whiskey map. Nothing is patched incrementally.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use dram_core::{
  assignment::{AggregatedDescriptor, DescriptorAssignment},
  descriptor::{DescriptorId, Section},
  review::{ReviewId, WhiskeyId},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
  /// Sorted by whiskey, then section, then descriptor.
  pub descriptors: Vec<AggregatedDescriptor>,
  /// Assignments whose review had no whiskey mapping.
  pub skipped:     usize,
}

pub fn aggregate(
  assignments: &[DescriptorAssignment],
  review_whiskey: &HashMap<ReviewId, WhiskeyId>,
) -> Aggregation {
  let mut groups: BTreeMap<(WhiskeyId, Section, DescriptorId), BTreeSet<ReviewId>> =
    BTreeMap::new();
  let mut skipped = 0;

  for a in assignments {
    let Some(&whiskey_id) = review_whiskey.get(&a.review_id) else {
      skipped += 1;
      continue;
    };
    groups
      .entry((whiskey_id, a.section, a.descriptor_id))
      .or_default()
      .insert(a.review_id);
  }

  if skipped > 0 {
    tracing::warn!(skipped, "assignments reference reviews with no whiskey");
  }

  let descriptors = groups
    .into_iter()
    .map(|((whiskey_id, section, descriptor_id), reviews)| {
      let review_ids: Vec<ReviewId> = reviews.into_iter().collect();
      AggregatedDescriptor {
        whiskey_id,
        descriptor_id,
        section,
        review_count: review_ids.len(),
        review_ids,
      }
    })
    .collect();

  Aggregation { descriptors, skipped }
}
