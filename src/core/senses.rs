use crate::core::node::{extract_all_tagged, extract_labeled_text, Node};
use crate::domain::model::Sense;

/// Flattens a definition's `sseq` (sense sequence) into senses, in reading order.
///
/// The sequence nests three levels deep: sense groups, then tagged elements such as
/// `["sense", {..}]`, then the element parts. Every object part carrying a `dt` array becomes one
/// [`Sense`]. Objects without one (binding substitutes, nested `sdsense` wrappers) and any
/// non-list level are skipped. Nested sub-senses are not descended into.
pub fn normalize_senses(sseq: &Node) -> Vec<Sense> {
    let mut senses = Vec::new();

    let groups = sseq.as_list().unwrap_or_default();
    for group in groups {
        for element in group.as_list().unwrap_or_default() {
            for part in element.as_list().unwrap_or_default() {
                let Some(fields) = part.as_map() else {
                    continue;
                };
                let Some(dt_node) = fields.get("dt") else {
                    tracing::trace!("Skipping sense part without dt");
                    continue;
                };
                let Some(dt) = dt_node.as_list() else {
                    continue;
                };

                senses.push(Sense {
                    number: fields.get("sn").and_then(Node::as_text).map(str::to_string),
                    text: extract_labeled_text(dt_node, "text")
                        .unwrap_or_default()
                        .to_string(),
                    usage_notes: extract_all_tagged(dt, "uns", "text"),
                    illustrations: extract_all_tagged(dt, "vis", "t"),
                });
            }
        }
    }

    senses
}
