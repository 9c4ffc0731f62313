//! Reference list, citation markup and model instructions built from search results.

use std::fmt::Write as _;

use sift_config::{Citation, SourceWeights};

use crate::{
	request::Source,
	result::{Reference, ReferenceContext, SearchResult},
};

pub const DEFAULT_CITATION_PROMPT: &str = r##"Retrieved context is provided below inside <references>. Each <ref> element carries these attributes:
- id: Citation identifier, used when citing the reference.
- type: Data type of the reference (web, kb or db).
- weight: Relevance weight between 0.0 and 1.0. Prefer references with higher weight when they disagree.
- source: Origin of the request that found it (user, hook or auto).

Ground your answer in these references when they are relevant. Cite a reference right after the sentence that relies on it using exactly this markup:
<a class="ref" data-ref-id="1" data-ref-type="web" href="#ref-1">[1]</a>

Set data-ref-id to the reference id and data-ref-type to its type. Do not cite references you did not use, and do not invent ids that are not listed."##;

/// Configured custom prompt, or the default instructions when it is absent or blank.
pub fn citation_prompt(citation: Option<&Citation>) -> &str {
	citation
		.and_then(|citation| citation.custom_prompt.as_deref())
		.filter(|prompt| !prompt.trim().is_empty())
		.unwrap_or(DEFAULT_CITATION_PROMPT)
}

/// Flattens result items in order. Zero weights take the configured weight of their origin and
/// a missing citation id becomes the 1-based position.
pub fn build_references(
	results: &[SearchResult],
	weights: &SourceWeights,
	snippet_chars: usize,
) -> Vec<Reference> {
	let mut references = Vec::new();

	for item in results.iter().flat_map(|result| result.items.iter()) {
		let position = references.len() + 1;
		let id = if item.citation_id.trim().is_empty() {
			position.to_string()
		} else {
			item.citation_id.trim().to_string()
		};
		let index = id.parse().unwrap_or(position);
		let weight = if item.weight > 0.0 { item.weight } else { source_weight(weights, item.source) };

		references.push(Reference {
			id,
			index,
			search_type: item.search_type,
			source: item.source,
			weight,
			score: item.score,
			title: item.title.clone(),
			url: item.url.clone(),
			snippet: snippet(&item.content, snippet_chars),
			content: item.content.clone(),
		});
	}

	references
}

pub fn source_weight(weights: &SourceWeights, source: Source) -> f32 {
	match source {
		Source::User => weights.user,
		Source::Hook => weights.hook,
		Source::Auto => weights.auto,
	}
}

/// First `max_chars` characters of `content`.
pub fn snippet(content: &str, max_chars: usize) -> String {
	match content.char_indices().nth(max_chars) {
		Some((end, _)) => content[..end].to_string(),
		None => content.to_string(),
	}
}

/// Renders the `<references>` block. No references render as an empty string.
pub fn format_markup(references: &[Reference]) -> String {
	if references.is_empty() {
		return String::new();
	}

	let mut markup = String::from("<references>\n");

	for reference in references {
		let _ = writeln!(
			markup,
			r#"<ref id="{}" type="{}" weight="{:.1}" source="{}">"#,
			reference.id,
			reference.search_type,
			reference.weight,
			reference.source.as_str(),
		);

		if !reference.title.is_empty() {
			let _ = writeln!(markup, "{}", reference.title);
		}

		let _ = writeln!(markup, "{}", reference.content);

		if !reference.url.is_empty() {
			let _ = writeln!(markup, "URL: {}", reference.url);
		}

		markup.push_str("</ref>\n");
	}

	markup.push_str("</references>");

	markup
}

pub fn build_context(
	results: &[SearchResult],
	citation: Option<&Citation>,
	weights: &SourceWeights,
	snippet_chars: usize,
) -> ReferenceContext {
	let references = build_references(results, weights, snippet_chars);
	let markup = format_markup(&references);

	ReferenceContext { references, markup, prompt: citation_prompt(citation).to_string() }
}
