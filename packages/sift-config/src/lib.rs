mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Assistant, AssistantSearch, Audit, Cache, Citation, Config, Database, DbSearch, KbSearch,
	KeywordSearch, KnowledgeBase, LlmProviderConfig, ProviderConfig, Providers, SEARCH_DISABLED,
	Search, SearchTimeouts, Service, SourceWeights, Uses, WebSearch,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn from_toml(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw).map_err(|err| Error::ParseStr { source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	for (label, value) in [
		("search.web_limit", cfg.search.web_limit),
		("search.kb_limit", cfg.search.kb_limit),
		("search.db_limit", cfg.search.db_limit),
		("search.context_turns", cfg.search.context_turns),
		("search.keyword.max_keywords", cfg.search.keyword.max_keywords),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	validate_threshold("search.kb_threshold", cfg.search.kb_threshold)?;

	if cfg.search.snippet_chars == 0 {
		return Err(Error::Validation {
			message: "search.snippet_chars must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("search.timeouts.classifier_ms", cfg.search.timeouts.classifier_ms),
		("search.timeouts.keyword_ms", cfg.search.timeouts.keyword_ms),
		("search.timeouts.metadata_ms", cfg.search.timeouts.metadata_ms),
		("search.timeouts.executor_ms", cfg.search.timeouts.executor_ms),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	validate_weights("search.weights", &cfg.search.weights)?;

	if cfg.cache.assistants_capacity == 0 {
		return Err(Error::Validation {
			message: "cache.assistants_capacity must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("classifier", cfg.providers.classifier.as_ref().map(|p| &p.api_key)),
		("keyword", cfg.providers.keyword.as_ref().map(|p| &p.api_key)),
		("collections", cfg.providers.collections.as_ref().map(|p| &p.api_key)),
		("search_gateway", cfg.providers.search_gateway.as_ref().map(|p| &p.api_key)),
	] {
		if let Some(key) = key
			&& key.trim().is_empty()
		{
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (id, assistant) in &cfg.assistants {
		if id.trim().is_empty() {
			return Err(Error::Validation { message: "Assistant ids must be non-empty.".to_string() });
		}

		validate_assistant(id, assistant)?;
	}

	Ok(())
}

fn validate_assistant(id: &str, assistant: &Assistant) -> Result<()> {
	if let Some(kb) = assistant.kb.as_ref()
		&& kb.collections.iter().any(|collection| collection.trim().is_empty())
	{
		return Err(Error::Validation {
			message: format!("assistants.{id}.kb.collections must not contain blank ids."),
		});
	}
	if let Some(db) = assistant.db.as_ref()
		&& db.models.iter().any(|model| model.trim().is_empty())
	{
		return Err(Error::Validation {
			message: format!("assistants.{id}.db.models must not contain blank ids."),
		});
	}

	let Some(search) = assistant.search.as_ref() else {
		return Ok(());
	};

	if let Some(kb) = search.kb.as_ref() {
		if let Some(threshold) = kb.threshold {
			validate_threshold(&format!("assistants.{id}.search.kb.threshold"), threshold)?;
		}
		if kb.limit == Some(0) {
			return Err(Error::Validation {
				message: format!("assistants.{id}.search.kb.limit must be greater than zero."),
			});
		}
	}
	if let Some(weights) = search.weights.as_ref() {
		validate_weights(&format!("assistants.{id}.search.weights"), weights)?;
	}

	Ok(())
}

fn validate_threshold(label: &str, value: f32) -> Result<()> {
	if !value.is_finite() {
		return Err(Error::Validation { message: format!("{label} must be a finite number.") });
	}
	if !(0.0..=1.0).contains(&value) {
		return Err(Error::Validation { message: format!("{label} must be in the range 0.0-1.0.") });
	}

	Ok(())
}

fn validate_weights(label: &str, weights: &SourceWeights) -> Result<()> {
	for (name, value) in [("user", weights.user), ("hook", weights.hook), ("auto", weights.auto)] {
		if !value.is_finite() {
			return Err(Error::Validation {
				message: format!("{label}.{name} must be a finite number."),
			});
		}
		if value < 0.0 {
			return Err(Error::Validation {
				message: format!("{label}.{name} must be zero or greater."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.audit.path.as_ref().map(|path| path.as_os_str().is_empty()).unwrap_or(false) {
		cfg.audit.path = None;
	}

	normalize_citation(&mut cfg.search.citation);

	for assistant in cfg.assistants.values_mut() {
		if let Some(uses) = assistant.uses.as_mut() {
			for slot in [
				&mut uses.search,
				&mut uses.web,
				&mut uses.keyword,
				&mut uses.query_dsl,
				&mut uses.rerank,
			] {
				if slot.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
					*slot = None;
				}
			}
		}
		if let Some(citation) = assistant.search.as_mut().and_then(|search| search.citation.as_mut())
		{
			normalize_citation(citation);
		}
	}
}

fn normalize_citation(citation: &mut Citation) {
	if citation.custom_prompt.as_deref().map(|prompt| prompt.trim().is_empty()).unwrap_or(false) {
		citation.custom_prompt = None;
	}
	if citation.format.as_deref().map(|format| format.trim().is_empty()).unwrap_or(false) {
		citation.format = None;
	}
}
