use serde::{Deserialize, Serialize};

use crate::{intent::SearchType, predicate::Predicate};

/// Where a search request originated. Decides the default weight of its references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
	User,
	Hook,
	#[default]
	Auto,
}
impl Source {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Hook => "hook",
			Self::Auto => "auto",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchRequest {
	Web(WebRequest),
	Kb(KbRequest),
	Db(DbRequest),
}
impl SearchRequest {
	pub fn search_type(&self) -> SearchType {
		match self {
			Self::Web(_) => SearchType::Web,
			Self::Kb(_) => SearchType::Kb,
			Self::Db(_) => SearchType::Db,
		}
	}

	pub fn query(&self) -> &str {
		match self {
			Self::Web(request) => &request.query,
			Self::Kb(request) => &request.query,
			Self::Db(request) => &request.query,
		}
	}

	pub fn limit(&self) -> u32 {
		match self {
			Self::Web(request) => request.limit,
			Self::Kb(request) => request.limit,
			Self::Db(request) => request.limit,
		}
	}

	pub fn source(&self) -> Source {
		match self {
			Self::Web(request) => request.source,
			Self::Kb(request) => request.source,
			Self::Db(request) => request.source,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebRequest {
	pub query: String,
	pub limit: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub provider: Option<String>,
	#[serde(default)]
	pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbRequest {
	pub query: String,
	pub limit: u32,
	pub collections: Vec<String>,
	pub threshold: f32,
	#[serde(default)]
	pub graph: bool,
	#[serde(default)]
	pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRequest {
	pub query: String,
	pub limit: u32,
	pub models: Vec<String>,
	/// Row filter from the caller's constraints. Absent means no filtering.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub predicate: Option<Predicate>,
	#[serde(default)]
	pub source: Source,
}
